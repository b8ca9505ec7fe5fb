use crate::error::SimResult;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const GREY: Rgb = Rgb(128, 128, 128);
    pub const LIGHT_GREY: Rgb = Rgb(200, 200, 200);

    /// Integer approximation of Rec. 601 luma.
    pub fn luminance(self) -> u8 {
        let Rgb(r, g, b) = self;
        ((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8
    }
}

/// The drawing surface a model paints on. Coordinates for nodes and links
/// are world units; `fill_cell` addresses the patch grid.
pub trait Surface {
    fn clear(&mut self, color: Rgb);
    fn fill_cell(&mut self, row: usize, col: usize, color: Rgb);
    fn draw_node(&mut self, x: f64, y: f64, color: Rgb);
    fn draw_link(&mut self, from: (f64, f64), to: (f64, f64), color: Rgb);
    /// Ends the frame.
    fn present(&mut self) -> SimResult<()>;
}

/// Character canvas printed to any writer.
///
/// Patch colours map to glyphs by brightness; nodes are `o` and links are
/// dotted lines. Only every `render_every`-th frame is written (0 = never),
/// so batch runs stay quiet unless asked otherwise.
pub struct TerminalDisplay<W: Write> {
    out: W,
    rows: usize,
    cols: usize,
    canvas: Vec<char>,
    render_every: usize,
    frames: usize,
}

impl<W: Write> TerminalDisplay<W> {
    pub fn new(out: W, rows: usize, cols: usize, render_every: usize) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        Self {
            out,
            rows,
            cols,
            canvas: vec![' '; rows * cols],
            render_every,
            frames: 0,
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn render(&self) -> String {
        let mut s = String::with_capacity(self.rows * (self.cols + 1));
        for row in self.canvas.chunks(self.cols) {
            s.extend(row.iter());
            s.push('\n');
        }
        s
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn glyph(color: Rgb) -> char {
        match color.luminance() {
            0..=63 => ' ',
            64..=159 => '.',
            _ => '#',
        }
    }

    fn plot(&mut self, x: i64, y: i64, c: char) {
        if x >= 0 && y >= 0 && (x as usize) < self.cols && (y as usize) < self.rows {
            self.canvas[y as usize * self.cols + x as usize] = c;
        }
    }
}

impl<W: Write> Surface for TerminalDisplay<W> {
    fn clear(&mut self, color: Rgb) {
        let c = Self::glyph(color);
        self.canvas.iter_mut().for_each(|cell| *cell = c);
    }

    fn fill_cell(&mut self, row: usize, col: usize, color: Rgb) {
        self.plot(col as i64, row as i64, Self::glyph(color));
    }

    fn draw_node(&mut self, x: f64, y: f64, _color: Rgb) {
        self.plot(x.round() as i64, y.round() as i64, 'o');
    }

    fn draw_link(&mut self, from: (f64, f64), to: (f64, f64), _color: Rgb) {
        // Bresenham
        let (mut x0, mut y0) = (from.0.round() as i64, from.1.round() as i64);
        let (x1, y1) = (to.0.round() as i64, to.1.round() as i64);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.plot(x0, y0, '.');
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn present(&mut self) -> SimResult<()> {
        self.frames += 1;
        if self.render_every > 0 && self.frames % self.render_every == 0 {
            let frame = self.render();
            writeln!(self.out, "{}", frame)?;
            self.out.flush()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear(Rgb),
    Cell(usize, usize, Rgb),
    Node(f64, f64, Rgb),
    Link((f64, f64), (f64, f64), Rgb),
}

/// Keeps every presented frame in memory.
#[derive(Debug, Clone, Default)]
pub struct FrameRecorder {
    pending: Vec<DrawCall>,
    pub frames: Vec<Vec<DrawCall>>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> Option<&[DrawCall]> {
        self.frames.last().map(|f| f.as_slice())
    }

    /// Cells of the last frame drawn in `color`.
    pub fn cells_in(&self, color: Rgb) -> Vec<(usize, usize)> {
        self.last_frame()
            .unwrap_or_default()
            .iter()
            .filter_map(|call| match call {
                DrawCall::Cell(r, c, col) if *col == color => Some((*r, *c)),
                _ => None,
            })
            .collect()
    }
}

impl Surface for FrameRecorder {
    fn clear(&mut self, color: Rgb) {
        self.pending.push(DrawCall::Clear(color));
    }

    fn fill_cell(&mut self, row: usize, col: usize, color: Rgb) {
        self.pending.push(DrawCall::Cell(row, col, color));
    }

    fn draw_node(&mut self, x: f64, y: f64, color: Rgb) {
        self.pending.push(DrawCall::Node(x, y, color));
    }

    fn draw_link(&mut self, from: (f64, f64), to: (f64, f64), color: Rgb) {
        self.pending.push(DrawCall::Link(from, to, color));
    }

    fn present(&mut self) -> SimResult<()> {
        self.frames.push(std::mem::take(&mut self.pending));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_render_by_brightness() {
        let mut d = TerminalDisplay::new(Vec::new(), 2, 3, 0);
        d.clear(Rgb::BLACK);
        d.fill_cell(0, 1, Rgb::WHITE);
        d.fill_cell(1, 2, Rgb::GREY);
        d.fill_cell(5, 5, Rgb::WHITE);
        assert_eq!(d.render(), " # \n  .\n");
    }

    #[test]
    fn test_link_is_continuous() {
        let mut d = TerminalDisplay::new(Vec::new(), 1, 5, 0);
        d.draw_link((0.0, 0.0), (4.0, 0.0), Rgb::RED);
        d.draw_node(0.0, 0.0, Rgb::WHITE);
        assert_eq!(d.render(), "o....\n");
    }

    #[test]
    fn test_present_writes_every_nth_frame() {
        let mut d = TerminalDisplay::new(Vec::new(), 1, 1, 2);
        d.clear(Rgb::WHITE);
        d.present().unwrap();
        d.present().unwrap();
        d.present().unwrap();
        assert_eq!(d.frames(), 3);
        assert_eq!(String::from_utf8(d.into_inner()).unwrap(), "#\n\n");
    }

    #[test]
    fn test_recorder_splits_frames() {
        let mut r = FrameRecorder::new();
        r.fill_cell(0, 0, Rgb::WHITE);
        r.present().unwrap();
        r.clear(Rgb::BLACK);
        r.present().unwrap();
        assert_eq!(r.frames.len(), 2);
        assert_eq!(r.last_frame(), Some(&[DrawCall::Clear(Rgb::BLACK)][..]));
        assert!(r.cells_in(Rgb::WHITE).is_empty());
    }
}
