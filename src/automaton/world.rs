use super::router::RuleControls;
use crate::config::{CaParams, InitialRow};
use crate::engine::display::{Rgb, Surface};
use crate::engine::panel::{WidgetPanel, WidgetSpec, WidgetValue};
use crate::engine::Steppable;
use crate::error::{SimError, SimResult};
use fastrand::Rng;
use strum::IntoEnumIterator;
use tracing::{debug, info};

pub const INIT_KEY: &str = "init";
pub const ROWS_KEY: &str = "rows";
pub const ON_COLOR: Rgb = Rgb::WHITE;
pub const OFF_COLOR: Rgb = Rgb::BLACK;

/// One elementary CA step with wrap-around at both edges.
pub fn next_line(prev: &[u8], rule: u8) -> Vec<u8> {
    let width = prev.len();
    (0..width)
        .map(|i| {
            let left = prev[(i + width - 1) % width];
            let center = prev[i];
            let right = prev[(i + 1) % width];
            let index = (left << 2) | (center << 1) | right;
            (rule >> index) & 1
        })
        .collect()
}

/// A single live cell at the left edge, centre or right edge, or random cells.
pub fn initial_line(init: InitialRow, width: usize, rng: &mut Rng) -> Vec<u8> {
    if init == InitialRow::Random {
        return (0..width).map(|_| rng.bool() as u8).collect();
    }
    let mut line = vec![0; width];
    if width > 0 {
        let col = match init {
            InitialRow::Left => 0,
            InitialRow::Center => width / 2,
            _ => width - 1,
        };
        line[col] = 1;
    }
    line
}

pub fn line_to_string(line: &[u8]) -> String {
    line.iter().map(|&c| if c == 1 { '1' } else { '0' }).collect()
}

/// The on/off patches the history is projected onto.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchGrid {
    rows: usize,
    cols: usize,
    cells: Vec<u8>,
}

impl PatchGrid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![0; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[u8] {
        &self.cells[row * self.cols..(row + 1) * self.cols]
    }

    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = 0);
    }

    /// Shows the newest lines with the newest on the bottom row. Older lines
    /// that do not fit scroll off the top; rows above a short history stay
    /// off. Lines wider than the grid are cut on the right.
    pub fn set_from_lines(&mut self, lines: &[Vec<u8>]) {
        self.clear();
        let shown = lines.len().min(self.rows);
        let first_row = self.rows - shown;
        for (offset, line) in lines[lines.len() - shown..].iter().enumerate() {
            let row = first_row + offset;
            let width = line.len().min(self.cols);
            self.cells[row * self.cols..row * self.cols + width].copy_from_slice(&line[..width]);
        }
    }
}

/// The 1D cellular automaton model.
pub struct CaWorld {
    params: CaParams,
    controls: RuleControls,
    lines: Vec<Vec<u8>>,
    grid: PatchGrid,
    rng: Rng,
    steps: usize,
}

impl CaWorld {
    pub fn new(params: CaParams, rng: Rng) -> Self {
        Self {
            controls: RuleControls::new(params.rule_nbr),
            grid: PatchGrid::new(params.ca_rows, params.ca_cols),
            lines: Vec::new(),
            rng,
            steps: 0,
            params,
        }
    }

    pub fn rule(&self) -> u8 {
        self.controls.rule()
    }

    /// Full history, oldest first.
    pub fn lines(&self) -> &[Vec<u8>] {
        &self.lines
    }

    pub fn grid(&self) -> &PatchGrid {
        &self.grid
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    fn read_init(panel: &dyn WidgetPanel) -> SimResult<InitialRow> {
        let raw = panel.get_text(INIT_KEY)?;
        raw.parse()
            .map_err(|_| SimError::Widget(format!("unknown initial row '{}'", raw)))
    }

    fn refresh(&mut self, panel: &mut dyn WidgetPanel) -> SimResult<()> {
        self.grid.set_from_lines(&self.lines);
        panel.set(ROWS_KEY, WidgetValue::Text(self.lines.len().to_string()))
    }
}

impl Steppable for CaWorld {
    fn widgets(&self) -> Vec<WidgetSpec> {
        let options: Vec<String> = InitialRow::iter().map(|i| i.to_string()).collect();
        let options: Vec<&str> = options.iter().map(String::as_str).collect();
        let mut specs = vec![
            WidgetSpec::combo(INIT_KEY, &options, &self.params.init.to_string()),
            WidgetSpec::text(ROWS_KEY, "0"),
        ];
        specs.extend(self.controls.widgets());
        specs
    }

    fn setup(&mut self, panel: &mut dyn WidgetPanel) -> SimResult<()> {
        self.controls.settle(panel)?;
        let init = Self::read_init(panel)?;
        self.lines = vec![initial_line(init, self.params.ca_cols, &mut self.rng)];
        self.steps = 0;
        info!("CA setup: rule {}, initial row {}", self.rule(), init);
        self.refresh(panel)
    }

    fn step(&mut self, panel: &mut dyn WidgetPanel) -> SimResult<()> {
        if self.lines.is_empty() {
            self.setup(panel)?;
        }
        let next = match self.lines.last() {
            Some(prev) => next_line(prev, self.rule()),
            None => return Err(SimError::Validation("CA has no initial line".into())),
        };
        self.lines.push(next);
        self.steps += 1;
        self.refresh(panel)
    }

    fn handle_event(&mut self, event: &str, panel: &mut dyn WidgetPanel) -> SimResult<()> {
        self.controls.apply(event, panel)?;
        Ok(())
    }

    fn draw(&self, surface: &mut dyn Surface) {
        for row in 0..self.grid.rows() {
            for col in 0..self.grid.cols() {
                let color = if self.grid.get(row, col) == 1 {
                    ON_COLOR
                } else {
                    OFF_COLOR
                };
                surface.fill_cell(row, col, color);
            }
        }
    }

    fn done(&self) -> bool {
        self.params.max_steps > 0 && self.steps >= self.params.max_steps
    }

    fn final_thoughts(&mut self, _panel: &mut dyn WidgetPanel) -> SimResult<()> {
        debug!("CA run ended after {} steps", self.steps);
        info!(
            "Rule {}: {} rows, {} live cells in the newest row",
            self.rule(),
            self.lines.len(),
            self.lines.last().map_or(0, |l| l.iter().filter(|&&c| c == 1).count())
        );
        Ok(())
    }
}
