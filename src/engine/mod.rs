//! The shared event loop that drives a model.
//!
//! One thread polls one UI event per tick, performs lifecycle transitions,
//! advances the model and redraws. Within a tick, event handling happens
//! before the step and the step before the redraw.

pub mod display;
pub mod events;
pub mod panel;

use self::display::{Rgb, Surface};
use self::events::UiEvent;
use self::panel::{Polled, WidgetPanel, WidgetSpec};
use crate::config::EngineParams;
use crate::error::SimResult;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

pub const FPS_KEY: &str = "FPS";
pub const FPS_MIN: f64 = 1.0;
pub const FPS_MAX: f64 = 100.0;
pub const POLL_TIMEOUT: Duration = Duration::from_millis(10);
pub const BACKGROUND: Rgb = Rgb(50, 60, 60);

/// A model the engine can drive.
pub trait Steppable {
    /// Controls the model needs on the panel.
    fn widgets(&self) -> Vec<WidgetSpec>;

    fn setup(&mut self, panel: &mut dyn WidgetPanel) -> SimResult<()>;

    fn step(&mut self, panel: &mut dyn WidgetPanel) -> SimResult<()>;

    /// Any event the engine does not consume itself.
    fn handle_event(&mut self, event: &str, panel: &mut dyn WidgetPanel) -> SimResult<()>;

    fn draw(&self, surface: &mut dyn Surface);

    fn done(&self) -> bool {
        false
    }

    /// Called once each time a continuous run ends.
    fn final_thoughts(&mut self, _panel: &mut dyn WidgetPanel) -> SimResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Ready,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Normal,
    Exit,
}

/// Paces the loop to a target frame rate.
#[derive(Debug, Clone)]
pub struct Clock {
    last: Option<Instant>,
    unthrottled: bool,
}

impl Clock {
    pub fn new(unthrottled: bool) -> Self {
        Self {
            last: None,
            unthrottled,
        }
    }

    /// Sleeps so that consecutive ticks are at least `1 / fps` apart.
    pub fn tick(&mut self, fps: f64) {
        let now = Instant::now();
        if !self.unthrottled && fps > 0.0 {
            if let Some(last) = self.last {
                let frame = Duration::from_secs_f64(1.0 / fps);
                let elapsed = now.duration_since(last);
                if elapsed < frame {
                    thread::sleep(frame - elapsed);
                }
            }
        }
        self.last = Some(Instant::now());
    }
}

/// Owns the panel, the display surface and the clock for one session.
pub struct SimEngine<P: WidgetPanel, S: Surface> {
    panel: P,
    surface: S,
    clock: Clock,
    state: LoopState,
    default_fps: f64,
    idle_fps: f64,
    ticks: usize,
}

impl<P: WidgetPanel, S: Surface> SimEngine<P, S> {
    pub fn new(panel: P, surface: S, params: &EngineParams) -> Self {
        Self {
            panel,
            surface,
            clock: Clock::new(params.unthrottled),
            state: LoopState::Stopped,
            default_fps: params.fps.clamp(FPS_MIN, FPS_MAX),
            idle_fps: params.idle_fps.clamp(FPS_MIN, FPS_MAX),
            ticks: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Steps performed so far, in runs and single steps alike.
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_parts(self) -> (P, S) {
        (self.panel, self.surface)
    }

    /// Idle loop. Returns once the user exits, the panel closes, or a
    /// drained panel has nothing more to deliver.
    pub fn start<M: Steppable>(&mut self, model: &mut M) -> SimResult<()> {
        for spec in model.widgets() {
            self.panel.declare(spec);
        }
        self.panel
            .declare(WidgetSpec::slider(FPS_KEY, FPS_MIN, FPS_MAX, self.default_fps));
        self.state = LoopState::Stopped;
        self.draw(model)?;

        loop {
            match self.panel.read(POLL_TIMEOUT) {
                Polled::Closed | Polled::Event(UiEvent::Exit) => break,
                Polled::Timeout => {
                    if self.panel.is_exhausted() {
                        debug!("Input exhausted while idle");
                        break;
                    }
                }
                Polled::Event(UiEvent::Setup) => self.setup(model)?,
                Polled::Event(UiEvent::GoOnce) => {
                    self.ensure_setup(model)?;
                    self.step(model)?;
                }
                Polled::Event(UiEvent::Go) => {
                    self.ensure_setup(model)?;
                    if self.run_model(model)? == RunOutcome::Exit {
                        break;
                    }
                }
                Polled::Event(UiEvent::Stop) => trace!("Stop while idle"),
                Polled::Event(UiEvent::Widget(key)) => {
                    model.handle_event(&key, &mut self.panel)?;
                    self.draw(model)?;
                }
            }
            self.clock.tick(self.idle_fps);
        }

        self.state = LoopState::Stopped;
        info!("Engine stopped after {} ticks", self.ticks);
        Ok(())
    }

    /// Continuous run until `Stop`, exit or the model reports `done()`.
    pub fn run_model<M: Steppable>(&mut self, model: &mut M) -> SimResult<RunOutcome> {
        self.state = LoopState::Running;
        debug!("Run started at tick {}", self.ticks);

        loop {
            let fps = self.fps();
            match self.panel.read(POLL_TIMEOUT) {
                Polled::Closed | Polled::Event(UiEvent::Exit) => {
                    self.state = LoopState::Stopped;
                    return Ok(RunOutcome::Exit);
                }
                Polled::Event(UiEvent::Stop) => break,
                Polled::Event(UiEvent::Widget(key)) => model.handle_event(&key, &mut self.panel)?,
                Polled::Event(other) => trace!("Ignoring '{}' while running", other),
                Polled::Timeout => {}
            }
            if model.done() {
                break;
            }
            self.step(model)?;
            self.clock.tick(fps);
        }

        model.final_thoughts(&mut self.panel)?;
        self.state = LoopState::Ready;
        debug!("Run ended at tick {}", self.ticks);
        Ok(RunOutcome::Normal)
    }

    pub fn setup<M: Steppable>(&mut self, model: &mut M) -> SimResult<()> {
        model.setup(&mut self.panel)?;
        self.state = LoopState::Ready;
        self.draw(model)
    }

    fn ensure_setup<M: Steppable>(&mut self, model: &mut M) -> SimResult<()> {
        if self.state == LoopState::Stopped {
            info!("Stepping before setup; running setup first");
            self.setup(model)?;
        }
        Ok(())
    }

    fn step<M: Steppable>(&mut self, model: &mut M) -> SimResult<()> {
        self.ticks += 1;
        model.step(&mut self.panel)?;
        self.draw(model)
    }

    fn draw<M: Steppable>(&mut self, model: &M) -> SimResult<()> {
        self.surface.clear(BACKGROUND);
        model.draw(&mut self.surface);
        self.surface.present()
    }

    fn fps(&self) -> f64 {
        self.panel
            .get_number(FPS_KEY)
            .map(|f| f.clamp(FPS_MIN, FPS_MAX))
            .unwrap_or(self.default_fps)
    }
}

#[cfg(test)]
mod tests {
    use super::display::FrameRecorder;
    use super::panel::{ScriptStep, ScriptedPanel};
    use super::*;

    /// Counts calls; done after `limit` steps when `limit > 0`.
    #[derive(Default)]
    struct Counter {
        setups: usize,
        steps: usize,
        finals: usize,
        events: Vec<String>,
        limit: usize,
    }

    impl Steppable for Counter {
        fn widgets(&self) -> Vec<WidgetSpec> {
            vec![WidgetSpec::button("poke")]
        }

        fn setup(&mut self, _panel: &mut dyn WidgetPanel) -> SimResult<()> {
            self.setups += 1;
            self.steps = 0;
            Ok(())
        }

        fn step(&mut self, _panel: &mut dyn WidgetPanel) -> SimResult<()> {
            self.steps += 1;
            Ok(())
        }

        fn handle_event(&mut self, event: &str, _panel: &mut dyn WidgetPanel) -> SimResult<()> {
            self.events.push(event.to_string());
            Ok(())
        }

        fn draw(&self, surface: &mut dyn Surface) {
            surface.fill_cell(0, self.steps, Rgb::WHITE);
        }

        fn done(&self) -> bool {
            self.limit > 0 && self.steps >= self.limit
        }

        fn final_thoughts(&mut self, _panel: &mut dyn WidgetPanel) -> SimResult<()> {
            self.finals += 1;
            Ok(())
        }
    }

    fn engine(script: &str) -> SimEngine<ScriptedPanel, FrameRecorder> {
        let params = EngineParams {
            unthrottled: true,
            ..EngineParams::default()
        };
        SimEngine::new(
            ScriptedPanel::from_script(script).unwrap(),
            FrameRecorder::new(),
            &params,
        )
    }

    #[test]
    fn test_go_once_runs_lazy_setup() {
        let mut e = engine("go once, go once");
        let mut m = Counter::default();
        e.start(&mut m).unwrap();
        assert_eq!(m.setups, 1);
        assert_eq!(m.steps, 2);
        assert_eq!(e.ticks(), 2);
        assert_eq!(e.state(), LoopState::Stopped);
    }

    #[test]
    fn test_run_until_done_calls_final_thoughts_once() {
        let mut e = engine("setup, go");
        let mut m = Counter {
            limit: 5,
            ..Counter::default()
        };
        e.start(&mut m).unwrap();
        assert_eq!(m.steps, 5);
        assert_eq!(m.finals, 1);
        // initial, setup, five steps
        assert_eq!(e.surface().frames.len(), 7);
    }

    #[test]
    fn test_stop_ends_run() {
        let mut e = engine("setup, go, pause:2, Stop, go once");
        let mut m = Counter::default();
        e.start(&mut m).unwrap();
        // Steps on the two pause ticks, none on the Stop tick, one more after.
        assert_eq!(m.steps, 3);
        assert_eq!(m.finals, 1);
    }

    #[test]
    fn test_widget_event_precedes_step() {
        let mut e = engine("setup, go, poke, Stop");
        let mut m = Counter::default();
        e.start(&mut m).unwrap();
        assert_eq!(m.events, vec!["poke".to_string()]);
        assert_eq!(m.steps, 1);
    }

    #[test]
    fn test_quit_key_while_running_skips_final_thoughts() {
        let mut e = engine("go, pause:1, Escape:27, go once");
        let mut m = Counter::default();
        e.start(&mut m).unwrap();
        assert_eq!(m.steps, 1);
        assert_eq!(m.finals, 0);
        assert_eq!(e.state(), LoopState::Stopped);
        assert_eq!(e.panel().remaining(), 1);
    }

    #[test]
    fn test_closed_panel_exits_idle_loop() {
        let mut e = SimEngine::new(
            ScriptedPanel::new([ScriptStep::Close, ScriptStep::Event(UiEvent::GoOnce)]),
            FrameRecorder::new(),
            &EngineParams {
                unthrottled: true,
                ..EngineParams::default()
            },
        );
        let mut m = Counter::default();
        e.start(&mut m).unwrap();
        assert_eq!(m.steps, 0);
        assert_eq!(m.setups, 0);
    }

    #[test]
    fn test_fps_slider_is_declared_and_clamped() {
        let mut e = engine("FPS=500");
        let mut m = Counter::default();
        e.start(&mut m).unwrap();
        assert_eq!(e.panel().get_number(FPS_KEY).unwrap(), FPS_MAX);
        assert_eq!(m.events, vec![FPS_KEY.to_string()]);
    }

    #[test]
    fn test_frame_rates_are_clamped_at_construction() {
        let params = EngineParams {
            fps: 1e6,
            idle_fps: 1e-300,
            ..EngineParams::default()
        };
        let e = SimEngine::new(ScriptedPanel::default(), FrameRecorder::new(), &params);
        assert_eq!(e.default_fps, FPS_MAX);
        assert_eq!(e.idle_fps, FPS_MIN);
    }
}
