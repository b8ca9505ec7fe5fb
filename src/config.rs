use crate::error::{SimError, SimResult};
use crate::tsp::MAX_POINTS;
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use strum_macros::{Display, EnumIter, EnumString};

/// Full configuration as stored in a JSON config file.
/// Every section is optional in the file; missing fields fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SimConfig {
    pub engine: EngineParams,
    pub ca: CaParams,
    pub tsp: TspParams,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    /// Frames per second while running (initial value of the FPS slider)
    #[arg(long, default_value_t = 60.0)]
    pub fps: f64,
    /// Polling rate while idle
    #[arg(long, default_value_t = 10.0)]
    pub idle_fps: f64,
    /// Skip clock sleeps entirely (headless batch runs)
    #[arg(long, default_value_t = false)]
    pub unthrottled: bool,
    /// Print the display every N frames (0 = never)
    #[arg(long, default_value_t = 0)]
    pub render_every: usize,
    #[arg(short = 'S', long)]
    pub seed: Option<u64>,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            fps: 60.0,
            idle_fps: 10.0,
            unthrottled: false,
            render_every: 0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter)]
pub enum InitialRow {
    Left,
    Center,
    Right,
    Random,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaParams {
    #[arg(short = 'r', long, default_value_t = 110)]
    pub rule_nbr: u8,
    #[arg(long, default_value_t = 151)]
    pub ca_rows: usize,
    #[arg(long, default_value_t = 151)]
    pub ca_cols: usize,
    #[arg(long, default_value_t = InitialRow::Right)]
    pub init: InitialRow,
    /// Stop a run after this many rows have been added (0 = never)
    #[arg(long, default_value_t = 150)]
    pub max_steps: usize,
}

impl Default for CaParams {
    fn default() -> Self {
        Self {
            rule_nbr: 110,
            ca_rows: 151,
            ca_cols: 151,
            init: InitialRow::Right,
            max_steps: 150,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TspParams {
    #[arg(long, default_value_t = 15)]
    pub nbr_points: usize,
    #[arg(long, default_value_t = 20)]
    pub pop_size: usize,
    #[arg(long, default_value_t = 3)]
    pub tourn_size: usize,
    /// Percent chance of picking a uniformly random parent
    #[arg(long, default_value_t = 20)]
    pub prob_random_parent: u8,

    // === GENERATORS ===
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub greedy: bool,
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub min_spanning_tree: bool,

    // === MUTATIONS ===
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub move_element: bool,
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub two_opt: bool,

    // === WORLD ===
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub move_points: bool,
    #[arg(long, default_value_t = false)]
    pub animate_construction: bool,
    #[arg(long, default_value_t = 80.0)]
    pub world_width: f64,
    #[arg(long, default_value_t = 40.0)]
    pub world_height: f64,
    /// Stop a run after this many generations (0 = never)
    #[arg(long, default_value_t = 200)]
    pub max_generations: usize,
}

impl Default for TspParams {
    fn default() -> Self {
        Self {
            nbr_points: 15,
            pop_size: 20,
            tourn_size: 3,
            prob_random_parent: 20,
            greedy: true,
            min_spanning_tree: true,
            move_element: true,
            two_opt: true,
            move_points: true,
            animate_construction: false,
            world_width: 80.0,
            world_height: 40.0,
            max_generations: 200,
        }
    }
}

impl SimConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

macro_rules! update_if_present {
    ($target:ident, $cli:ident, $matches:ident, $($field:ident),+ $(,)?) => {
        $(
            if $matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                $target.$field = $cli.$field.clone();
            }
        )+
    };
}

impl EngineParams {
    pub fn merge_from_cli(&mut self, cli: &EngineParams, matches: &ArgMatches) {
        update_if_present!(self, cli, matches, fps, idle_fps, unthrottled, render_every, seed);
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(self.fps > 0.0) || !(self.idle_fps > 0.0) {
            return Err(SimError::Config(format!(
                "fps ({}) and idle_fps ({}) must be positive",
                self.fps, self.idle_fps
            )));
        }
        Ok(())
    }
}

impl CaParams {
    pub fn merge_from_cli(&mut self, cli: &CaParams, matches: &ArgMatches) {
        update_if_present!(self, cli, matches, rule_nbr, ca_rows, ca_cols, init, max_steps);
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.ca_rows == 0 || self.ca_cols == 0 {
            return Err(SimError::Config(format!(
                "CA display must be at least 1x1, got {}x{}",
                self.ca_rows, self.ca_cols
            )));
        }
        Ok(())
    }
}

impl TspParams {
    pub fn merge_from_cli(&mut self, cli: &TspParams, matches: &ArgMatches) {
        update_if_present!(
            self,
            cli,
            matches,
            nbr_points,
            pop_size,
            tourn_size,
            prob_random_parent,
            greedy,
            min_spanning_tree,
            move_element,
            two_opt,
            move_points,
            animate_construction,
            world_width,
            world_height,
            max_generations,
        );
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(3..=MAX_POINTS).contains(&self.nbr_points) {
            return Err(SimError::Config(format!(
                "nbr_points must be in 3..={}, got {}",
                MAX_POINTS, self.nbr_points
            )));
        }
        if self.pop_size < 2 {
            return Err(SimError::Config(format!(
                "pop_size must be at least 2, got {}",
                self.pop_size
            )));
        }
        if self.tourn_size == 0 {
            return Err(SimError::Config("tourn_size must be at least 1".into()));
        }
        if self.prob_random_parent > 100 {
            return Err(SimError::Config(format!(
                "prob_random_parent is a percentage, got {}",
                self.prob_random_parent
            )));
        }
        if !(self.world_width > 1.0) || !(self.world_height > 1.0) {
            return Err(SimError::Config(format!(
                "world must be larger than 1x1, got {}x{}",
                self.world_width, self.world_height
            )));
        }
        Ok(())
    }
}
