use super::{make_rng, require_limit};
use crate::reports;
use clap::{ArgMatches, Args};
use logosim::config::{EngineParams, SimConfig, TspParams};
use logosim::engine::display::TerminalDisplay;
use logosim::engine::panel::ScriptedPanel;
use logosim::engine::SimEngine;
use logosim::error::SimResult;
use logosim::export;
use logosim::tsp::TspWorld;
use std::io;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct TspArgs {
    #[command(flatten)]
    pub engine: EngineParams,

    #[command(flatten)]
    pub tsp: TspParams,

    /// Comma-separated UI script, e.g. "setup, Create Node, go"
    #[arg(short = 'e', long, default_value = "setup, go")]
    pub events: String,

    /// Write the best tour to this CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

pub fn run(args: &TspArgs, mut config: SimConfig, matches: &ArgMatches) -> SimResult<()> {
    config.engine.merge_from_cli(&args.engine, matches);
    config.tsp.merge_from_cli(&args.tsp, matches);
    config.engine.validate()?;
    config.tsp.validate()?;
    require_limit(&args.events, config.tsp.max_generations, "max-generations")?;

    let panel = ScriptedPanel::from_script(&args.events)?;
    let display = TerminalDisplay::new(
        io::stdout(),
        config.tsp.world_height.ceil() as usize + 1,
        config.tsp.world_width.ceil() as usize + 1,
        config.engine.render_every,
    );
    let mut engine = SimEngine::new(panel, display, &config.engine);
    let mut world = TspWorld::new(config.tsp.clone(), make_rng(config.engine.seed));

    info!(
        "Running TSP with {} points and population {}",
        config.tsp.nbr_points, config.tsp.pop_size
    );
    engine.start(&mut world)?;

    reports::print_tsp_summary(world.pool(), world.population());

    if let Some(path) = &args.export {
        match world.best() {
            Some(best) => export::export_tour(path, world.pool(), best)?,
            None => warn!("No tour to export"),
        }
    }
    Ok(())
}
