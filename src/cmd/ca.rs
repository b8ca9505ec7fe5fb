use super::{make_rng, require_limit};
use crate::reports;
use clap::{ArgMatches, Args};
use logosim::automaton::CaWorld;
use logosim::config::{CaParams, EngineParams, SimConfig};
use logosim::engine::display::TerminalDisplay;
use logosim::engine::panel::ScriptedPanel;
use logosim::engine::SimEngine;
use logosim::error::SimResult;
use logosim::export;
use std::io;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct CaArgs {
    #[command(flatten)]
    pub engine: EngineParams,

    #[command(flatten)]
    pub ca: CaParams,

    /// Comma-separated UI script, e.g. "setup, Rule_nbr=30, go"
    #[arg(short = 'e', long, default_value = "setup, go")]
    pub events: String,

    /// Write the full history to this CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Rows of history to print
    #[arg(long, default_value_t = 20)]
    pub tail: usize,
}

pub fn run(args: &CaArgs, mut config: SimConfig, matches: &ArgMatches) -> SimResult<()> {
    config.engine.merge_from_cli(&args.engine, matches);
    config.ca.merge_from_cli(&args.ca, matches);
    config.engine.validate()?;
    config.ca.validate()?;
    require_limit(&args.events, config.ca.max_steps, "max-steps")?;

    let panel = ScriptedPanel::from_script(&args.events)?;
    let display = TerminalDisplay::new(
        io::stdout(),
        config.ca.ca_rows,
        config.ca.ca_cols,
        config.engine.render_every,
    );
    let mut engine = SimEngine::new(panel, display, &config.engine);
    let mut world = CaWorld::new(config.ca.clone(), make_rng(config.engine.seed));

    info!("Running CA with rule {}", config.ca.rule_nbr);
    engine.start(&mut world)?;

    reports::print_rule_table(world.rule());
    reports::print_ca_tail(world.lines(), args.tail);

    if let Some(path) = &args.export {
        export::export_ca_history(path, world.rule(), world.lines())?;
    }
    Ok(())
}
