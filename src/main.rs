use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use logosim::config::SimConfig;
use logosim::error::SimError;
use std::process;
use tracing::{error, info, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON config file; command-line arguments override its values
    #[arg(global = true, long)]
    config: Option<String>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Elementary cellular automaton
    Ca(cmd::ca::CaArgs),
    /// Genetic-algorithm travelling salesman
    Tsp(cmd::tsp::TspArgs),
}

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .init();

    let config = match &cli.config {
        Some(path) => {
            info!("Loading config from {}", path);
            SimConfig::load_from_file(path).unwrap_or_else(|e| {
                error!("{}", e);
                process::exit(1);
            })
        }
        None => SimConfig::default(),
    };

    let (name, result) = match &cli.command {
        Commands::Ca(args) => (
            "ca",
            matches
                .subcommand_matches("ca")
                .ok_or_else(|| SimError::Config("missing ca arguments".into()))
                .and_then(|sub| cmd::ca::run(args, config, sub)),
        ),
        Commands::Tsp(args) => (
            "tsp",
            matches
                .subcommand_matches("tsp")
                .ok_or_else(|| SimError::Config("missing tsp arguments".into()))
                .and_then(|sub| cmd::tsp::run(args, config, sub)),
        ),
    };

    if let Err(e) = result {
        error!("{} failed: {}", name, e);
        process::exit(1);
    }
}
