use clap::{CommandFactory, FromArgMatches, Parser};
use logosim::config::{CaParams, InitialRow, SimConfig, TspParams};
use logosim::error::SimError;
use std::fs::File;
use std::io::Write;

#[derive(Parser, Debug)]
struct CaCli {
    #[command(flatten)]
    ca: CaParams,
}

fn parse_ca(args: &[&str]) -> (CaParams, clap::ArgMatches) {
    let matches = CaCli::command().get_matches_from(args);
    let cli = CaCli::from_arg_matches(&matches).unwrap();
    (cli.ca, matches)
}

#[test]
fn test_defaults_are_valid() {
    let config = SimConfig::default();
    assert_eq!(config.ca.rule_nbr, 110);
    assert_eq!(config.ca.init, InitialRow::Right);
    assert_eq!(config.tsp.nbr_points, 15);
    assert!(config.engine.validate().is_ok());
    assert!(config.ca.validate().is_ok());
    assert!(config.tsp.validate().is_ok());
}

#[test]
fn test_partial_file_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sim.json");
    let mut file = File::create(&path).unwrap();
    writeln!(file, r#"{{ "ca": {{ "rule_nbr": 30, "init": "Center" }}, "engine": {{ "seed": 7 }} }}"#).unwrap();

    let config = SimConfig::load_from_file(&path).unwrap();
    assert_eq!(config.ca.rule_nbr, 30);
    assert_eq!(config.ca.init, InitialRow::Center);
    assert_eq!(config.ca.ca_cols, 151);
    assert_eq!(config.engine.seed, Some(7));
    assert_eq!(config.tsp.pop_size, TspParams::default().pop_size);
}

#[test]
fn test_bad_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(SimConfig::load_from_file(&path), Err(SimError::Json(_))));
    assert!(matches!(
        SimConfig::load_from_file(dir.path().join("missing.json")),
        Err(SimError::Io(_))
    ));
}

#[test]
fn test_cli_overrides_only_given_values() {
    let mut from_file = CaParams {
        rule_nbr: 30,
        ca_cols: 64,
        ..Default::default()
    };
    let (cli, matches) = parse_ca(&["test", "--rule-nbr", "90"]);
    from_file.merge_from_cli(&cli, &matches);

    assert_eq!(from_file.rule_nbr, 90);
    // Not on the command line, so the file value stands.
    assert_eq!(from_file.ca_cols, 64);
}

#[test]
fn test_init_parses_from_cli() {
    let (cli, _) = parse_ca(&["test", "--init", "Random"]);
    assert_eq!(cli.init, InitialRow::Random);
}

#[test]
fn test_validation_rejects_degenerate_worlds() {
    let ca = CaParams {
        ca_cols: 0,
        ..Default::default()
    };
    assert!(matches!(ca.validate(), Err(SimError::Config(_))));

    let tsp = TspParams {
        nbr_points: 2,
        ..Default::default()
    };
    assert!(tsp.validate().is_err());

    let tsp = TspParams {
        nbr_points: 201,
        ..Default::default()
    };
    assert!(tsp.validate().is_err());

    let tsp = TspParams {
        prob_random_parent: 101,
        ..Default::default()
    };
    assert!(tsp.validate().is_err());
}
