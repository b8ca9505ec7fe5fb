use regex::Regex;
use std::process::{Command, Output};

fn logosim(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_logosim"))
        .args(args)
        .output()
        .expect("Failed to run logosim")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_ca_prints_rule_and_history() {
    let output = logosim(&[
        "ca",
        "--unthrottled",
        "--ca-rows",
        "4",
        "--ca-cols",
        "7",
        "--init",
        "Center",
        "--max-steps",
        "3",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = stdout_of(&output);

    assert!(stdout.contains("Rule 110 (01101110)"));
    let rows: Vec<&str> = Regex::new(r"\|\s*\d+\s*\|\s*([#.]{7})\s*\|")
        .unwrap()
        .captures_iter(&stdout)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    assert_eq!(rows, vec!["...#...", "..##...", ".###...", "##.#..."]);
}

#[test]
fn test_ca_exports_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.csv");
    let output = logosim(&[
        "ca",
        "--unthrottled",
        "--ca-cols",
        "7",
        "--init",
        "Center",
        "--max-steps",
        "3",
        "-r",
        "90",
        "--export",
        path.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "step,rule,live,cells");
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[1], "0,90,1,0001000");
    assert_eq!(lines[2], "1,90,2,0010100");
}

#[test]
fn test_ca_script_changes_rule() {
    let output = logosim(&[
        "ca",
        "--unthrottled",
        "--ca-cols",
        "7",
        "--max-steps",
        "2",
        "--events",
        "setup, Rule_nbr=30, go",
    ]);
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("Rule 30 (00011110)"));
}

#[test]
fn test_unbounded_run_is_rejected() {
    let output = logosim(&["ca", "--unthrottled", "--max-steps", "0"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("must be positive"));
}

#[test]
fn test_tsp_reports_and_exports_tour() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tour.csv");
    let output = logosim(&[
        "tsp",
        "--unthrottled",
        "-S",
        "42",
        "--nbr-points",
        "12",
        "--max-generations",
        "25",
        "--export",
        path.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = stdout_of(&output);
    let generations = Regex::new(r"\|\s*25\s*\|\s*12\s*\|").unwrap();
    assert!(generations.is_match(&stdout), "summary missing: {}", stdout);
    assert!(Regex::new(r"Best tour: \(\d+(, \d+){11}\)").unwrap().is_match(&stdout));

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "order,gene,x,y,leg");
    assert_eq!(lines.len(), 13);
}

#[test]
fn test_config_file_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sim.json");
    std::fs::write(&path, r#"{ "ca": { "rule_nbr": 150, "max_steps": 2, "ca_cols": 9 } }"#).unwrap();

    let output = logosim(&["--config", path.to_str().unwrap(), "ca", "--unthrottled"]);
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("Rule 150"));
}
