//! Integration tests for the docscrape binary.
//!
//! None of these reach poppler or tesseract: every case lacks its documents
//! and fails at file resolution.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_docscrape"))
}

/// Temp dir holding a config file, an empty document directory and a case table.
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("docs")).unwrap();
    fs::write(
        dir.path().join("cases.csv"),
        "case_number,Document,Filed\n\
CGC24000001,Civil Case Cover Sheet,2024-01-02\n\
CGC24000001,Complaint,2024-01-02\n\
CGC24000002,Civil Case Cover Sheet,2024-01-03\n",
    )
    .unwrap();

    cli()
        .arg("config")
        .arg("init")
        .arg("--output")
        .arg(dir.path().join("config.json"))
        .assert()
        .success();
    dir
}

#[test]
fn test_help_lists_commands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_config_path_honours_flag() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.json");

    cli()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .arg("path")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file:"))
        .stdout(predicate::str::contains("not created"));
}

#[test]
fn test_config_init_refuses_to_overwrite() {
    let dir = workspace();
    let path = dir.path().join("config.json");
    assert!(path.exists());

    cli()
        .arg("config")
        .arg("init")
        .arg("--output")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn test_config_set_then_get() {
    let dir = workspace();
    let path = dir.path().join("config.json");

    cli()
        .arg("--config")
        .arg(&path)
        .args(["config", "set", "raster.dpi", "200"])
        .assert()
        .success();

    cli()
        .arg("--config")
        .arg(&path)
        .args(["config", "get", "raster.dpi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("200"));
}

#[test]
fn test_batch_records_failures_and_keeps_rows() {
    let dir = workspace();
    let output = dir.path().join("out.csv");
    let summary = dir.path().join("summary.json");

    cli()
        .arg("--config")
        .arg(dir.path().join("config.json"))
        .arg("batch")
        .arg(dir.path().join("cases.csv"))
        .arg("--docs")
        .arg(dir.path().join("docs"))
        .arg("--output")
        .arg(&output)
        .arg("--summary")
        .arg(&summary)
        .assert()
        .success()
        .stdout(predicate::str::contains("1: CGC24000001"))
        .stdout(predicate::str::contains("2: CGC24000002"))
        .stdout(predicate::str::contains("errors: 4/4"));

    let table = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("case_number,Document,Filed,address"));
    assert!(lines[1].contains("failed"));
    assert!(lines[1].contains("could not find civil case cover sheet for case CGC24000001"));
    assert!(lines[3].starts_with("CGC24000002,"));

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary).unwrap()).unwrap();
    assert_eq!(summary["cases"], 2);
    assert_eq!(summary["address"]["failed"], 2);
    assert_eq!(summary["failures"][0]["stage"], "located");
}

#[test]
fn test_extract_reports_failure_and_exits_nonzero() {
    let dir = workspace();

    cli()
        .arg("--config")
        .arg(dir.path().join("config.json"))
        .arg("extract")
        .arg("CGC24000001")
        .arg("--docs")
        .arg(dir.path().join("docs"))
        .args(["--field", "demand"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"status\": \"failed\""))
        .stdout(predicate::str::contains("\"stage\": \"located\""));
}

#[test]
fn test_batch_missing_input_fails() {
    let dir = workspace();

    cli()
        .arg("--config")
        .arg(dir.path().join("config.json"))
        .arg("batch")
        .arg(dir.path().join("missing.csv"))
        .arg("--docs")
        .arg(dir.path().join("docs"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input table not found"));
}
