//! CLI integration tests.
//!
//! Run the built binary against temporary data directories.

use std::path::Path;
use std::process::{Command, Output};

use rain_alert::paths::ArtifactPaths;
use rain_alert::stages::transform::transform_forecast;

use crate::mocks::*;

fn rain_alert(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rain-alert"))
        .args(args)
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Config file plus transformed data for 2024-06-01.
fn prepared(dir: &Path, payload: serde_json::Value) -> String {
    let settings = settings_in(dir);
    write_raw(&settings, &payload);
    transform_forecast(run_date(), &settings).unwrap();
    write_config(dir, &settings).display().to_string()
}

#[test]
fn test_version_command() {
    let output = rain_alert(&["version"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).starts_with("rain-alert "));
}

#[test]
fn test_help_exits_zero() {
    let output = rain_alert(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("validate"));
}

#[test]
fn test_invalid_usage_exits_three() {
    assert_eq!(rain_alert(&[]).status.code(), Some(3));
    assert_eq!(rain_alert(&["frobnicate"]).status.code(), Some(3));
    assert_eq!(
        rain_alert(&["validate", "--run-date", "June 1st"]).status.code(),
        Some(3)
    );
}

#[test]
fn test_list_command() {
    let output = rain_alert(&["list"]);
    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    for name in [
        "non_empty",
        "unique_key",
        "timestamp_within_horizon",
        "precip_prob_range",
        "precip_mm_nonnegative",
        "temp_reasonable",
        "missingness",
        "reconciliation_count",
    ] {
        assert!(text.contains(name), "missing {name}");
    }
    assert!(text.contains("WARN"));
}

#[test]
fn test_missing_config_file() {
    let output = rain_alert(&["--config", "/nonexistent/rain.json", "list"]);
    assert_eq!(output.status.code(), Some(0));

    let output = rain_alert(&["--config", "/nonexistent/rain.json", "latest"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Configuration file not found"));
}

#[test]
fn test_validate_pass() {
    let dir = tempfile::tempdir().unwrap();
    let config = prepared(dir.path(), forecast_payload(48));

    let output = rain_alert(&["--config", &config, "validate", "--run-date", "2024-06-01"]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(stdout(&output).contains("Exit code: 0 (pass)"));
}

#[test]
fn test_validate_fail_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let config = prepared(dir.path(), payload_with_duplicate());

    let output = rain_alert(&[
        "--config",
        &config,
        "validate",
        "--run-date",
        "2024-06-01",
        "--format",
        "json",
    ]);
    assert_eq!(output.status.code(), Some(2));
    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["status"], "fail");
    assert_eq!(report["errors_failed"], 1);
}

#[test]
fn test_validate_without_processed_data() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &settings_in(dir.path()));

    let output = rain_alert(&[
        "--config",
        config.to_str().unwrap(),
        "validate",
        "--run-date",
        "2024-06-01",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Processed file not found"));
}

#[test]
fn test_report_missing_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &settings_in(dir.path()));

    let output = rain_alert(&[
        "--config",
        config.to_str().unwrap(),
        "report",
        "--run-date",
        "2024-06-01",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Missing required input(s):"));
}

#[test]
fn test_report_and_latest_after_validate() {
    let dir = tempfile::tempdir().unwrap();
    let config = prepared(dir.path(), forecast_payload(48));
    rain_alert(&["--config", &config, "validate", "--run-date", "2024-06-01"]);

    let output = rain_alert(&["--config", &config, "report", "--run-date", "2024-06-01"]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));

    let settings = settings_in(dir.path());
    let paths = ArtifactPaths::new(&settings, run_date());
    let markdown = std::fs::read_to_string(paths.run_report("md")).unwrap();
    assert!(markdown.starts_with("# Run Report 2024-06-01"));
    assert!(markdown.contains("- validation_status: pass"));

    let output = rain_alert(&["--config", &config, "latest"]);
    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.starts_with("latest_star_folder: "));
    assert!(text.contains("fact_forecast_hourly.csv"));
}
