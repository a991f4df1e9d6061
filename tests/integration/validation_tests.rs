//! Validation against processed data written by the transform stage.

use pretty_assertions::assert_eq;
use serde_json::json;

use rain_alert::checks::reconciliation::{RawPayloadSource, ReconciliationError, ReconciliationSource};
use rain_alert::engine::exceptions::read_exceptions;
use rain_alert::engine::executor::CheckExecutor;
use rain_alert::paths::ArtifactPaths;
use rain_alert::stages::transform::transform_forecast;
use rain_alert::stages::validate::validate_with_source;
use rain_alert::{validate, RainAlertError, Severity, ValidationStatus};

use crate::mocks::*;

struct Unreachable;

impl ReconciliationSource for Unreachable {
    fn upstream_row_count(&self, _run_date: chrono::NaiveDate) -> Result<usize, ReconciliationError> {
        Err(ReconciliationError::Malformed("upstream offline".to_string()))
    }
}

#[test]
fn test_duplicate_key_and_count_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());

    write_raw(&settings, &payload_with_duplicate());
    transform_forecast(run_date(), &settings).unwrap();
    // Upstream now reports 50 hours for the same date.
    write_raw(&settings, &forecast_payload(50));

    let report = validate(run_date(), &settings).unwrap();

    assert_eq!(report.status, ValidationStatus::Fail);
    assert_eq!(report.row_count, 48);
    assert_eq!(report.errors_failed, 2);
    assert_eq!(report.warns_failed, 0);

    let failed: Vec<&str> = report.failures().map(|c| c.name.as_str()).collect();
    assert_eq!(failed, vec!["unique_key", "reconciliation_count"]);

    let recon = report.checks.iter().find(|c| c.name == "reconciliation_count").unwrap();
    assert_eq!(recon.metrics.get("raw_count"), Some(&json!(50)));
    assert_eq!(recon.metrics.get("processed_count"), Some(&json!(48)));

    let paths = ArtifactPaths::new(&settings, run_date());
    let exceptions = read_exceptions(&paths.exceptions()).unwrap();
    assert_eq!(exceptions.len(), 2);
    assert_eq!(exceptions[0].check_name, "unique_key");
    assert_eq!(exceptions[0].severity, Severity::Error);
    assert_eq!(exceptions[0].n_rows_affected, 2);
    assert_eq!(exceptions[1].check_name, "reconciliation_count");
    assert_eq!(exceptions[1].n_rows_affected, 2);
    assert_eq!(exceptions[1].sample, "[50,48]");
}

#[test]
fn test_report_matches_persisted_file() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    write_raw(&settings, &forecast_payload(48));
    transform_forecast(run_date(), &settings).unwrap();

    let report = validate(run_date(), &settings).unwrap();
    let persisted: rain_alert::ValidationReport = serde_json::from_str(
        &std::fs::read_to_string(&report.outputs.validation).unwrap(),
    )
    .unwrap();

    assert_eq!(persisted.status, ValidationStatus::Pass);
    assert_eq!(persisted.checks, report.checks);
    assert_eq!(persisted.generated_at_utc, report.generated_at_utc);
    assert!(persisted.generated_at_utc.ends_with('Z'));
}

#[test]
fn test_unavailable_upstream_fails_reconciliation_only() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    write_raw(&settings, &forecast_payload(48));
    transform_forecast(run_date(), &settings).unwrap();

    let report = validate_with_source(
        run_date(),
        &settings,
        &CheckExecutor::with_default_checks(),
        &Unreachable,
    )
    .unwrap();

    let failed: Vec<&str> = report.failures().map(|c| c.name.as_str()).collect();
    assert_eq!(failed, vec!["reconciliation_count"]);
    let recon = report.checks.iter().find(|c| c.name == "reconciliation_count").unwrap();
    assert!(recon.message.starts_with("Failed reconciliation_count check: "));
    assert!(recon.metrics.contains_key("error"));
}

#[test]
fn test_raw_payload_removed_after_transform() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let raw = write_raw(&settings, &forecast_payload(48));
    transform_forecast(run_date(), &settings).unwrap();
    std::fs::remove_file(&raw).unwrap();

    let source = RawPayloadSource::new(&settings.data_raw_dir);
    assert!(matches!(
        source.upstream_row_count(run_date()),
        Err(ReconciliationError::Missing(_))
    ));

    let report = validate(run_date(), &settings).unwrap();
    assert_eq!(report.errors_failed, 1);
    assert_eq!(report.status, ValidationStatus::Fail);
}

#[test]
fn test_missing_processed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());

    let err = validate(run_date(), &settings).unwrap_err();
    assert!(matches!(err, RainAlertError::InputMissing { .. }));
    assert!(err.to_string().contains("forecast_hourly_2024-06-01.csv"));

    let paths = ArtifactPaths::new(&settings, run_date());
    assert!(!paths.validation().exists());
    assert!(!paths.exceptions().exists());
}

#[test]
fn test_tighter_horizon_flags_late_rows() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = settings_in(dir.path());
    write_raw(&settings, &forecast_payload(48));
    transform_forecast(run_date(), &settings).unwrap();

    settings.horizon_hours = 24;
    let report = validate(run_date(), &settings).unwrap();

    let horizon = report
        .checks
        .iter()
        .find(|c| c.name == "timestamp_within_horizon")
        .unwrap();
    assert!(!horizon.passed);
    assert_eq!(horizon.metrics.get("bad_count"), Some(&json!(24)));
}
