//! Full extract -> transform -> validate runs.

use pretty_assertions::assert_eq;
use serde_json::Value;

use rain_alert::engine::exceptions::EXCEPTION_COLUMNS;
use rain_alert::engine::pipeline::{PipelineError, StageName, StageOrchestrator, StageStatus};
use rain_alert::paths::ArtifactPaths;
use rain_alert::{RainAlertError, ValidationStatus};

use crate::mocks::*;

#[test]
fn test_clean_run_passes() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let source = StaticForecastSource::new(forecast_payload(48));
    let orchestrator = StageOrchestrator::with_source(Box::new(source.clone()));

    let outcome = orchestrator.run(run_date(), &settings).unwrap();

    assert_eq!(source.calls(), 1);
    assert_eq!(outcome.status, ValidationStatus::Pass);
    for stage in StageName::ALL {
        assert_eq!(outcome.stage_statuses.get(&stage), Some(&StageStatus::Success));
        assert!(outcome.stage_durations.contains_key(&stage));
    }

    let report = outcome.validation.as_ref().unwrap();
    assert_eq!(report.row_count, 48);
    assert_eq!(report.checks.len(), 8);
    assert!(report.checks.iter().all(|c| c.passed), "{:?}", report.checks);

    let paths = ArtifactPaths::new(&settings, run_date());
    let exceptions = std::fs::read_to_string(paths.exceptions()).unwrap();
    assert_eq!(exceptions.trim_end(), EXCEPTION_COLUMNS.join(","));
    assert!(paths.star_dir().join("fact_forecast_hourly.csv").exists());
}

#[test]
fn test_run_summary_written() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let orchestrator =
        StageOrchestrator::with_source(Box::new(StaticForecastSource::new(forecast_payload(48))));

    let outcome = orchestrator.run(run_date(), &settings).unwrap();
    assert!(outcome.run_summary_path.ends_with("reports/runs/run_2024-06-01.json"));

    let summary: Value =
        serde_json::from_str(&std::fs::read_to_string(&outcome.run_summary_path).unwrap()).unwrap();
    assert_eq!(summary["run_date"], "2024-06-01");
    assert_eq!(summary["status"], "pass");
    assert_eq!(summary["stage_statuses"]["extract"], "success");
    assert_eq!(summary["stage_statuses"]["validate"], "success");
    assert!(summary["paths"]["raw"].as_str().unwrap().ends_with("forecast_raw_2024-06-01.json"));
    assert!(summary["paths"]["processed"]["forecast_hourly"].is_string());
    assert!(summary["paths"]["validation"]["exceptions"].is_string());
}

#[test]
fn test_extract_failure_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let orchestrator = StageOrchestrator::with_source(Box::new(FailingSource));

    let err = orchestrator.run(run_date(), &settings).unwrap_err();
    let (stage, statuses, source) = match err {
        PipelineError::StageFailed {
            stage,
            statuses,
            source,
        } => (stage, statuses, source),
        other => panic!("unexpected error: {other}"),
    };

    assert_eq!(stage, StageName::Extract);
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses.get(&StageName::Extract), Some(&StageStatus::Failed));
    assert!(matches!(source, RainAlertError::Fetch { .. }));

    let paths = ArtifactPaths::new(&settings, run_date());
    assert!(!paths.run_summary().exists());
    assert!(!paths.forecast_hourly().exists());
    assert!(!paths.validation().exists());
}

#[test]
fn test_malformed_payload_aborts_in_transform() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let mut payload = forecast_payload(48);
    payload["hourly"].as_object_mut().unwrap().remove("precipitation");
    let orchestrator = StageOrchestrator::with_source(Box::new(StaticForecastSource::new(payload)));

    let err = orchestrator.run(run_date(), &settings).unwrap_err();
    let (stage, statuses, source) = match err {
        PipelineError::StageFailed {
            stage,
            statuses,
            source,
        } => (stage, statuses, source),
        other => panic!("unexpected error: {other}"),
    };
    assert_eq!(stage, StageName::Transform);
    assert_eq!(statuses.get(&StageName::Extract), Some(&StageStatus::Success));
    assert!(!statuses.contains_key(&StageName::Validate));
    assert!(matches!(source, RainAlertError::Schema { .. }));

    let paths = ArtifactPaths::new(&settings, run_date());
    assert!(paths.raw().exists());
    assert!(!paths.run_summary().exists());
}

#[test]
fn test_quality_failure_completes_with_fail_status() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let orchestrator =
        StageOrchestrator::with_source(Box::new(StaticForecastSource::new(payload_with_duplicate())));

    let outcome = orchestrator.run(run_date(), &settings).unwrap();
    assert_eq!(outcome.status, ValidationStatus::Fail);
    assert!(outcome.run_summary_path.exists());

    let failed: Vec<&str> = outcome
        .validation
        .as_ref()
        .unwrap()
        .failures()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(failed, vec!["unique_key"]);
}

#[test]
fn test_rerun_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let orchestrator =
        StageOrchestrator::with_source(Box::new(StaticForecastSource::new(payload_with_duplicate())));
    let paths = ArtifactPaths::new(&settings, run_date());

    orchestrator.run(run_date(), &settings).unwrap();
    let first_validation = stable_validation(&paths.validation());
    let first_exceptions = std::fs::read_to_string(paths.exceptions()).unwrap();
    let first_hourly = std::fs::read_to_string(paths.forecast_hourly()).unwrap();

    orchestrator.run(run_date(), &settings).unwrap();
    assert_eq!(stable_validation(&paths.validation()), first_validation);
    assert_eq!(std::fs::read_to_string(paths.exceptions()).unwrap(), first_exceptions);
    assert_eq!(std::fs::read_to_string(paths.forecast_hourly()).unwrap(), first_hourly);
}
