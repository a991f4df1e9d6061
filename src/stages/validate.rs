//! Validate stage: run the check battery over the processed hourly table and
//! persist the validation report and exceptions table.

use chrono::NaiveDate;
use tracing::info;

use crate::checks::reconciliation::{RawPayloadSource, ReconciliationSource};
use crate::checks::CheckContext;
use crate::engine::exceptions::write_exceptions;
use crate::engine::executor::CheckExecutor;
use crate::engine::pipeline::{PipelineStage, StageOutput};
use crate::engine::result::ValidationReport;
use crate::paths::ArtifactPaths;
use crate::{storage, Dataset, RainAlertError, Result, Settings};

/// Validate the processed dataset for `run_date`, reconciling against the raw
/// payload in `data_raw_dir`.
pub fn validate_processed(run_date: NaiveDate, settings: &Settings) -> Result<ValidationReport> {
    let source = RawPayloadSource::new(&settings.data_raw_dir);
    validate_with_source(run_date, settings, &CheckExecutor::with_default_checks(), &source)
}

/// Run `executor` over the processed dataset and write both reports.
///
/// Quality violations never produce an error here; only an absent or
/// unreadable dataset and failed writes do.
pub fn validate_with_source(
    run_date: NaiveDate,
    settings: &Settings,
    executor: &CheckExecutor,
    reconciliation: &dyn ReconciliationSource,
) -> Result<ValidationReport> {
    let paths = ArtifactPaths::new(settings, run_date);
    let processed_path = paths.forecast_hourly();
    let validation_path = paths.validation();
    let exceptions_path = paths.exceptions();

    if !processed_path.exists() {
        return Err(RainAlertError::InputMissing {
            what: "Processed file".to_string(),
            path: processed_path,
        });
    }
    let dataset = Dataset::from_csv_path(&processed_path)?;

    let ctx = CheckContext {
        run_date,
        dataset: &dataset,
        horizon_hours: settings.horizon_hours,
        reconciliation,
    };
    let aggregator = executor.run_all(&ctx);

    let report = ValidationReport::new(
        aggregator,
        dataset.row_count(),
        &processed_path,
        &validation_path,
        &exceptions_path,
    );

    storage::write_json(&validation_path, &report)?;
    write_exceptions(&exceptions_path, &report.exceptions)?;

    info!(
        status = %report.status,
        row_count = report.row_count,
        errors_failed = report.errors_failed,
        warns_failed = report.warns_failed,
        "validation_written"
    );

    Ok(report)
}

/// Pipeline stage running [`validate_processed`].
pub struct ValidateStage;

impl PipelineStage for ValidateStage {
    fn run(&self, run_date: NaiveDate, settings: &Settings) -> Result<StageOutput> {
        let report = validate_processed(run_date, settings)?;
        Ok(StageOutput::from_paths([
            ("validation", report.outputs.validation.clone().into()),
            ("exceptions", report.outputs.exceptions.clone().into()),
        ])
        .with_validation(report))
    }
}
