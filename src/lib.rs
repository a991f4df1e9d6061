//! rain-alert library
//!
//! Hourly forecast ingestion with star-schema reshaping and data-quality
//! certification.
//!
//! This library provides:
//! - An extract stage that fetches an hourly forecast for one location
//! - A transform stage that reshapes the payload into dimensional tables
//! - A validation engine running a fixed battery of independent quality checks
//! - A stage orchestrator that sequences the stages and writes a run summary
//!
//! # Example
//!
//! ```no_run
//! use rain_alert::{run_pipeline, Settings};
//!
//! let settings = Settings::default();
//! let run_date = chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
//! let outcome = run_pipeline(run_date, &settings).expect("pipeline aborted");
//! println!("status: {}", outcome.status);
//! ```

pub mod checks;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod logging;
pub mod paths;
pub mod report;
pub mod stages;
pub mod storage;
pub mod time;
pub mod version;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use engine::pipeline::{PipelineError, PipelineOutcome, StageOrchestrator};

// Re-exports for public API
pub use config::Settings;
pub use dataset::Dataset;
pub use engine::result::{ResultSummary, ValidationReport};

/// Diagnostic values attached to a check result, serialized in key order.
pub type Metrics = BTreeMap<String, serde_json::Value>;

/// Severity of a quality check.
///
/// Only `Error` failures flip the validation status; `Warn` failures are
/// reported but never block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "WARN")]
    Warn,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warn => "WARN",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall verdict of a validation run (and of a completed pipeline run).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Pass,
    Fail,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Pass => "pass",
            ValidationStatus::Fail => "fail",
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, ValidationStatus::Pass)
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single quality check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Unique check identifier (e.g., "unique_key")
    pub name: String,
    pub passed: bool,
    pub severity: Severity,
    /// Human-readable explanation
    pub message: String,
    /// Check-specific diagnostics
    pub metrics: Metrics,
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match (self.passed, self.severity) {
            (true, _) => "PASS",
            (false, Severity::Error) => "FAIL",
            (false, Severity::Warn) => "WARN",
        };
        write!(f, "{}: {} ({})", status, self.name, self.message)
    }
}

/// One row of the exceptions table: a summary of everything a failed check
/// flagged, not one record per offending dataset row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionRecord {
    pub run_date: String,
    pub check_name: String,
    pub severity: Severity,
    /// Symbolic label of the failing subset (e.g., "duplicates")
    pub row_selector: String,
    pub details: String,
    pub n_rows_affected: u64,
    /// JSON text with at most three offending rows or values
    pub sample: String,
}

/// Errors that prevent a stage from producing its declared output.
///
/// Quality violations are never reported through this type; they only show up
/// in check results and exception records.
#[derive(Debug, thiserror::Error)]
pub enum RainAlertError {
    /// A required upstream artifact is absent for the run date
    #[error("{what} not found: {}", path.display())]
    InputMissing { what: String, path: PathBuf },

    /// Required fields are missing from a payload or dataset
    #[error("Missing required keys in {context}: {}", missing.join(", "))]
    Schema { context: String, missing: Vec<String> },

    /// Forecast request failed
    #[error("Forecast request failed: {message}")]
    Fetch { message: String },

    /// A value could not be parsed
    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    /// I/O error
    #[error("I/O error in {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl RainAlertError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        RainAlertError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T, E = RainAlertError> = std::result::Result<T, E>;

/// Run the full extract → transform → validate pipeline for one run date.
///
/// This is the main entry point. It fetches the forecast from the configured
/// API, so it needs network access. Returns `Ok` whenever all three stages
/// completed, even if validation found problems; inspect
/// [`PipelineOutcome::status`] for the verdict. Returns `Err` if a stage
/// aborted, in which case no run summary is written.
pub fn run_pipeline(run_date: NaiveDate, settings: &Settings) -> Result<PipelineOutcome, PipelineError> {
    StageOrchestrator::with_default_stages().run(run_date, settings)
}

/// Validate the processed dataset of one run date and write the reports.
///
/// Runs only the validate stage; the processed hourly table and the raw
/// payload must already exist.
pub fn validate(run_date: NaiveDate, settings: &Settings) -> Result<ValidationReport> {
    stages::validate::validate_processed(run_date, settings)
}
