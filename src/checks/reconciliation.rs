//! Upstream reconciliation (`reconciliation_count`).
//!
//! The processed dataset must hold exactly as many rows as the raw payload
//! has hourly timestamps. The upstream count comes from a
//! [`ReconciliationSource`] so the check never touches the filesystem itself.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use super::{CheckContext, CheckOutcome, DataCheck, Sample};
use crate::Severity;

/// Why the upstream row count is unavailable.
#[derive(Debug, thiserror::Error)]
pub enum ReconciliationError {
    #[error("raw payload not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read raw payload {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("raw payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Malformed(String),
}

/// Supplies the row count the processed dataset must reconcile against.
pub trait ReconciliationSource: Send + Sync {
    fn upstream_row_count(&self, run_date: NaiveDate) -> Result<usize, ReconciliationError>;
}

/// Counts `hourly.time` entries in `forecast_raw_{date}.json`.
#[derive(Debug, Clone)]
pub struct RawPayloadSource {
    raw_dir: PathBuf,
}

impl RawPayloadSource {
    pub fn new(raw_dir: impl Into<PathBuf>) -> Self {
        RawPayloadSource {
            raw_dir: raw_dir.into(),
        }
    }

    pub fn payload_path(&self, run_date: NaiveDate) -> PathBuf {
        self.raw_dir
            .join(format!("forecast_raw_{}.json", run_date.format("%Y-%m-%d")))
    }

    pub fn raw_dir(&self) -> &Path {
        &self.raw_dir
    }
}

impl ReconciliationSource for RawPayloadSource {
    fn upstream_row_count(&self, run_date: NaiveDate) -> Result<usize, ReconciliationError> {
        let path = self.payload_path(run_date);
        if !path.exists() {
            return Err(ReconciliationError::Missing(path));
        }
        let text = std::fs::read_to_string(&path)
            .map_err(|source| ReconciliationError::Io { path: path.clone(), source })?;
        let payload: serde_json::Value = serde_json::from_str(&text)?;

        payload
            .get("hourly")
            .and_then(|hourly| hourly.get("time"))
            .and_then(|time| time.as_array())
            .map(Vec::len)
            .ok_or_else(|| ReconciliationError::Malformed("raw payload has no hourly.time array".to_string()))
    }
}

/// Fails when the processed row count differs from the upstream count.
pub struct ReconciliationCount;

impl DataCheck for ReconciliationCount {
    fn name(&self) -> &'static str {
        "reconciliation_count"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "Raw hourly count must equal processed row count"
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> CheckOutcome {
        let raw_count = match ctx.reconciliation.upstream_row_count(ctx.run_date) {
            Ok(count) => count,
            Err(e) => {
                return CheckOutcome::errored(format!("Failed reconciliation_count check: {}", e), e)
            }
        };
        let processed_count = ctx.dataset.row_count();

        CheckOutcome::new(
            raw_count == processed_count,
            "Raw hourly count must equal processed row count.",
        )
        .metric("raw_count", raw_count)
        .metric("processed_count", processed_count)
        .affected(raw_count.abs_diff(processed_count), Sample::values([raw_count, processed_count]))
    }
}
