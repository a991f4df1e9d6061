//! Data-quality checks.
//!
//! Each check is a value implementing [`DataCheck`]: it sees one immutable
//! dataset snapshot plus the run configuration and returns a [`CheckOutcome`].
//! The executor turns outcomes into check results and exception records, so
//! checks never build those themselves.
//!
//! # Graceful Degradation
//!
//! Checks never abort a run:
//! - Absent column: values count as failing (or as "not numeric"), never a panic
//! - Unparseable data: the check fails with `metrics.error` set
//! - Unavailable reconciliation source: same as unparseable data
//!
//! The fixed battery, in execution order:
//! - `non_empty`, `unique_key`, `timestamp_within_horizon`
//! - `precip_prob_range`, `precip_mm_nonnegative`, `temp_reasonable`
//! - `missingness`, `reconciliation_count`

pub mod completeness;
pub mod horizon;
pub mod keys;
pub mod ranges;
pub mod reconciliation;

use chrono::NaiveDate;
use serde_json::Value;
use std::fmt;

use crate::dataset::Dataset;
use crate::{Metrics, Severity};
use reconciliation::ReconciliationSource;

/// Everything a check may look at.
pub struct CheckContext<'a> {
    pub run_date: NaiveDate,
    pub dataset: &'a Dataset,
    pub horizon_hours: u32,
    pub reconciliation: &'a dyn ReconciliationSource,
}

/// A single named quality check.
pub trait DataCheck: Send + Sync {
    /// Unique identifier, used as `check_name` in reports
    fn name(&self) -> &'static str;

    fn severity(&self) -> Severity;

    /// One-line description for listings
    fn description(&self) -> &'static str;

    fn evaluate(&self, ctx: &CheckContext<'_>) -> CheckOutcome;
}

/// Bounded preview of offending rows or values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample(Vec<Value>);

impl Sample {
    /// Samples never hold more than this many items.
    pub const MAX_ITEMS: usize = 3;

    pub fn empty() -> Self {
        Sample(Vec::new())
    }

    /// The first rows among `indices`, as JSON objects.
    pub fn rows(dataset: &Dataset, indices: &[usize]) -> Self {
        Sample(
            indices
                .iter()
                .take(Self::MAX_ITEMS)
                .map(|&i| dataset.row_record(i))
                .collect(),
        )
    }

    pub fn values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Sample(values.into_iter().take(Self::MAX_ITEMS).map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON array text, `[]` when empty.
    pub fn to_json(&self) -> String {
        Value::Array(self.0.clone()).to_string()
    }
}

/// What a check reports back to the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub passed: bool,
    pub message: String,
    pub metrics: Metrics,
    pub row_selector: String,
    pub n_rows_affected: u64,
    pub sample: Sample,
}

impl CheckOutcome {
    /// Outcome with no metrics, selector `all`, and no affected rows.
    pub fn new(passed: bool, message: impl Into<String>) -> Self {
        CheckOutcome {
            passed,
            message: message.into(),
            metrics: Metrics::new(),
            row_selector: "all".to_string(),
            n_rows_affected: 0,
            sample: Sample::empty(),
        }
    }

    /// Failure of a check that could not be evaluated at all.
    pub fn errored(message: impl Into<String>, error: impl fmt::Display) -> Self {
        CheckOutcome::new(false, message).metric("error", error.to_string())
    }

    pub fn metric(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metrics.insert(key.to_string(), value.into());
        self
    }

    pub fn selector(mut self, row_selector: &str) -> Self {
        self.row_selector = row_selector.to_string();
        self
    }

    pub fn affected(mut self, n_rows: usize, sample: Sample) -> Self {
        self.n_rows_affected = n_rows as u64;
        self.sample = sample;
        self
    }
}

/// The fixed battery in execution order.
pub fn default_checks() -> Vec<Box<dyn DataCheck>> {
    vec![
        Box::new(completeness::NonEmpty),
        Box::new(keys::UniqueKey),
        Box::new(horizon::TimestampWithinHorizon),
        Box::new(ranges::PrecipProbRange),
        Box::new(ranges::PrecipMmNonnegative),
        Box::new(ranges::TempReasonable),
        Box::new(completeness::Missingness),
        Box::new(reconciliation::ReconciliationCount),
    ]
}
