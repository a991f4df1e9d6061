//! Result aggregation and reporting.
//!
//! Collects check results and exception records in execution order and
//! derives the verdict.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::checks::CheckOutcome;
use crate::{CheckResult, ExceptionRecord, Severity, ValidationStatus};

/// Result summary statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultSummary {
    pub total: u32,
    pub checks_passed: u32,
    pub errors_failed: u32,
    pub warns_failed: u32,
}

impl ResultSummary {
    /// Summarize an ordered sequence of results.
    pub fn from_results(results: &[CheckResult]) -> Self {
        let mut summary = ResultSummary::default();

        for result in results {
            summary.total += 1;

            match (result.passed, result.severity) {
                (true, _) => summary.checks_passed += 1,
                (false, Severity::Error) => summary.errors_failed += 1,
                (false, Severity::Warn) => summary.warns_failed += 1,
            }
        }

        summary
    }

    /// `fail` iff at least one `ERROR` check failed.
    pub fn status(&self) -> ValidationStatus {
        if self.errors_failed > 0 {
            ValidationStatus::Fail
        } else {
            ValidationStatus::Pass
        }
    }
}

/// Result aggregator for collecting check outcomes
#[derive(Debug, Default)]
pub struct ResultAggregator {
    run_date: String,
    results: Vec<CheckResult>,
    exceptions: Vec<ExceptionRecord>,
}

impl ResultAggregator {
    pub fn new(run_date: impl Into<String>) -> Self {
        ResultAggregator {
            run_date: run_date.into(),
            results: Vec::new(),
            exceptions: Vec::new(),
        }
    }

    /// Record one check outcome. A failing outcome also yields exactly one
    /// exception record.
    pub fn add_outcome(&mut self, name: &str, severity: Severity, outcome: CheckOutcome) {
        if !outcome.passed {
            self.exceptions.push(ExceptionRecord {
                run_date: self.run_date.clone(),
                check_name: name.to_string(),
                severity,
                row_selector: outcome.row_selector,
                details: outcome.message.clone(),
                n_rows_affected: outcome.n_rows_affected,
                sample: outcome.sample.to_json(),
            });
        }

        self.results.push(CheckResult {
            name: name.to_string(),
            passed: outcome.passed,
            severity,
            message: outcome.message,
            metrics: outcome.metrics,
        });
    }

    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| !r.passed)
    }

    pub fn summary(&self) -> ResultSummary {
        ResultSummary::from_results(&self.results)
    }

    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    pub fn exceptions(&self) -> &[ExceptionRecord] {
        &self.exceptions
    }

    pub fn into_parts(self) -> (Vec<CheckResult>, Vec<ExceptionRecord>) {
        (self.results, self.exceptions)
    }
}

/// Path of the dataset a validation report was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportInputs {
    pub forecast_hourly: String,
}

/// Paths a validation run wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOutputs {
    pub validation: String,
    pub exceptions: String,
}

/// Validation report, persisted as `validation_{date}.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub run_date: String,
    pub generated_at_utc: String,
    pub status: ValidationStatus,
    pub row_count: usize,
    pub errors_failed: u32,
    pub warns_failed: u32,
    pub checks: Vec<CheckResult>,
    pub inputs: ReportInputs,
    pub outputs: ReportOutputs,
    /// Exception records of this run; persisted separately as CSV
    #[serde(skip)]
    pub exceptions: Vec<ExceptionRecord>,
}

impl ValidationReport {
    /// Assemble a report from aggregated outcomes.
    pub fn new(
        aggregator: ResultAggregator,
        row_count: usize,
        input: &Path,
        validation_path: &Path,
        exceptions_path: &Path,
    ) -> Self {
        let summary = aggregator.summary();
        let run_date = aggregator.run_date.clone();
        let (checks, exceptions) = aggregator.into_parts();

        ValidationReport {
            run_date,
            generated_at_utc: crate::time::to_iso(crate::time::now_utc()),
            status: summary.status(),
            row_count,
            errors_failed: summary.errors_failed,
            warns_failed: summary.warns_failed,
            checks,
            inputs: ReportInputs {
                forecast_hourly: input.display().to_string(),
            },
            outputs: ReportOutputs {
                validation: validation_path.display().to_string(),
                exceptions: exceptions_path.display().to_string(),
            },
            exceptions,
        }
    }

    pub fn summary(&self) -> ResultSummary {
        ResultSummary::from_results(&self.checks)
    }

    /// Results of checks that did not pass, in execution order.
    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }
}
