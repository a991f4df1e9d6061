//! Check execution.
//!
//! Runs registered checks in registration order against one dataset snapshot.
//!
//! # Graceful Degradation
//!
//! This module handles errors gracefully:
//! - Check panics: Caught via std::panic::catch_unwind, converted to a failed
//!   `ERROR` result with the panic message in `metrics.error`
//! - Check-evaluation errors: already contained by the checks themselves
//! - Empty check list: Returns an empty aggregator (status `pass`)
//!
//! Every registered check contributes exactly one result regardless of what
//! other checks did. No function in this module will panic.

use std::any::Any;
use std::time::Instant;

use tracing::{debug, warn};

use crate::checks::{default_checks, CheckContext, CheckOutcome, DataCheck};
use crate::engine::result::ResultAggregator;
use crate::Severity;

/// Ordered registry of checks.
#[derive(Default)]
pub struct CheckExecutor {
    checks: Vec<Box<dyn DataCheck>>,
}

impl CheckExecutor {
    /// Create an executor with no checks.
    pub fn new() -> Self {
        CheckExecutor { checks: Vec::new() }
    }

    /// Executor holding the fixed production battery.
    pub fn with_default_checks() -> Self {
        let mut executor = CheckExecutor::new();
        executor.register_checks(default_checks());
        executor
    }

    /// Register checks for execution
    pub fn register_checks(&mut self, checks: Vec<Box<dyn DataCheck>>) {
        self.checks.extend(checks);
    }

    /// Register a single check
    pub fn register_check(&mut self, check: Box<dyn DataCheck>) {
        self.checks.push(check);
    }

    pub fn checks(&self) -> &[Box<dyn DataCheck>] {
        &self.checks
    }

    /// Run all registered checks in order.
    pub fn run_all(&self, ctx: &CheckContext<'_>) -> ResultAggregator {
        let mut aggregator = ResultAggregator::new(ctx.run_date.format("%Y-%m-%d").to_string());

        for check in &self.checks {
            let start = Instant::now();
            let (outcome, severity) = self.execute_check(check.as_ref(), ctx);
            debug!(
                check = check.name(),
                passed = outcome.passed,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "check_complete"
            );
            if !outcome.passed {
                warn!(
                    check = check.name(),
                    severity = %severity,
                    n_rows_affected = outcome.n_rows_affected,
                    "check_failed"
                );
            }
            aggregator.add_outcome(check.name(), severity, outcome);
        }

        aggregator
    }

    /// Execute a single check, containing panics. A panicking check is
    /// reported with `ERROR` severity whatever it declares.
    fn execute_check(&self, check: &dyn DataCheck, ctx: &CheckContext<'_>) -> (CheckOutcome, Severity) {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| check.evaluate(ctx)));

        match result {
            Ok(outcome) => (outcome, check.severity()),
            Err(payload) => (
                CheckOutcome::errored(
                    format!("Check {} panicked during execution", check.name()),
                    panic_message(payload.as_ref()),
                ),
                Severity::Error,
            ),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "An unexpected error occurred".to_string()
    }
}
