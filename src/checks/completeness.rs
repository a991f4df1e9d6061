//! Completeness checks: `non_empty` and `missingness`.

use serde_json::{Map, Value};

use super::{CheckContext, CheckOutcome, DataCheck, Sample};
use crate::dataset::is_missing;
use crate::Severity;

/// Columns whose missingness is bounded.
pub const KEY_COLUMNS: [&str; 4] = ["timestamp_utc", "precip_prob", "precip_mm", "temp_c"];

/// Largest tolerated fraction of missing cells per key column.
pub const MAX_MISSING_RATE: f64 = 0.01;

/// Fails when the dataset has no rows.
pub struct NonEmpty;

impl DataCheck for NonEmpty {
    fn name(&self) -> &'static str {
        "non_empty"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "Dataset must contain at least one row"
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> CheckOutcome {
        let row_count = ctx.dataset.row_count();
        CheckOutcome::new(row_count > 0, "Dataset must contain at least one row.")
            .metric("row_count", row_count)
    }
}

/// Fails when any key column has more than 1% null or blank cells.
///
/// A column absent from the dataset counts as entirely missing.
pub struct Missingness;

impl DataCheck for Missingness {
    fn name(&self) -> &'static str {
        "missingness"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "Missingness for key columns must be <= 1%"
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> CheckOutcome {
        let dataset = ctx.dataset;
        let row_count = dataset.row_count();

        let mut missing_rows = vec![false; row_count];
        let mut rates = Map::new();
        let mut violations: Vec<&str> = Vec::new();

        for column in KEY_COLUMNS {
            let rate = match dataset.column(column) {
                None => {
                    missing_rows.iter_mut().for_each(|m| *m = true);
                    1.0
                }
                Some(_) if row_count == 0 => 0.0,
                Some(values) => {
                    let mut missing = 0usize;
                    for (i, value) in values.iter().enumerate() {
                        if is_missing(value) {
                            missing += 1;
                            missing_rows[i] = true;
                        }
                    }
                    missing as f64 / row_count as f64
                }
            };
            rates.insert(column.to_string(), Value::from(rate));
            if rate > MAX_MISSING_RATE {
                violations.push(column);
            }
        }

        let passed = violations.is_empty();
        let affected = if passed {
            0
        } else {
            missing_rows.iter().filter(|m| **m).count()
        };

        CheckOutcome::new(passed, "Missingness for key columns must be <= 1%.")
            .metric("missing_rates", Value::Object(rates))
            .metric("violations", violations.clone())
            .selector("missing")
            .affected(affected, Sample::values(violations))
    }
}
