//! Composite key uniqueness (`unique_key`).

use std::collections::HashMap;

use super::{CheckContext, CheckOutcome, DataCheck, Sample};
use crate::dataset::cell_text;
use crate::Severity;

pub const KEY_COLUMNS: [&str; 2] = ["timestamp_utc", "location_id"];

/// Fails when `(timestamp_utc, location_id)` repeats.
///
/// Every occurrence of a repeated key is affected, not only the second and
/// later ones.
pub struct UniqueKey;

impl DataCheck for UniqueKey {
    fn name(&self) -> &'static str {
        "unique_key"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "(timestamp_utc, location_id) must be unique"
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> CheckOutcome {
        let dataset = ctx.dataset;

        if dataset.is_empty() {
            return CheckOutcome::new(false, "Duplicate check skipped because dataset is empty.")
                .metric("duplicate_count", 0);
        }

        let missing: Vec<&str> = KEY_COLUMNS
            .iter()
            .copied()
            .filter(|c| !dataset.has_column(c))
            .collect();
        if !missing.is_empty() {
            return CheckOutcome::new(
                false,
                format!("Required columns missing for unique key check: {}.", missing.join(", ")),
            )
            .metric("missing_columns", missing);
        }

        let mut groups: HashMap<(String, String), Vec<usize>> = HashMap::new();
        let timestamps = dataset.column("timestamp_utc").unwrap_or_default();
        let locations = dataset.column("location_id").unwrap_or_default();
        for (i, (ts, loc)) in timestamps.into_iter().zip(locations).enumerate() {
            groups.entry((cell_text(ts), cell_text(loc))).or_default().push(i);
        }

        let mut duplicates: Vec<usize> = groups
            .into_values()
            .filter(|rows| rows.len() > 1)
            .flatten()
            .collect();
        duplicates.sort_unstable();

        CheckOutcome::new(duplicates.is_empty(), "Duplicate (timestamp_utc, location_id) keys found.")
            .metric("duplicate_count", duplicates.len())
            .selector("duplicates")
            .affected(duplicates.len(), Sample::rows(dataset, &duplicates))
    }
}
