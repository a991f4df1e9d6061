//! Forecast horizon check (`timestamp_within_horizon`).

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use super::{CheckContext, CheckOutcome, DataCheck, Sample};
use crate::dataset::cell_text;
use crate::time::{parse_utc_timestamp, to_iso};
use crate::Severity;

/// Every timestamp must fall in `[min_ts, min_ts + horizon_hours)`.
///
/// Null timestamps count as outside the window. If the column is absent or a
/// present value does not parse, the whole check fails with an error metric.
pub struct TimestampWithinHorizon;

impl DataCheck for TimestampWithinHorizon {
    fn name(&self) -> &'static str {
        "timestamp_within_horizon"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "Timestamps must fall within [min_ts, min_ts + horizon_hours)"
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> CheckOutcome {
        let timestamps = match parse_column(ctx) {
            Ok(ts) => ts,
            Err(e) => {
                return CheckOutcome::errored(format!("Failed to evaluate timestamps: {}", e), e)
            }
        };

        let min_ts = timestamps.iter().flatten().min().copied();
        let max_exclusive = min_ts.map(|min| min + Duration::hours(i64::from(ctx.horizon_hours)));

        let bad: Vec<usize> = timestamps
            .iter()
            .enumerate()
            .filter(|(_, ts)| match (ts, min_ts, max_exclusive) {
                (Some(t), Some(min), Some(max)) => *t < min || *t >= max,
                _ => true,
            })
            .map(|(i, _)| i)
            .collect();

        CheckOutcome::new(
            bad.is_empty(),
            "Timestamps must fall within [min_ts, min_ts + horizon_hours).",
        )
        .metric("min_ts", min_ts.map(to_iso))
        .metric("max_exclusive", max_exclusive.map(to_iso))
        .metric("bad_count", bad.len())
        .selector("outside_horizon")
        .affected(bad.len(), Sample::rows(ctx.dataset, &bad))
    }
}

/// Parse every cell; `None` for null cells.
fn parse_column(ctx: &CheckContext<'_>) -> Result<Vec<Option<DateTime<Utc>>>, String> {
    let values = ctx
        .dataset
        .column("timestamp_utc")
        .ok_or_else(|| "column 'timestamp_utc' not found".to_string())?;

    values
        .into_iter()
        .map(|value| match value {
            Value::Null => Ok(None),
            other => {
                let text = cell_text(other);
                parse_utc_timestamp(&text)
                    .map(Some)
                    .ok_or_else(|| format!("unparseable timestamp '{}'", text))
            }
        })
        .collect()
}
