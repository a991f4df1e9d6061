//! Value range checks: `precip_prob_range`, `precip_mm_nonnegative`,
//! `temp_reasonable`.

use super::{CheckContext, CheckOutcome, DataCheck, Sample};
use crate::Severity;

pub const TEMP_MIN_C: f64 = -60.0;
pub const TEMP_MAX_C: f64 = 60.0;

/// Probability scale inferred from the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbabilityScale {
    Fraction,
    Percent,
}

impl ProbabilityScale {
    /// `0-1` when the largest value is at most 1, otherwise `0-100`.
    pub fn detect(max_value: f64) -> Self {
        if max_value <= 1.0 {
            ProbabilityScale::Fraction
        } else {
            ProbabilityScale::Percent
        }
    }

    pub fn bounds(&self) -> (f64, f64) {
        match self {
            ProbabilityScale::Fraction => (0.0, 1.0),
            ProbabilityScale::Percent => (0.0, 100.0),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProbabilityScale::Fraction => "0-1",
            ProbabilityScale::Percent => "0-100",
        }
    }
}

/// Fails for precipitation probabilities outside the detected scale.
pub struct PrecipProbRange;

impl DataCheck for PrecipProbRange {
    fn name(&self) -> &'static str {
        "precip_prob_range"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "precip_prob must be within the detected 0-1 or 0-100 scale"
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> CheckOutcome {
        let values = ctx.dataset.numeric_column("precip_prob");
        let numeric: Vec<f64> = values.iter().flatten().copied().collect();

        if numeric.is_empty() {
            let missing = values.len();
            return CheckOutcome::new(false, "precip_prob values are missing or non-numeric.")
                .metric("scale", "unknown")
                .metric("missing_count", missing)
                .selector("missing")
                .affected(missing, Sample::empty());
        }

        let min = numeric.iter().copied().fold(f64::INFINITY, f64::min);
        let max = numeric.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let scale = ProbabilityScale::detect(max);
        let (lower, upper) = scale.bounds();

        let bad: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| matches!(v, Some(x) if *x < lower || *x > upper))
            .map(|(i, _)| i)
            .collect();

        CheckOutcome::new(
            bad.is_empty(),
            format!(
                "precip_prob must be within [{:.1}, {:.1}] based on detected scale {}.",
                lower,
                upper,
                scale.label()
            ),
        )
        .metric("scale", scale.label())
        .metric("min", min)
        .metric("max", max)
        .metric("bad_count", bad.len())
        .selector("out_of_range")
        .affected(bad.len(), Sample::rows(ctx.dataset, &bad))
    }
}

/// Fails for negative precipitation amounts. Non-numeric values are ignored.
pub struct PrecipMmNonnegative;

impl DataCheck for PrecipMmNonnegative {
    fn name(&self) -> &'static str {
        "precip_mm_nonnegative"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "precip_mm must be >= 0"
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> CheckOutcome {
        let negative = rows_where(ctx, "precip_mm", |v| v < 0.0);

        CheckOutcome::new(negative.is_empty(), "precip_mm must be >= 0.")
            .metric("negative_count", negative.len())
            .selector("negative_values")
            .affected(negative.len(), Sample::rows(ctx.dataset, &negative))
    }
}

/// Warns about temperatures outside [-60, 60] °C. Non-numeric values are
/// ignored.
pub struct TempReasonable;

impl DataCheck for TempReasonable {
    fn name(&self) -> &'static str {
        "temp_reasonable"
    }

    fn severity(&self) -> Severity {
        Severity::Warn
    }

    fn description(&self) -> &'static str {
        "temp_c outside [-60, 60] indicates possible outliers"
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> CheckOutcome {
        let outliers = rows_where(ctx, "temp_c", |v| !(TEMP_MIN_C..=TEMP_MAX_C).contains(&v));

        CheckOutcome::new(outliers.is_empty(), "temp_c outside [-60, 60] indicates possible outliers.")
            .metric("outlier_count", outliers.len())
            .selector("outliers")
            .affected(outliers.len(), Sample::rows(ctx.dataset, &outliers))
    }
}

/// Indices of rows whose numeric value in `column` satisfies `predicate`.
fn rows_where(ctx: &CheckContext<'_>, column: &str, predicate: impl Fn(f64) -> bool) -> Vec<usize> {
    ctx.dataset
        .numeric_column(column)
        .into_iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|x| predicate(*x)).map(|_| i))
        .collect()
}
