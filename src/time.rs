//! Date and timestamp helpers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Format of `timestamp_utc` cells in processed tables.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Parse a `YYYY-MM-DD` run date.
pub fn parse_run_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
}

pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// RFC 3339 rendering with second precision and a `Z` suffix.
pub fn to_iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a UTC timestamp in any of the shapes the pipeline produces or
/// receives: RFC 3339 with offset, `...Z` with seconds, or the minute-precision
/// naive form the forecast API returns (interpreted as UTC).
pub fn parse_utc_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}
