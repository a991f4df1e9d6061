//! Payload builders and temporary settings.

use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use rain_alert::Settings;

pub fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

/// Settings with every directory under `dir`.
pub fn settings_in(dir: &Path) -> Settings {
    let sub = |name: &str| dir.join(name).display().to_string();
    Settings {
        data_raw_dir: sub("data/raw"),
        data_processed_dir: sub("data/processed"),
        data_star_dir: sub("data/star"),
        reports_validation_dir: sub("reports/validation"),
        reports_exceptions_dir: sub("reports/exceptions"),
        reports_runs_dir: sub("reports/runs"),
        reports_run_reports_dir: sub("reports/run_reports"),
        ..Default::default()
    }
}

/// Write `settings` as a JSON config file for the binary.
pub fn write_config(dir: &Path, settings: &Settings) -> PathBuf {
    let path = dir.join("config.json");
    std::fs::write(&path, serde_json::to_string_pretty(settings).unwrap()).unwrap();
    path
}

/// Minute-precision timestamps as the forecast API returns them.
pub fn api_times(hours: usize) -> Vec<String> {
    let start = run_date().and_hms_opt(0, 0, 0).unwrap();
    (0..hours)
        .map(|h| (start + Duration::hours(h as i64)).format("%Y-%m-%dT%H:%M").to_string())
        .collect()
}

/// A clean payload with `hours` hourly entries, probabilities in percent.
pub fn forecast_payload(hours: usize) -> Value {
    payload_with_times(api_times(hours))
}

/// A payload over the given timestamps, other arrays derived from position.
pub fn payload_with_times(times: Vec<String>) -> Value {
    let n = times.len();
    json!({
        "latitude": 45.5017,
        "longitude": -73.5673,
        "timezone": "GMT",
        "hourly": {
            "time": times,
            "precipitation_probability": (0..n).map(|i| (i * 13 % 100) as i64).collect::<Vec<_>>(),
            "precipitation": (0..n).map(|i| 0.1 * (i % 4) as f64).collect::<Vec<_>>(),
            "temperature_2m": (0..n).map(|i| 12.0 + (i % 8) as f64).collect::<Vec<_>>(),
            "wind_speed_10m": (0..n).map(|i| 5.0 + (i % 5) as f64).collect::<Vec<_>>(),
        }
    })
}

/// 48 hours where hour 10 appears twice in place of hour 47.
pub fn payload_with_duplicate() -> Value {
    let mut times = api_times(47);
    let repeated = times[10].clone();
    times.insert(11, repeated);
    payload_with_times(times)
}

pub fn write_raw(settings: &Settings, payload: &Value) -> PathBuf {
    let path = Path::new(&settings.data_raw_dir).join("forecast_raw_2024-06-01.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, serde_json::to_string_pretty(payload).unwrap()).unwrap();
    path
}

/// The validation report with the volatile timestamp removed.
pub fn stable_validation(path: &Path) -> Value {
    let mut value: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    value.as_object_mut().unwrap().remove("generated_at_utc");
    value
}
