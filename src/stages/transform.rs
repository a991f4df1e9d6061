//! Transform stage: reshape the raw payload into reporting tables and a star
//! schema.
//!
//! Outputs for a run date `D`:
//! - `{processed}/forecast_hourly_D.csv`, `dim_date_D.csv`,
//!   `dim_location_D.csv`, `forecast_summary_D.csv`
//! - `{star}/D/fact_forecast_hourly.csv`, `dim_date.csv`, `dim_location.csv`,
//!   `fact_forecast_daily.csv`

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::info;

use crate::dataset::{as_number, Dataset};
use crate::engine::pipeline::{PipelineStage, StageOutput};
use crate::paths::ArtifactPaths;
use crate::time::{parse_utc_timestamp, TIMESTAMP_FORMAT};
use crate::{storage, RainAlertError, Result, Settings};

pub const ROOT_KEYS: [&str; 4] = ["latitude", "longitude", "timezone", "hourly"];

pub const HOURLY_KEYS: [&str; 5] = [
    "time",
    "precipitation_probability",
    "precipitation",
    "temperature_2m",
    "wind_speed_10m",
];

pub const HOURLY_COLUMNS: [&str; 11] = [
    "run_date",
    "timestamp_utc",
    "location_id",
    "precip_prob",
    "precip_mm",
    "temp_c",
    "wind_kph",
    "latitude",
    "longitude",
    "timezone",
    "date_id",
];

/// Hourly columns left out of the star fact table.
const FACT_DROPPED_COLUMNS: [&str; 4] = ["run_date", "latitude", "longitude", "timezone"];

/// Tables derived from one raw payload.
#[derive(Debug, Clone)]
pub struct ForecastTables {
    pub hourly: Dataset,
    pub dim_date: Dataset,
    pub dim_location: Dataset,
    pub summary: Dataset,
}

impl ForecastTables {
    /// Hourly fact for the star schema.
    pub fn fact_hourly(&self) -> Dataset {
        self.hourly.drop_columns(&FACT_DROPPED_COLUMNS)
    }
}

fn require_keys<'a>(payload: &'a Value, keys: &[&str], context: &str) -> Result<&'a Map<String, Value>> {
    let empty = Map::new();
    let object = payload.as_object();
    let missing: Vec<String> = keys
        .iter()
        .filter(|k| !object.unwrap_or(&empty).contains_key(**k))
        .map(|k| k.to_string())
        .collect();

    match object {
        Some(object) if missing.is_empty() => Ok(object),
        _ => Err(RainAlertError::Schema {
            context: context.to_string(),
            missing,
        }),
    }
}

fn coordinate(root: &Map<String, Value>, key: &str) -> Result<f64> {
    root.get(key).and_then(as_number).ok_or_else(|| RainAlertError::Parse {
        context: key.to_string(),
        message: format!("expected a number, got {}", root.get(key).unwrap_or(&Value::Null)),
    })
}

fn hourly_array<'a>(hourly: &'a Map<String, Value>, key: &str) -> Result<&'a Vec<Value>> {
    hourly
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| RainAlertError::Parse {
            context: format!("hourly.{}", key),
            message: "expected an array".to_string(),
        })
}

fn text_columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|c| c.to_string()).collect()
}

/// Build every table from a raw payload.
pub fn build_tables(payload: &Value, run_date: NaiveDate, settings: &Settings) -> Result<ForecastTables> {
    let root = require_keys(payload, &ROOT_KEYS, "root")?;
    let hourly = require_keys(&root["hourly"], &HOURLY_KEYS, "hourly")?;

    let latitude = coordinate(root, "latitude")?;
    let longitude = coordinate(root, "longitude")?;
    let timezone = match &root["timezone"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let location_id = settings.location_id(latitude, longitude);

    let times = hourly_array(hourly, "time")?;
    let series: Vec<&Vec<Value>> = HOURLY_KEYS[1..]
        .iter()
        .map(|key| hourly_array(hourly, key))
        .collect::<Result<_>>()?;
    if let Some(short) = series.iter().position(|s| s.len() != times.len()) {
        return Err(RainAlertError::Parse {
            context: format!("hourly.{}", HOURLY_KEYS[short + 1]),
            message: format!("expected {} values to match hourly.time", times.len()),
        });
    }

    let timestamps: Vec<DateTime<Utc>> = times
        .iter()
        .map(|t| {
            t.as_str().and_then(parse_utc_timestamp).ok_or_else(|| RainAlertError::Parse {
                context: "hourly.time".to_string(),
                message: format!("unparseable timestamp {}", t),
            })
        })
        .collect::<Result<_>>()?;

    let run_date_text = run_date.format("%Y-%m-%d").to_string();
    let rows: Vec<Vec<Value>> = timestamps
        .iter()
        .enumerate()
        .map(|(i, ts)| {
            vec![
                Value::from(run_date_text.clone()),
                Value::from(ts.format(TIMESTAMP_FORMAT).to_string()),
                Value::from(location_id.clone()),
                series[0][i].clone(),
                series[1][i].clone(),
                series[2][i].clone(),
                series[3][i].clone(),
                Value::from(latitude),
                Value::from(longitude),
                Value::from(timezone.clone()),
                Value::from(ts.date_naive().format("%Y-%m-%d").to_string()),
            ]
        })
        .collect();
    let hourly_table = Dataset::new(text_columns(&HOURLY_COLUMNS), rows);

    let dim_location = Dataset::new(
        text_columns(&["location_id", "city", "latitude", "longitude", "timezone"]),
        vec![vec![
            Value::from(location_id),
            Value::from(settings.city.clone()),
            Value::from(latitude),
            Value::from(longitude),
            Value::from(timezone),
        ]],
    );

    Ok(ForecastTables {
        dim_date: build_dim_date(&timestamps),
        summary: build_summary(&timestamps, &series),
        hourly: hourly_table,
        dim_location,
    })
}

/// One row per distinct UTC date, sorted. `day_of_week` counts from Monday = 0.
fn build_dim_date(timestamps: &[DateTime<Utc>]) -> Dataset {
    let dates: BTreeSet<NaiveDate> = timestamps.iter().map(|ts| ts.date_naive()).collect();
    let rows = dates
        .into_iter()
        .map(|date| {
            let text = date.format("%Y-%m-%d").to_string();
            vec![
                Value::from(text.clone()),
                Value::from(text),
                Value::from(date.year()),
                Value::from(date.month()),
                Value::from(date.day()),
                Value::from(date.weekday().num_days_from_monday()),
            ]
        })
        .collect();
    Dataset::new(
        text_columns(&["date_id", "date", "year", "month", "day", "day_of_week"]),
        rows,
    )
}

#[derive(Default)]
struct DailyAggregate {
    precip_mm_total: f64,
    precip_prob_max: Option<(f64, Value)>,
    temp_sum: f64,
    temp_count: usize,
    wind_sum: f64,
    wind_count: usize,
}

fn mean(sum: f64, count: usize) -> Value {
    if count == 0 {
        Value::Null
    } else {
        Value::from(sum / count as f64)
    }
}

/// Daily totals, maxima and means. Non-numeric cells are skipped.
fn build_summary(timestamps: &[DateTime<Utc>], series: &[&Vec<Value>]) -> Dataset {
    let mut days: BTreeMap<NaiveDate, DailyAggregate> = BTreeMap::new();

    for (i, ts) in timestamps.iter().enumerate() {
        let day = days.entry(ts.date_naive()).or_default();
        if let Some(prob) = as_number(&series[0][i]) {
            if day.precip_prob_max.as_ref().map_or(true, |(max, _)| prob > *max) {
                day.precip_prob_max = Some((prob, series[0][i].clone()));
            }
        }
        if let Some(mm) = as_number(&series[1][i]) {
            day.precip_mm_total += mm;
        }
        if let Some(temp) = as_number(&series[2][i]) {
            day.temp_sum += temp;
            day.temp_count += 1;
        }
        if let Some(wind) = as_number(&series[3][i]) {
            day.wind_sum += wind;
            day.wind_count += 1;
        }
    }

    let rows = days
        .into_iter()
        .map(|(date, day)| {
            vec![
                Value::from(date.format("%Y-%m-%d").to_string()),
                Value::from(day.precip_mm_total),
                day.precip_prob_max.map(|(_, v)| v).unwrap_or(Value::Null),
                mean(day.temp_sum, day.temp_count),
                mean(day.wind_sum, day.wind_count),
            ]
        })
        .collect();
    Dataset::new(
        text_columns(&[
            "date",
            "precip_mm_total",
            "precip_prob_max",
            "temp_c_mean",
            "wind_kph_mean",
        ]),
        rows,
    )
}

/// Read the raw payload for `run_date` and write all tables. Returns the
/// written paths keyed by output name.
pub fn transform_forecast(run_date: NaiveDate, settings: &Settings) -> Result<BTreeMap<String, PathBuf>> {
    let paths = ArtifactPaths::new(settings, run_date);
    let input_path = paths.raw();
    info!(input_path = %input_path.display(), "transform_input");

    if !input_path.exists() {
        return Err(RainAlertError::InputMissing {
            what: "Raw input".to_string(),
            path: input_path,
        });
    }

    let payload = storage::read_json(&input_path)?;
    let tables = build_tables(&payload, run_date, settings)?;
    let fact_hourly = tables.fact_hourly();
    let star_dir = paths.star_dir();

    let written: [(&str, PathBuf, &Dataset); 8] = [
        ("forecast_hourly", paths.forecast_hourly(), &tables.hourly),
        ("dim_date", paths.processed("dim_date"), &tables.dim_date),
        ("dim_location", paths.processed("dim_location"), &tables.dim_location),
        ("forecast_summary", paths.processed("forecast_summary"), &tables.summary),
        ("star_fact_forecast_hourly", star_dir.join("fact_forecast_hourly.csv"), &fact_hourly),
        ("star_dim_date", star_dir.join("dim_date.csv"), &tables.dim_date),
        ("star_dim_location", star_dir.join("dim_location.csv"), &tables.dim_location),
        ("star_fact_forecast_daily", star_dir.join("fact_forecast_daily.csv"), &tables.summary),
    ];

    let mut outputs = BTreeMap::new();
    for (name, path, table) in written {
        storage::write_dataset_csv(&path, table)?;
        outputs.insert(name.to_string(), path);
    }

    info!(
        star_dir = %star_dir.display(),
        fact_forecast_hourly = fact_hourly.row_count(),
        dim_date = tables.dim_date.row_count(),
        dim_location = tables.dim_location.row_count(),
        fact_forecast_daily = tables.summary.row_count(),
        "star_schema_written"
    );
    info!(row_count = tables.hourly.row_count(), outputs = outputs.len(), "transform_success");

    Ok(outputs)
}

/// Pipeline stage running [`transform_forecast`].
pub struct TransformStage;

impl PipelineStage for TransformStage {
    fn run(&self, run_date: NaiveDate, settings: &Settings) -> Result<StageOutput> {
        Ok(StageOutput::from_paths(transform_forecast(run_date, settings)?))
    }
}
