//! Artifact layout for one run date.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use crate::Settings;

/// Names of the four star-schema tables, in display order.
pub const STAR_TABLES: [&str; 4] = [
    "fact_forecast_hourly.csv",
    "fact_forecast_daily.csv",
    "dim_date.csv",
    "dim_location.csv",
];

/// Every path a run reads or writes, derived from settings and the run date.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    date: String,
    settings: Settings,
}

impl ArtifactPaths {
    pub fn new(settings: &Settings, run_date: NaiveDate) -> Self {
        ArtifactPaths {
            date: run_date.format("%Y-%m-%d").to_string(),
            settings: settings.clone(),
        }
    }

    pub fn run_date(&self) -> &str {
        &self.date
    }

    pub fn raw(&self) -> PathBuf {
        Path::new(&self.settings.data_raw_dir).join(format!("forecast_raw_{}.json", self.date))
    }

    /// Processed table `{name}_{date}.csv`
    pub fn processed(&self, name: &str) -> PathBuf {
        Path::new(&self.settings.data_processed_dir).join(format!("{}_{}.csv", name, self.date))
    }

    pub fn forecast_hourly(&self) -> PathBuf {
        self.processed("forecast_hourly")
    }

    pub fn star_dir(&self) -> PathBuf {
        Path::new(&self.settings.data_star_dir).join(&self.date)
    }

    pub fn validation(&self) -> PathBuf {
        Path::new(&self.settings.reports_validation_dir).join(format!("validation_{}.json", self.date))
    }

    pub fn exceptions(&self) -> PathBuf {
        Path::new(&self.settings.reports_exceptions_dir).join(format!("exceptions_{}.csv", self.date))
    }

    pub fn run_summary(&self) -> PathBuf {
        Path::new(&self.settings.reports_runs_dir).join(format!("run_{}.json", self.date))
    }

    pub fn run_report(&self, extension: &str) -> PathBuf {
        Path::new(&self.settings.reports_run_reports_dir)
            .join(format!("run_report_{}.{}", self.date, extension))
    }
}

/// Newest `YYYY-MM-DD` folder under the star root, if any.
pub fn latest_star_folder(star_root: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(star_root).ok()?;
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?;
            let date = NaiveDate::parse_from_str(name, "%Y-%m-%d").ok()?;
            Some((date, path))
        })
        .max_by_key(|(date, _)| *date)
        .map(|(_, path)| path)
}
