//! Run report and star-schema lookup.
//!
//! A run report condenses one run date into a markdown page and a one-row CSV:
//! validation verdict, peak precipitation probability, total precipitation,
//! the first high-risk hour, and where the artifacts live.

use chrono::NaiveDate;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::dataset::{cell_text, Dataset};
use crate::paths::{latest_star_folder, ArtifactPaths, STAR_TABLES};
use crate::{storage, RainAlertError, Result, Settings};

/// Placeholder when no hour is flagged `High`.
pub const NO_HIGH_RISK: &str = "N A";

/// Placeholder for an absent exceptions file.
pub const NOT_FOUND: &str = "not_found";

pub const RUN_REPORT_COLUMNS: [&str; 8] = [
    "run_date",
    "validation_status",
    "max_precip_prob",
    "total_precip_mm",
    "first_high_risk_timestamp",
    "hourly_fact_path",
    "validation_path",
    "exceptions_path",
];

/// Inputs a run report cannot be built without.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingInputs(pub Vec<PathBuf>);

impl fmt::Display for MissingInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Missing required input(s):")?;
        for (i, path) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "- {}", path.display())?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("{0}")]
    MissingInputs(MissingInputs),

    #[error(transparent)]
    Read(#[from] RainAlertError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub run_date: String,
    pub validation_status: String,
    pub max_precip_prob: Option<f64>,
    pub total_precip_mm: Option<f64>,
    pub first_high_risk_timestamp: String,
    pub hourly_fact_path: PathBuf,
    pub validation_path: PathBuf,
    /// `None` when the exceptions file does not exist
    pub exceptions_path: Option<PathBuf>,
}

fn display_number(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{:.1}", v),
        Some(v) => v.to_string(),
        None => "nan".to_string(),
    }
}

/// First timestamp whose `risk_level` is `High`; `High` if the table has no
/// timestamp column.
fn first_high_risk(hourly: &Dataset) -> String {
    let Some(levels) = hourly.column("risk_level") else {
        return NO_HIGH_RISK.to_string();
    };
    let Some(row) = levels.iter().position(|v| cell_text(v).trim() == "High") else {
        return NO_HIGH_RISK.to_string();
    };
    match hourly.cell(row, "timestamp_utc") {
        Some(ts) => cell_text(ts),
        None => "High".to_string(),
    }
}

impl RunReport {
    /// Build from the star hourly fact and the validation report.
    pub fn build(settings: &Settings, run_date: NaiveDate) -> std::result::Result<Self, ReportError> {
        let paths = ArtifactPaths::new(settings, run_date);
        let hourly_path = paths.star_dir().join("fact_forecast_hourly.csv");
        let validation_path = paths.validation();
        let exceptions_path = paths.exceptions();

        let missing: Vec<PathBuf> = [&hourly_path, &validation_path]
            .into_iter()
            .filter(|p| !p.exists())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ReportError::MissingInputs(MissingInputs(missing)));
        }

        let hourly = Dataset::from_csv_path(&hourly_path)?;
        let validation = storage::read_json(&validation_path)?;

        let column_stat = |name: &str, fold: fn(f64, f64) -> f64| -> Option<f64> {
            if !hourly.has_column(name) {
                return None;
            }
            hourly.numeric_column(name).into_iter().flatten().reduce(fold)
        };

        Ok(RunReport {
            run_date: paths.run_date().to_string(),
            validation_status: validation
                .get("status")
                .and_then(|s| s.as_str())
                .unwrap_or("unknown")
                .to_string(),
            max_precip_prob: column_stat("precip_prob", f64::max),
            total_precip_mm: if hourly.has_column("precip_mm") {
                Some(column_stat("precip_mm", |a, b| a + b).unwrap_or(0.0))
            } else {
                None
            },
            first_high_risk_timestamp: first_high_risk(&hourly),
            hourly_fact_path: hourly_path,
            validation_path,
            exceptions_path: exceptions_path.exists().then_some(exceptions_path),
        })
    }

    fn exceptions_display(&self) -> String {
        self.exceptions_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| NOT_FOUND.to_string())
    }

    pub fn to_markdown(&self) -> String {
        [
            format!("# Run Report {}", self.run_date),
            String::new(),
            format!("- run_date: {}", self.run_date),
            format!("- validation_status: {}", self.validation_status),
            format!("- max_precip_prob: {}", display_number(self.max_precip_prob)),
            format!("- total_precip_mm: {}", display_number(self.total_precip_mm)),
            format!("- first_high_risk_timestamp: {}", self.first_high_risk_timestamp),
            String::new(),
            "Artifacts:".to_string(),
            format!("- hourly_fact: {}", self.hourly_fact_path.display()),
            format!("- validation: {}", self.validation_path.display()),
            format!("- exceptions: {}", self.exceptions_display()),
            String::new(),
        ]
        .join("\n")
    }

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.run_date.clone(),
            self.validation_status.clone(),
            display_number(self.max_precip_prob),
            display_number(self.total_precip_mm),
            self.first_high_risk_timestamp.clone(),
            self.hourly_fact_path.display().to_string(),
            self.validation_path.display().to_string(),
            self.exceptions_display(),
        ]
    }

    /// Write `run_report_{date}.md` and `.csv`; returns both paths.
    pub fn write(&self, settings: &Settings) -> Result<(PathBuf, PathBuf)> {
        let date = NaiveDate::parse_from_str(&self.run_date, "%Y-%m-%d").map_err(|e| {
            RainAlertError::Parse {
                context: "run_date".to_string(),
                message: e.to_string(),
            }
        })?;
        let paths = ArtifactPaths::new(settings, date);
        let md_path = paths.run_report("md");
        let csv_path = paths.run_report("csv");

        storage::write_text(&md_path, &self.to_markdown())?;
        storage::write_csv(&csv_path, &RUN_REPORT_COLUMNS, &[self.csv_row()])?;
        Ok((md_path, csv_path))
    }
}

/// Newest star folder and its four tables.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestStar {
    pub folder: PathBuf,
    pub files: Vec<PathBuf>,
}

pub fn latest_star(star_root: &Path) -> Option<LatestStar> {
    let folder = latest_star_folder(star_root)?;
    let files = STAR_TABLES.iter().map(|name| folder.join(name)).collect();
    Some(LatestStar { folder, files })
}

impl fmt::Display for LatestStar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "latest_star_folder: {}", self.folder.display())?;
        for file in &self.files {
            write!(f, "\n{}", file.display())?;
        }
        Ok(())
    }
}
