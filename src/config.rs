//! Run configuration.
//!
//! Uses `figment` for layered configuration: defaults -> JSON config file ->
//! `RAIN_ALERT_` environment variables.

use figment::{
    providers::{Env, Format, Json, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors raised while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Directories, location and validation parameters for a run.
///
/// Only `horizon_hours` affects validation; everything else configures the
/// collaborators (fetch, reshaping, persistence).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub data_raw_dir: String,
    pub data_processed_dir: String,
    pub data_star_dir: String,
    pub reports_validation_dir: String,
    pub reports_exceptions_dir: String,
    pub reports_runs_dir: String,
    pub reports_run_reports_dir: String,

    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    /// Prefix of the derived `location_id`
    pub location_slug: String,

    /// Maximum span of timestamps, in hours, from the earliest one present
    pub horizon_hours: u32,

    pub api_url: String,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_raw_dir: "data/raw".to_string(),
            data_processed_dir: "data/processed".to_string(),
            data_star_dir: "data/star".to_string(),
            reports_validation_dir: "reports/validation".to_string(),
            reports_exceptions_dir: "reports/exceptions".to_string(),
            reports_runs_dir: "reports/runs".to_string(),
            reports_run_reports_dir: "reports/run_reports".to_string(),
            latitude: 45.5017,
            longitude: -73.5673,
            city: "Montreal".to_string(),
            location_slug: "mtl".to_string(),
            horizon_hours: 48,
            api_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Load settings, layering an optional JSON file and the environment over
    /// the defaults.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.display().to_string()));
            }
            figment = figment.merge(Json::file(path));
        }

        figment = figment.merge(Env::prefixed("RAIN_ALERT_"));

        let settings: Settings = figment.extract().map_err(Box::new)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would make a run meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon_hours == 0 {
            return Err(ConfigError::Invalid("horizon_hours must be at least 1".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ConfigError::Invalid(format!(
                "coordinates out of range: ({}, {})",
                self.latitude, self.longitude
            )));
        }
        Ok(())
    }

    /// Deterministic location key, coordinates rounded to 4 decimal places.
    pub fn location_id(&self, latitude: f64, longitude: f64) -> String {
        format!("{}_{:.4}_{:.4}", self.location_slug, latitude, longitude)
    }
}
