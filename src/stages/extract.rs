//! Extract stage: fetch the hourly forecast and persist the raw payload.

use chrono::NaiveDate;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use crate::engine::pipeline::{PipelineStage, StageOutput};
use crate::paths::ArtifactPaths;
use crate::{storage, RainAlertError, Result, Settings};

/// Hourly variables requested from the forecast API.
pub const HOURLY_FIELDS: [&str; 4] = [
    "precipitation_probability",
    "precipitation",
    "temperature_2m",
    "wind_speed_10m",
];

/// Anything that can produce a raw forecast payload.
pub trait ForecastSource: Send + Sync {
    fn fetch(&self, settings: &Settings) -> Result<Value>;
}

/// Open-Meteo forecast API client.
#[derive(Debug, Clone, Default)]
pub struct OpenMeteoClient;

impl OpenMeteoClient {
    pub fn new() -> Self {
        OpenMeteoClient
    }

    /// Query parameters for one location and horizon.
    pub fn query_params(settings: &Settings) -> Vec<(&'static str, String)> {
        vec![
            ("latitude", settings.latitude.to_string()),
            ("longitude", settings.longitude.to_string()),
            ("hourly", HOURLY_FIELDS.join(",")),
            ("forecast_hours", settings.horizon_hours.to_string()),
            ("timezone", "UTC".to_string()),
        ]
    }
}

impl ForecastSource for OpenMeteoClient {
    fn fetch(&self, settings: &Settings) -> Result<Value> {
        let params = Self::query_params(settings);
        info!(url = %settings.api_url, params = ?params, "request_start");

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| RainAlertError::Fetch {
                message: e.to_string(),
            })?;

        let response = client
            .get(&settings.api_url)
            .query(&params)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                error!(error = %e, "request_failed");
                RainAlertError::Fetch {
                    message: e.to_string(),
                }
            })?;

        response.json::<Value>().map_err(|e| RainAlertError::Parse {
            context: "forecast response".to_string(),
            message: e.to_string(),
        })
    }
}

/// Fetch the forecast and write `forecast_raw_{date}.json`.
pub fn extract_forecast(run_date: NaiveDate, settings: &Settings, source: &dyn ForecastSource) -> Result<PathBuf> {
    let payload = source.fetch(settings)?;
    let output_path = ArtifactPaths::new(settings, run_date).raw();
    storage::write_json(&output_path, &payload)?;
    info!(output_path = %output_path.display(), "request_success");
    Ok(output_path)
}

/// Pipeline stage wrapping a [`ForecastSource`].
pub struct ExtractStage {
    source: Box<dyn ForecastSource>,
}

impl ExtractStage {
    pub fn new(source: Box<dyn ForecastSource>) -> Self {
        ExtractStage { source }
    }
}

impl PipelineStage for ExtractStage {
    fn run(&self, run_date: NaiveDate, settings: &Settings) -> Result<StageOutput> {
        let raw_path = extract_forecast(run_date, settings, self.source.as_ref())?;
        Ok(StageOutput::from_paths([("raw_path", raw_path)]))
    }
}
