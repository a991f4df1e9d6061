//! Forecast sources standing in for the HTTP client.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rain_alert::stages::ForecastSource;
use rain_alert::{RainAlertError, Result, Settings};
use serde_json::Value;

/// Returns the same payload on every fetch and counts the calls.
#[derive(Clone)]
pub struct StaticForecastSource {
    payload: Value,
    calls: Arc<AtomicUsize>,
}

impl StaticForecastSource {
    pub fn new(payload: Value) -> Self {
        StaticForecastSource {
            payload,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ForecastSource for StaticForecastSource {
    fn fetch(&self, _settings: &Settings) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.payload.clone())
    }
}

/// Simulates an unreachable forecast API.
pub struct FailingSource;

impl ForecastSource for FailingSource {
    fn fetch(&self, _settings: &Settings) -> Result<Value> {
        Err(RainAlertError::Fetch {
            message: "connection refused".to_string(),
        })
    }
}
