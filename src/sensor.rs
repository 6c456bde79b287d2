//! Climate sensors
//!
//! The dashboard shows an indoor reading (temperature, pressure, humidity) and an
//! optional outdoor temperature from a networked thermometer. Both are capabilities
//! chosen from configuration at start-up; a missing device is a `None`, never a
//! silent stand-in.

use crate::config::{SensorConfig, SensorKind};
use log::{debug, warn};
use std::time::Duration;
use thiserror::Error;

/// hPa → mmHg, as printed on the dashboard.
pub const HPA_TO_MMHG: f32 = 0.750_061_7;

#[derive(Error, Debug)]
pub enum SensorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unreadable reading {0:?}")]
    Parse(String),
}

/// One sample of the indoor climate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    pub temperature_c: f32,
    pub pressure_hpa: f32,
    pub humidity_pct: f32,
}

impl ClimateReading {
    pub fn pressure_mmhg(&self) -> i32 {
        (self.pressure_hpa * HPA_TO_MMHG) as i32
    }
}

/// Anything that can report the indoor climate.
pub trait ClimateSensor: Send {
    fn name(&self) -> &str;
    fn sample(&mut self) -> Result<ClimateReading, SensorError>;
}

/// Fixed plausible readings for development machines without a sensor.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedSensor;

impl ClimateSensor for SimulatedSensor {
    fn name(&self) -> &str {
        "simulated"
    }

    fn sample(&mut self) -> Result<ClimateReading, SensorError> {
        Ok(ClimateReading {
            temperature_c: 12.3,
            pressure_hpa: 990.0,
            humidity_pct: 45.0,
        })
    }
}

/// Indoor sensor selected by `[sensor] kind`.
pub fn build_sensor(config: &SensorConfig) -> Option<Box<dyn ClimateSensor>> {
    match config.kind {
        SensorKind::Simulated => Some(Box::new(SimulatedSensor)),
        SensorKind::None => None,
    }
}

/// Parse a thermometer response body such as `"21.5\n"`.
pub fn parse_temperature(body: &str) -> Result<f32, SensorError> {
    let text = body.trim();
    text.parse::<f32>()
        .ok()
        .filter(|t| t.is_finite())
        .ok_or_else(|| SensorError::Parse(text.to_string()))
}

/// Ask a networked thermometer for its current temperature.
///
/// The thermometer lives on the local network, so system proxies are bypassed.
pub async fn remote_temperature(url: &str, timeout: Duration) -> Result<f32, SensorError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .no_proxy()
        .build()?;
    let body = client.get(url).send().await?.error_for_status()?.text().await?;
    parse_temperature(&body)
}

/// Outdoor temperature if one is configured and answering; failures are logged.
pub async fn read_remote(config: &SensorConfig) -> Option<f32> {
    let url = config.remote_url.as_deref()?;
    match remote_temperature(url, Duration::from_secs(config.remote_timeout_secs)).await {
        Ok(t) => {
            debug!("Remote thermometer {}: {:.1}", url, t);
            Some(t)
        }
        Err(e) => {
            warn!("Remote thermometer {} unavailable: {}", url, e);
            None
        }
    }
}
