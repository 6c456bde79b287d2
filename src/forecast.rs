//! # OpenWeatherMap Forecast Fetching and Caching
//!
//! This module handles all network operations for obtaining the current conditions
//! and the 3-hourly forecast from OpenWeatherMap. It includes caching to minimize
//! network requests and an offline mode that reads saved responses from disk.
//!
//! ## Data Source
//!
//! ### OpenWeatherMap 2.5 API
//! - **Current weather**: `{base_url}/weather` → sunrise, sunset, humidity, pressure
//! - **Forecast**: `{base_url}/forecast` → 40 points, one every 3 hours
//! - **Query**: `APPID`, `units`, `lat`, `lon`, `lang`
//! - **Times**: Unix seconds (UTC) plus a `timezone` offset in seconds
//!
//! ### Data Processing Pipeline
//! 1. **Cache**: return the saved snapshot if its file is younger than the TTL
//! 2. **Fetch**: two HTTP GET requests (or two JSON files in offline mode)
//! 3. **Decode**: keep only the fields the strip and dashboard use
//! 4. **Resolve**: condition codes → render attributes, UTC → local time
//! 5. **Cache**: store the snapshot for the next cycle (failures are non-fatal)
//!
//! All errors propagate through [`ForecastError`]; the caller falls back to
//! [`crate::fallback::approximate`] so the dashboard keeps running offline.

use crate::config::Config;
use crate::{
    minute_of_day, AstronomicalContext, ConditionCodeSet, CurrentConditions, ForecastPoint,
    ForecastSnapshot, Timeline,
};
use chrono::{DateTime, FixedOffset, Utc};
use log::{debug, info, warn};
use serde::Deserialize;
use std::path::Path;
use std::time::{Duration, SystemTime};
use std::{fs, io};
use thiserror::Error;

/// hPa → mmHg.
const HPA_TO_MMHG: f64 = 0.750_061_575_845_66;

/// File names used by the offline mode.
pub const CURRENT_FILE: &str = "weather_query.json";
pub const FORECAST_FILE: &str = "forecast_query.json";

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while fetching and decoding forecast data.
#[derive(Error, Debug)]
pub enum ForecastError {
    /// HTTP request failed (network, server, or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response or offline file is not the expected JSON document
    #[error("JSON decode: {0}")]
    Json(#[from] serde_json::Error),

    /// Cache or offline file operations failed
    #[error("cache IO: {0}")]
    Cache(#[from] io::Error),

    #[error("no OpenWeatherMap API key configured")]
    MissingApiKey,

    /// UTC offset outside ±24 h
    #[error("invalid timezone offset {0}s")]
    InvalidTimezone(i32),

    #[error("invalid timestamp {0}")]
    InvalidTimestamp(i64),
}

// -- Provider documents (only the fields we use) --

#[derive(Debug, Deserialize)]
pub struct CurrentDocument {
    pub dt: i64,
    #[serde(default)]
    pub timezone: i32,
    pub sys: SunTimes,
    pub main: CurrentMain,
}

#[derive(Debug, Deserialize)]
pub struct SunTimes {
    pub sunrise: i64,
    pub sunset: i64,
}

#[derive(Debug, Deserialize)]
pub struct CurrentMain {
    pub humidity: f32,
    pub pressure: f64,
}

#[derive(Debug, Deserialize)]
pub struct ForecastDocument {
    pub city: City,
    pub list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
pub struct City {
    #[serde(default)]
    pub timezone: i32,
}

#[derive(Debug, Deserialize)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: EntryMain,
    #[serde(default)]
    pub weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
pub struct EntryMain {
    pub temp: f32,
}

#[derive(Debug, Deserialize)]
pub struct Condition {
    pub id: u32,
}

/// Fetch the current snapshot from the offline directory, the cache, or the network.
///
/// # Example
/// ```no_run
/// use weather_strip_lib::{config::Config, fallback, forecast};
///
/// # async fn run() {
/// let config = Config::load();
/// let snapshot = match forecast::fetch(&config).await {
///     Ok(snapshot) => snapshot,
///     Err(err) => {
///         eprintln!("Failed to fetch forecast: {}", err);
///         fallback::approximate(&config, chrono::Local::now().fixed_offset())
///     }
/// };
/// # }
/// ```
pub async fn fetch(config: &Config) -> Result<ForecastSnapshot, ForecastError> {
    let weather = &config.weather;

    if let Some(dir) = &weather.offline_dir {
        info!("Reading forecast from {}", dir.display());
        let (current, forecast) = read_offline(dir)?;
        return build_snapshot(&current, &forecast, config);
    }

    // Try cache first
    if let Ok(snapshot) = load_cache(&weather.cache_path, weather.cache_ttl_minutes * 60) {
        debug!("Using cached forecast from {}", snapshot.fetched_at);
        return Ok(snapshot);
    }

    let (current, forecast) = query(config).await?;
    let snapshot = build_snapshot(&current, &forecast, config)?;

    // Save for the next cycle (ignore cache write failures)
    if let Err(e) = save_cache(&weather.cache_path, &snapshot) {
        warn!("Could not write forecast cache: {}", e);
    }
    Ok(snapshot)
}

// -- Private Implementation --

async fn query(config: &Config) -> Result<(CurrentDocument, ForecastDocument), ForecastError> {
    let weather = &config.weather;
    if weather.api_key.is_empty() {
        return Err(ForecastError::MissingApiKey);
    }

    let params = [
        ("APPID", weather.api_key.clone()),
        ("units", weather.units.as_str().to_string()),
        ("lat", config.location.latitude.to_string()),
        ("lon", config.location.longitude.to_string()),
        ("lang", weather.lang.clone()),
    ];
    let base = weather.base_url.trim_end_matches('/');
    let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;

    info!("Fetching forecast for {}", config.location.label);
    let current = client
        .get(format!("{}/weather", base))
        .query(&params)
        .send()
        .await?
        .error_for_status()?
        .json::<CurrentDocument>()
        .await?;
    let forecast = client
        .get(format!("{}/forecast", base))
        .query(&params)
        .send()
        .await?
        .error_for_status()?
        .json::<ForecastDocument>()
        .await?;
    Ok((current, forecast))
}

fn read_offline(dir: &Path) -> Result<(CurrentDocument, ForecastDocument), ForecastError> {
    let current = serde_json::from_slice(&fs::read(dir.join(CURRENT_FILE))?)?;
    let forecast = serde_json::from_slice(&fs::read(dir.join(FORECAST_FILE))?)?;
    Ok((current, forecast))
}

fn local_time(epoch: i64, offset: FixedOffset) -> Result<DateTime<FixedOffset>, ForecastError> {
    DateTime::<Utc>::from_timestamp(epoch, 0)
        .map(|utc| utc.with_timezone(&offset))
        .ok_or(ForecastError::InvalidTimestamp(epoch))
}

fn offset(seconds: i32) -> Result<FixedOffset, ForecastError> {
    FixedOffset::east_opt(seconds).ok_or(ForecastError::InvalidTimezone(seconds))
}

/// Combine the two provider documents into a snapshot.
pub fn build_snapshot(
    current: &CurrentDocument,
    forecast: &ForecastDocument,
    config: &Config,
) -> Result<ForecastSnapshot, ForecastError> {
    let here = offset(current.timezone)?;
    let sunrise = local_time(current.sys.sunrise, here)?;
    let sunset = local_time(current.sys.sunset, here)?;

    let city = offset(forecast.city.timezone)?;
    let mut timeline = Timeline::new(config.strip.slots);
    for entry in &forecast.list {
        let codes: ConditionCodeSet = entry.weather.iter().map(|c| c.id).collect();
        let point = ForecastPoint::new(local_time(entry.dt, city)?, entry.main.temp, codes);
        if !timeline.push(point) {
            break;
        }
    }

    let snapshot = ForecastSnapshot {
        timeline,
        astro: AstronomicalContext {
            sunrise_minute: minute_of_day(&sunrise),
            sunset_minute: minute_of_day(&sunset),
            latitude: config.location.latitude,
            longitude: config.location.longitude,
        },
        current: Some(CurrentConditions {
            humidity_pct: current.main.humidity,
            pressure_mmhg: (current.main.pressure * HPA_TO_MMHG) as i32,
        }),
        fetched_at: local_time(current.dt, here)?,
        offline: false,
    };
    info!(
        "Forecast: {} points, sunrise {}, sunset {}",
        snapshot.timeline.len(),
        sunrise.format("%H:%M"),
        sunset.format("%H:%M")
    );
    Ok(snapshot)
}

/// Load the snapshot from the cache file if it is still valid.
///
/// Checks file modification time against `ttl_secs` before deserializing.
fn load_cache(path: &Path, ttl_secs: u64) -> Result<ForecastSnapshot, io::Error> {
    let meta = fs::metadata(path)?;

    let age = SystemTime::now()
        .duration_since(meta.modified()?)
        .map_err(|_| io::Error::other("time error"))?
        .as_secs();

    if age > ttl_secs {
        return Err(io::Error::other("stale"));
    }

    let data = fs::read(path)?;
    let snapshot = serde_json::from_slice(&data)?;
    Ok(snapshot)
}

fn save_cache(path: &Path, snapshot: &ForecastSnapshot) -> Result<(), io::Error> {
    let data = serde_json::to_vec(snapshot)?;
    fs::write(path, data)?;
    Ok(())
}
