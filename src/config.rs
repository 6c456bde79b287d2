//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the weather-config.toml
//! file. It provides a centralized way to configure the observer location, the
//! forecast provider, the display backend, the strip geometry and the sensors.
//!
//! Every section has defaults, so a file only needs the keys it changes:
//!
//! ```toml
//! [location]
//! latitude = 49.84
//! longitude = 24.03
//! label = "Lviv"
//!
//! [weather]
//! api_key = "0123456789abcdef"
//!
//! [display]
//! backend = "epd"
//! ```

use crate::renderer::StripLayout;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "weather-config.toml";

/// Application configuration loaded from weather-config.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Observer position, used for the forecast query and the moon phase
    pub location: LocationConfig,
    /// OpenWeatherMap access and caching
    pub weather: WeatherConfig,
    /// Output device and frame size
    pub display: DisplayConfig,
    /// Forecast strip geometry
    pub strip: StripLayout,
    /// Indoor and remote thermometers
    pub sensor: SensorConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Degrees north
    pub latitude: f64,
    /// Degrees east
    pub longitude: f64,
    /// Human-readable place name for log output
    pub label: String,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: 50.24,
            longitude: 24.14,
            label: "Sokal".to_string(),
        }
    }
}

/// Temperature units requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// OpenWeatherMap application key
    pub api_key: String,
    pub units: Units,
    /// Language of the provider's condition descriptions
    pub lang: String,
    /// API root; `weather` and `forecast` are appended
    pub base_url: String,
    /// Snapshot cache (cleared on reboot when kept under /tmp)
    pub cache_path: PathBuf,
    pub cache_ttl_minutes: u64,
    /// Read `weather_query.json` and `forecast_query.json` from here instead of the network
    pub offline_dir: Option<PathBuf>,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            units: Units::Metric,
            lang: "ua".to_string(),
            base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            cache_path: PathBuf::from("/tmp/weather_cache.json"),
            cache_ttl_minutes: 30,
            offline_dir: None,
        }
    }
}

/// Where finished frames go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayBackend {
    /// Write each frame to a PBM file
    File,
    /// 7.5" V2 e-paper panel (needs the `hardware` feature)
    Epd,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    pub backend: DisplayBackend,
    /// Target of the file backend
    pub output_path: PathBuf,
    pub hardware: HardwareConfig,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 800,  // Waveshare 7.5" V2
            height: 480, // Waveshare 7.5" V2
            backend: DisplayBackend::File,
            output_path: PathBuf::from("out.pbm"),
            hardware: HardwareConfig::default(),
        }
    }
}

/// Bus wiring of the e-paper HAT. Pin numbers are BCM GPIO line offsets; chip
/// select is driven by the kernel SPI driver.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HardwareConfig {
    pub spi_device: PathBuf,
    pub spi_speed_hz: u32,
    pub gpio_chip: PathBuf,
    pub dc_pin: u32,
    pub rst_pin: u32,
    pub busy_pin: u32,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            spi_device: PathBuf::from("/dev/spidev0.0"),
            spi_speed_hz: 4_000_000,
            gpio_chip: PathBuf::from("/dev/gpiochip0"),
            dc_pin: 25,
            rst_pin: 17,
            busy_pin: 24,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// Fixed plausible readings, no hardware
    Simulated,
    /// No indoor sensor; the dashboard leaves the reading out
    None,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SensorConfig {
    pub kind: SensorKind,
    /// Plain-text thermometer endpoint, e.g. `http://192.168.1.40/temp`
    pub remote_url: Option<String>,
    pub remote_timeout_secs: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            kind: SensorKind::Simulated,
            remote_url: None,
            remote_timeout_secs: 2,
        }
    }
}

impl Config {
    /// Load configuration from weather-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(
                        "Loaded configuration for {} ({}, {})",
                        config.location.label, config.location.latitude, config.location.longitude
                    );
                    config
                }
                Err(e) => {
                    warn!("Invalid config file format in {}: {}", path.display(), e);
                    warn!("Using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file at {}, using default configuration", path.display());
                Self::default()
            }
        }
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}
