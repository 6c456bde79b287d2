//! # Offline Fallback
//!
//! When neither the network nor the cache can provide a forecast, the dashboard
//! still needs sunrise and sunset: the night band and the sun/moon choice depend on
//! them. This module computes both from the observer position and the local date
//! and returns a snapshot with an empty timeline and `offline = true`.
//!
//! ## Model Characteristics
//!
//! ### NOAA Sunrise Equation
//! - **Zenith**: 90.833° ("official" sunrise, refraction and solar disc included)
//! - **Inputs**: latitude, longitude, day of year, UTC offset of `now`
//! - **Output**: local minutes since midnight
//!
//! ### Polar Cases
//! - **Sun never sets**: sunrise 00:00, sunset 23:59, the strip is all day
//! - **Sun never rises**: sunrise = sunset = 12:00, the strip is all night
//!
//! ### Accuracy Trade-offs
//! - ✅ **Within a few minutes** at mid latitudes
//! - ❌ **No elevation or horizon correction**
//! - ❌ **No forecast points**: the strip only shows the night band until the
//!   network comes back
//!
//! The offline indicator ensures users understand they're seeing an approximation.

use crate::config::Config;
use crate::{AstronomicalContext, ForecastSnapshot, Timeline, MINUTES_PER_DAY};
use chrono::{DateTime, Datelike, FixedOffset};
use log::info;

const ZENITH_DEG: f64 = 90.833;

/// Result of the sunrise equation for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Daylight {
    /// Local minutes since midnight
    Normal { sunrise: u16, sunset: u16 },
    /// The sun stays above the horizon all day
    PolarDay,
    /// The sun stays below the horizon all day
    PolarNight,
}

impl Daylight {
    /// `(sunrise, sunset)` minutes as used by [`AstronomicalContext`].
    pub fn minutes(&self) -> (u16, u16) {
        match *self {
            Daylight::Normal { sunrise, sunset } => (sunrise, sunset),
            Daylight::PolarDay => (0, MINUTES_PER_DAY - 1),
            Daylight::PolarNight => (MINUTES_PER_DAY / 2, MINUTES_PER_DAY / 2),
        }
    }
}

fn sin_deg(x: f64) -> f64 {
    x.to_radians().sin()
}

fn cos_deg(x: f64) -> f64 {
    x.to_radians().cos()
}

fn tan_deg(x: f64) -> f64 {
    x.to_radians().tan()
}

enum Event {
    Rise,
    Set,
}

/// UT hour of the event, `Err(true)` when the sun never sets and `Err(false)` when it
/// never rises.
fn event_ut_hours(latitude: f64, longitude: f64, day_of_year: u32, event: &Event) -> Result<f64, bool> {
    let lng_hour = longitude / 15.0;
    let approx = match event {
        Event::Rise => day_of_year as f64 + (6.0 - lng_hour) / 24.0,
        Event::Set => day_of_year as f64 + (18.0 - lng_hour) / 24.0,
    };

    // Sun's mean anomaly and true longitude
    let mean_anomaly = 0.9856 * approx - 3.289;
    let true_lon = (mean_anomaly
        + 1.916 * sin_deg(mean_anomaly)
        + 0.020 * sin_deg(2.0 * mean_anomaly)
        + 282.634)
        .rem_euclid(360.0);

    // Right ascension in the same quadrant as the true longitude, in hours
    let mut ra = (0.91764 * tan_deg(true_lon)).atan().to_degrees().rem_euclid(360.0);
    ra += (true_lon / 90.0).floor() * 90.0 - (ra / 90.0).floor() * 90.0;
    let ra_hours = ra / 15.0;

    let sin_dec = 0.39782 * sin_deg(true_lon);
    let cos_dec = (1.0 - sin_dec * sin_dec).sqrt();
    let cos_h = (cos_deg(ZENITH_DEG) - sin_dec * sin_deg(latitude)) / (cos_dec * cos_deg(latitude));
    if cos_h > 1.0 {
        return Err(false);
    }
    if cos_h < -1.0 {
        return Err(true);
    }

    let h_deg = cos_h.acos().to_degrees();
    let h_hours = match event {
        Event::Rise => (360.0 - h_deg) / 15.0,
        Event::Set => h_deg / 15.0,
    };
    let local_mean = h_hours + ra_hours - 0.06571 * approx - 6.622;
    Ok((local_mean - lng_hour).rem_euclid(24.0))
}

/// Sunrise and sunset on the local date of `now`, in the UTC offset of `now`.
pub fn daylight(latitude: f64, longitude: f64, now: DateTime<FixedOffset>) -> Daylight {
    let day = now.ordinal();
    let offset_minutes = now.offset().local_minus_utc() as f64 / 60.0;
    let to_local = |ut: f64| (ut * 60.0 + offset_minutes).rem_euclid(MINUTES_PER_DAY as f64) as u16;

    match (
        event_ut_hours(latitude, longitude, day, &Event::Rise),
        event_ut_hours(latitude, longitude, day, &Event::Set),
    ) {
        (Ok(rise), Ok(set)) => Daylight::Normal {
            sunrise: to_local(rise),
            sunset: to_local(set),
        },
        (Err(true), _) | (_, Err(true)) => Daylight::PolarDay,
        _ => Daylight::PolarNight,
    }
}

/// Snapshot for a dashboard with no forecast data.
///
/// The timeline is empty (the strip renders blank slots), the sun times come from
/// [`daylight`] and `offline` is set so the dashboard shows its marker.
pub fn approximate(config: &Config, now: DateTime<FixedOffset>) -> ForecastSnapshot {
    let location = &config.location;
    let daylight = daylight(location.latitude, location.longitude, now);
    let (sunrise_minute, sunset_minute) = daylight.minutes();
    info!(
        "Offline sun times for {}: {:?}",
        location.label, daylight
    );

    ForecastSnapshot {
        timeline: Timeline::new(config.strip.slots),
        astro: AstronomicalContext {
            sunrise_minute,
            sunset_minute,
            latitude: location.latitude,
            longitude: location.longitude,
        },
        current: None,
        fetched_at: now,
        offline: true,
    }
}
