//! # Weather Strip Core Library
//!
//! This library renders a forecast strip for a monochrome e-ink weather dashboard
//! (Raspberry Pi + 7.5" 800×480 panel). Weather condition codes are turned into
//! procedurally drawn icons (sun, moon, cloud, rain, snow, thunder), combined with a
//! day/night shading band and laid out in fixed-width time slots.
//!
//! ## Design Philosophy
//!
//! ### Pure Rendering
//! - **No shared drawing state**: every icon is a free function taking an explicit
//!   draw target, so two layers can be drawn independently and merged afterwards
//! - **1-bit only**: the [`canvas::Canvas`] stores packed rows, one bit per pixel
//! - **Deterministic**: the same timeline and astronomical context always produce the
//!   same bitmap, which keeps rendering testable without hardware
//!
//! ### Temporal Resolution
//! The forecast provider reports one point every 3 hours:
//! - **9 slots**: a full day plus one point of look-ahead
//! - **Half period**: each slot covers ±90 minutes around its timestamp, which is
//!   what the day/night band uses to shade partial slots at sunrise and sunset
//!
//! ### Data Flow
//! 1. **Online**: Fetch OpenWeatherMap current + forecast → cache → render → display
//! 2. **Offline**: Empty timeline + computed sunrise/sunset → render → display
//! 3. **Every minute**: compose the dashboard (strip, clock, sensor readings)
//!
//! ## Core Types
//!
//! - [`RenderAttributes`]: what to draw for one forecast point
//! - [`ForecastPoint`]: one forecast entry with its resolved attributes
//! - [`Timeline`]: fixed-capacity, chronologically ordered forecast points
//! - [`AstronomicalContext`]: sunrise/sunset minutes and observer coordinates
//! - [`ForecastSnapshot`]: everything one refresh cycle produced

use chrono::{DateTime, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// Module declarations
pub mod canvas;
pub mod conditions;
pub mod config;
pub mod dashboard;
pub mod display;
pub mod epd7in5_v2;
pub mod fallback;
pub mod forecast;
pub mod geometry;
pub mod icons;
pub mod lunar;
pub mod overlay;
pub mod renderer;
pub mod sensor;
pub mod text;

/// Number of forecast slots on the strip in the reference deployment.
pub const FORECAST_SLOTS: usize = 9;

/// Minutes in a day; minute-of-day values are always below this.
pub const MINUTES_PER_DAY: u16 = 1440;

/// Set of provider condition identifiers attached to one forecast point.
///
/// A provider may report several simultaneous conditions (e.g. "light rain" and
/// "overcast clouds"). An ordered set keeps iteration deterministic.
pub type ConditionCodeSet = BTreeSet<u32>;

/// Render parameters derived from a [`ConditionCodeSet`].
///
/// Created once per forecast point by [`conditions::resolve`] and never mutated.
///
/// Masks select which of the five canonical positions are populated:
/// bit 1 = left, bit 2 = right, bit 4 = center, bit 8 = lower-left,
/// bit 16 = lower-right.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderAttributes {
    /// 0 = none, 1..=4 from few clouds to overcast, 5 = severe (filled)
    pub cloud_size: u8,
    /// 0 = none, 1 = small/partial, 2 = full
    pub sun_size: u8,
    /// Drop radius in pixels
    pub rain_size: u8,
    /// 5-bit drop occupancy
    pub rain_mask: u8,
    /// Flake arm length in pixels
    pub snow_size: u8,
    /// 5-bit flake occupancy
    pub snow_mask: u8,
    pub thunder: bool,
}

impl RenderAttributes {
    /// True when no icon would be drawn at all.
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }
}

/// One forecast entry.
///
/// # Example
/// ```
/// use chrono::{FixedOffset, TimeZone};
/// use weather_strip_lib::ForecastPoint;
///
/// let tz = FixedOffset::east_opt(3 * 3600).unwrap();
/// let time = tz.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
/// let point = ForecastPoint::new(time, 21.4, [800].into_iter().collect());
///
/// assert_eq!(point.minute_of_day(), 720);
/// assert_eq!(point.attributes.sun_size, 2);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Local wall-clock time of the forecast
    pub time: DateTime<FixedOffset>,
    /// Temperature in the configured units
    pub temperature: f32,
    /// Raw provider condition codes
    pub codes: ConditionCodeSet,
    /// Icon parameters resolved from `codes`
    pub attributes: RenderAttributes,
}

impl ForecastPoint {
    /// Build a point, resolving its render attributes from the condition codes.
    pub fn new(time: DateTime<FixedOffset>, temperature: f32, codes: ConditionCodeSet) -> Self {
        let attributes = conditions::resolve(&codes);
        Self {
            time,
            temperature,
            codes,
            attributes,
        }
    }

    /// Minutes since local midnight.
    pub fn minute_of_day(&self) -> u16 {
        minute_of_day(&self.time)
    }
}

/// Minutes since midnight of any wall-clock time value.
pub fn minute_of_day<T: Timelike>(time: &T) -> u16 {
    (time.hour() * 60 + time.minute()) as u16
}

/// Chronologically ordered forecast points with a fixed number of slots.
///
/// Slot `i` occupies the horizontal span `[i·W, (i+1)·W)` where
/// `W = canvas_width / capacity`. Points beyond the capacity are dropped; a short
/// timeline leaves the remaining slots blank.
///
/// # Example
/// ```
/// use weather_strip_lib::Timeline;
///
/// let timeline = Timeline::new(9);
/// assert!(timeline.is_empty());
/// assert_eq!(timeline.capacity(), 9);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Timeline {
    points: Vec<ForecastPoint>,
    capacity: usize,
}

impl Timeline {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Keep the first `capacity` points, in the order given.
    pub fn from_points<I>(points: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = ForecastPoint>,
    {
        let mut timeline = Self::new(capacity);
        timeline.points.extend(points.into_iter().take(capacity));
        timeline
    }

    /// Append a point; returns `false` (and drops it) once every slot is taken.
    pub fn push(&mut self, point: ForecastPoint) -> bool {
        if self.points.len() >= self.capacity {
            return false;
        }
        self.points.push(point);
        true
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &ForecastPoint> {
        self.points.iter()
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(FORECAST_SLOTS)
    }
}

/// Sun times and observer position for one forecast refresh cycle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AstronomicalContext {
    /// Local sunrise, minutes since midnight (0–1439)
    pub sunrise_minute: u16,
    /// Local sunset, minutes since midnight (0–1439)
    pub sunset_minute: u16,
    /// Degrees north, -90..=90
    pub latitude: f64,
    /// Degrees east, -180..=180
    pub longitude: f64,
}

impl AstronomicalContext {
    /// Inclusive on both ends, matching how the forecast slots are classified.
    ///
    /// `sunset <= sunrise` is the polar-night encoding and is never daytime, the same
    /// rule the night overlay shades by.
    pub fn is_daytime(&self, minute: u16) -> bool {
        self.sunrise_minute < self.sunset_minute
            && self.sunrise_minute <= minute
            && minute <= self.sunset_minute
    }
}

/// Observed conditions reported alongside the forecast.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub humidity_pct: f32,
    /// Sea-level pressure converted to millimetres of mercury
    pub pressure_mmhg: i32,
}

/// Everything one forecast refresh cycle produced.
///
/// When `offline = true` the timeline is empty and the sun times come from the
/// approximation in [`fallback`]; the dashboard shows an "OFFLINE" marker.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    pub timeline: Timeline,
    pub astro: AstronomicalContext,
    pub current: Option<CurrentConditions>,
    pub fetched_at: DateTime<FixedOffset>,
    pub offline: bool,
}
