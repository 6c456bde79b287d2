//! Moon phase proxy from a low-precision lunar position model
//!
//! Accuracy: a few degrees for λ, β and the equatorial coordinates; ~5 % for Δ.
//! Mean elements are the usual J2000 linear terms with one periodic correction each
//! (equation of centre for longitude, the main latitude term, the main distance term).
//!
//! The sidereal term ignores Earth's daily rotation, so the Moon's hour angle drifts by
//! ~12.19°/day and repeats once per synodic month. Its declination follows the 27.3-day
//! tropical month instead, so the Moon's zenith distance alone wanders by up to 15°
//! between consecutive months. The phase angle is therefore taken between the Moon's
//! and the Sun's zenith-referenced directions: both declinations cancel and the value
//! repeats within a few degrees every synodic month, small near new moon and close to
//! 180° near full moon. It is a coarse phase index for choosing a moon glyph, **not**
//! an illuminated fraction.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Unix time of the J2000.0 epoch (2000-01-01 12:00 UTC).
const J2000_UNIX: i64 = 946_728_000;

/// Mean synodic month in days.
pub const SYNODIC_MONTH_DAYS: f64 = 29.530_588_2;

/// Rejected observer coordinates.
///
/// A wrong-but-plausible moon glyph is worse than no glyph, so bad input is an
/// error instead of a default phase.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum PhaseError {
    #[error("latitude {0} is not a finite value in -90..=90")]
    InvalidLatitude(f64),

    #[error("longitude {0} is not a finite value in -180..=180")]
    InvalidLongitude(f64),
}

/// Everything the position model computes on the way to the phase angle.
#[derive(Debug, Clone, Copy)]
pub struct LunarPosition {
    /// Ecliptic longitude (deg, 0–360).
    pub lon_deg: f64,
    /// Ecliptic latitude (deg).
    pub lat_deg: f64,
    /// Geocentric distance in kilometres.
    pub distance_km: f64,
    /// Right ascension (deg, 0–360).
    pub ra_deg: f64,
    /// Declination (deg).
    pub dec_deg: f64,
    /// Local hour angle (deg, 0–360).
    pub hour_angle_deg: f64,
}

/// Glyph bucket for the moon icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoonShape {
    /// Offset disc cut out of the dark disc.
    Crescent,
    /// Left half cut out.
    Half,
    /// Dark disc, no cut-out.
    Full,
}

impl MoonShape {
    pub fn from_phase_angle(angle_deg: f64) -> Self {
        if angle_deg < 90.0 {
            MoonShape::Crescent
        } else if angle_deg < 270.0 {
            MoonShape::Half
        } else {
            MoonShape::Full
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

fn norm360(x: f64) -> f64 {
    x.rem_euclid(360.0)
}

/// Continuous day count since J2000.0, including the fraction of the day.
pub fn days_since_j2000(instant: DateTime<Utc>) -> f64 {
    (instant.timestamp_millis() - J2000_UNIX * 1000) as f64 / 86_400_000.0
}

/// Reject non-finite or out-of-range observer coordinates.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), PhaseError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(PhaseError::InvalidLatitude(latitude));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(PhaseError::InvalidLongitude(longitude));
    }
    Ok(())
}

/// Position of the Moon for an observer at `longitude` (deg east).
pub fn lunar_position(longitude: f64, instant: DateTime<Utc>) -> LunarPosition {
    let d = days_since_j2000(instant);

    // Mean elements
    let mean_lon = norm360(218.316 + 13.176_396 * d);
    let mean_anomaly = norm360(134.963 + 13.064_993 * d);
    let arg_latitude = norm360(93.272 + 13.229_350 * d);

    // First-order periodic corrections
    let lon_deg = norm360(mean_lon + 6.289 * sin_deg(mean_anomaly));
    let lat_deg = 5.128 * sin_deg(arg_latitude);
    let distance_km = 385_001.0 - 20_905.0 * cos_deg(mean_anomaly);

    // Ecliptic → equatorial using the mean obliquity
    let obliquity = 23.439 - 0.000_000_4 * d;
    let ra_deg = norm360(
        (sin_deg(lon_deg) * cos_deg(obliquity) - tan_deg(lat_deg) * sin_deg(obliquity))
            .atan2(cos_deg(lon_deg))
            .to_degrees(),
    );
    let sin_dec = sin_deg(lat_deg) * cos_deg(obliquity)
        + cos_deg(lat_deg) * sin_deg(obliquity) * sin_deg(lon_deg);
    let dec_deg = sin_dec.clamp(-1.0, 1.0).asin().to_degrees();

    // Sidereal angle without the daily rotation term
    let sidereal_deg = norm360(100.46 + 0.985_647_352 * d + longitude);
    let hour_angle_deg = norm360(sidereal_deg - ra_deg);

    LunarPosition {
        lon_deg,
        lat_deg,
        distance_km,
        ra_deg,
        dec_deg,
        hour_angle_deg,
    }
}

/// Sun's `(declination, hour angle)` in degrees, same sidereal convention as the Moon.
fn solar_position(longitude: f64, d: f64) -> (f64, f64) {
    let mean_lon = norm360(280.460 + 0.985_647_4 * d);
    let mean_anomaly = norm360(357.528 + 0.985_600_3 * d);
    let lon = mean_lon + 1.915 * sin_deg(mean_anomaly) + 0.020 * sin_deg(2.0 * mean_anomaly);

    let obliquity = 23.439 - 0.000_000_4 * d;
    let ra_deg = norm360(
        (cos_deg(obliquity) * sin_deg(lon))
            .atan2(cos_deg(lon))
            .to_degrees(),
    );
    let dec_deg = (sin_deg(obliquity) * sin_deg(lon)).clamp(-1.0, 1.0).asin().to_degrees();

    let sidereal_deg = norm360(100.46 + 0.985_647_352 * d + longitude);
    (dec_deg, norm360(sidereal_deg - ra_deg))
}

/// Zenith distance and azimuth (radians) of a body seen from `latitude`.
fn horizontal(latitude: f64, dec_deg: f64, hour_angle_deg: f64) -> (f64, f64) {
    let cos_zenith = sin_deg(latitude) * sin_deg(dec_deg)
        + cos_deg(latitude) * cos_deg(dec_deg) * cos_deg(hour_angle_deg);
    let azimuth = (sin_deg(hour_angle_deg) * cos_deg(dec_deg)).atan2(
        cos_deg(hour_angle_deg) * sin_deg(latitude) * cos_deg(dec_deg)
            - sin_deg(dec_deg) * cos_deg(latitude),
    );
    (cos_zenith.clamp(-1.0, 1.0).acos(), azimuth)
}

/// Phase angle in degrees, `0.0..=180.0`.
///
/// Both bodies are placed on the local sky (zenith distance, azimuth) from their
/// declination and hour angle; the spherical law of cosines then gives the angle
/// between the two directions.
pub fn phase_angle(latitude: f64, longitude: f64, instant: DateTime<Utc>) -> Result<f64, PhaseError> {
    validate_coordinates(latitude, longitude)?;
    let moon = lunar_position(longitude, instant);
    let (sun_dec, sun_hour_angle) = solar_position(longitude, days_since_j2000(instant));

    let (z_moon, az_moon) = horizontal(latitude, moon.dec_deg, moon.hour_angle_deg);
    let (z_sun, az_sun) = horizontal(latitude, sun_dec, sun_hour_angle);
    let cos_angle =
        z_moon.cos() * z_sun.cos() + z_moon.sin() * z_sun.sin() * (az_moon - az_sun).cos();

    Ok(cos_angle.clamp(-1.0, 1.0).acos().to_degrees())
}

/// Shape bucket for the given observer and instant.
pub fn moon_shape(latitude: f64, longitude: f64, instant: DateTime<Utc>) -> Result<MoonShape, PhaseError> {
    phase_angle(latitude, longitude, instant).map(MoonShape::from_phase_angle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const LAT: f64 = 50.24;
    const LON: f64 = 24.14;

    fn synodic_month() -> Duration {
        Duration::seconds((SYNODIC_MONTH_DAYS * 86_400.0) as i64)
    }

    fn angle_diff(a: f64, b: f64) -> f64 {
        let d = (a - b).rem_euclid(360.0);
        d.min(360.0 - d)
    }

    #[test]
    fn test_epoch_day_count() {
        let epoch = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(days_since_j2000(epoch), 0.0);
        let later = epoch + Duration::hours(36);
        assert!((days_since_j2000(later) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_angle_is_within_range() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for step in 0..400 {
            let t = start + Duration::hours(step * 22);
            let angle = phase_angle(LAT, LON, t).unwrap();
            assert!((0.0..=180.0).contains(&angle), "angle {angle} at {t}");
        }
    }

    #[test]
    fn test_hour_angle_repeats_each_synodic_month() {
        let start = Utc.with_ymd_and_hms(2023, 3, 7, 6, 30, 0).unwrap();
        for month in 0..12 {
            let t = start + Duration::days(month * 31);
            let a = lunar_position(LON, t).hour_angle_deg;
            let b = lunar_position(LON, t + synodic_month()).hour_angle_deg;
            let diff = angle_diff(a, b);
            assert!(diff < 10.0, "hour angle drifted {diff}° after one month at {t}");
        }
    }

    #[test]
    fn test_hour_angle_flips_after_half_month() {
        let t = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        let half = Duration::seconds((SYNODIC_MONTH_DAYS * 43_200.0) as i64);
        let a = lunar_position(LON, t).hour_angle_deg;
        let b = lunar_position(LON, t + half).hour_angle_deg;
        let diff = angle_diff(a, b);
        assert!(diff > 150.0, "expected opposite hour angle, got {diff}°");
    }

    #[test]
    fn test_phase_angle_repeats_each_synodic_month() {
        // Seven-hour steps cover every phase and every time of day over ~19 months
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for (lat, lon) in [(LAT, LON), (-33.9, 151.2), (78.2, 15.6)] {
            let mut worst: f64 = 0.0;
            for step in 0..2000 {
                let t = start + Duration::hours(step * 7);
                let a = phase_angle(lat, lon, t).unwrap();
                let b = phase_angle(lat, lon, t + synodic_month()).unwrap();
                worst = worst.max((a - b).abs());
            }
            assert!(worst < 5.0, "phase angle drifted {worst}° after one month at ({lat}, {lon})");
        }
    }

    #[test]
    fn test_phase_angle_follows_the_lunation() {
        // New moon 2024-01-11 11:57 UTC, full moon 2024-01-25 17:54 UTC
        let new_moon = Utc.with_ymd_and_hms(2024, 1, 11, 11, 57, 0).unwrap();
        let full_moon = Utc.with_ymd_and_hms(2024, 1, 25, 17, 54, 0).unwrap();
        assert!(phase_angle(LAT, LON, new_moon).unwrap() < 15.0);
        assert!(phase_angle(LAT, LON, full_moon).unwrap() > 165.0);
        assert_eq!(moon_shape(LAT, LON, new_moon).unwrap(), MoonShape::Crescent);
        assert_eq!(moon_shape(LAT, LON, full_moon).unwrap(), MoonShape::Half);
    }

    #[test]
    fn test_distance_is_plausible() {
        let t = Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap();
        let pos = lunar_position(LON, t);
        assert!((364_000.0..=406_000.0).contains(&pos.distance_km));
        assert!(pos.dec_deg.abs() < 29.0);
        assert!(pos.lat_deg.abs() <= 5.128);
    }

    #[test]
    fn test_rejects_bad_coordinates() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            phase_angle(91.0, 0.0, t),
            Err(PhaseError::InvalidLatitude(91.0))
        );
        assert_eq!(
            phase_angle(0.0, -180.5, t),
            Err(PhaseError::InvalidLongitude(-180.5))
        );
        assert!(matches!(
            phase_angle(f64::NAN, 0.0, t),
            Err(PhaseError::InvalidLatitude(_))
        ));
        assert!(matches!(
            phase_angle(0.0, f64::INFINITY, t),
            Err(PhaseError::InvalidLongitude(_))
        ));
    }

    #[test]
    fn test_shape_buckets() {
        assert_eq!(MoonShape::from_phase_angle(0.0), MoonShape::Crescent);
        assert_eq!(MoonShape::from_phase_angle(89.9), MoonShape::Crescent);
        assert_eq!(MoonShape::from_phase_angle(90.0), MoonShape::Half);
        assert_eq!(MoonShape::from_phase_angle(180.0), MoonShape::Half);
        assert_eq!(MoonShape::from_phase_angle(270.0), MoonShape::Full);
    }
}
