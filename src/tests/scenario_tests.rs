//! # End-to-End Scenarios
//!
//! Each test builds a small timeline, renders it with the default layout and checks
//! the strip against layers drawn directly with the icon primitives. Rows below the
//! cloud base only ever hold precipitation and bolts, so those rows must match the
//! reference layer pixel for pixel.

use chrono::{FixedOffset, NaiveTime, TimeZone};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::Point;
use weather_strip_lib::canvas::Canvas;
use weather_strip_lib::config::Config;
use weather_strip_lib::dashboard::{self, Readings};
use weather_strip_lib::icons;
use weather_strip_lib::overlay::{self, NightOverlay};
use weather_strip_lib::renderer::{ForecastStripRenderer, StripLayout};
use weather_strip_lib::{
    fallback, AstronomicalContext, ConditionCodeSet, ForecastPoint, Timeline, FORECAST_SLOTS,
};

const SLOT: u32 = 88;
const STRIP_HEIGHT: u32 = 90;
/// First row below any cloud or sun ray
const BELOW_CLOUD: u32 = 61;

fn astro() -> AstronomicalContext {
    AstronomicalContext {
        sunrise_minute: 360,
        sunset_minute: 1080,
        latitude: 50.24,
        longitude: 24.14,
    }
}

fn point(hour: u32, codes: &[u32]) -> ForecastPoint {
    let tz = FixedOffset::east_opt(3 * 3600).unwrap();
    let time = tz.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap();
    let codes: ConditionCodeSet = codes.iter().copied().collect();
    ForecastPoint::new(time, 4.0, codes)
}

fn render(timeline: &Timeline) -> Canvas {
    let renderer = ForecastStripRenderer::new(StripLayout::default());
    let width = SLOT * timeline.capacity() as u32;
    renderer
        .render(timeline, &astro(), width, STRIP_HEIGHT)
        .unwrap()
}

fn render_one(hour: u32, codes: &[u32]) -> Canvas {
    render(&Timeline::from_points([point(hour, codes)], 1))
}

fn precipitation_anchor() -> Point {
    let layout = StripLayout::default();
    Point::new(SLOT as i32 / 2, layout.cloud_offset() + 10)
}

fn assert_rows_match(actual: &Canvas, expected: &Canvas, rows: std::ops::Range<u32>) {
    for y in rows {
        for x in 0..actual.width() {
            assert_eq!(
                actual.pixel(x, y),
                expected.pixel(x, y),
                "pixel ({}, {}) differs",
                x,
                y
            );
        }
    }
}

#[test]
fn clear_noon_draws_full_sun_without_shading() {
    let p = point(12, &[800]);
    assert_eq!(p.attributes.sun_size, 2);
    assert_eq!(p.attributes.cloud_size, 0);

    let strip = render_one(12, &[800]);

    let layout = StripLayout::default();
    let center = Point::new(44, (layout.header_offset + 2 * layout.sun_radius) as i32);
    let mut sun = Canvas::new(SLOT, STRIP_HEIGHT);
    icons::sun(&mut sun, center, layout.sun_radius).unwrap();
    // Below the labels the slot holds nothing but the sun
    assert_rows_match(&strip, &sun, 30..STRIP_HEIGHT);

    // Header band corners stay paper in daylight
    assert_eq!(strip.pixel(0, 0), BinaryColor::Off);
    assert_eq!(strip.pixel(SLOT - 1, layout.header_offset - 1), BinaryColor::Off);
}

#[test]
fn snow_draws_three_flakes_and_nothing_else_below_cloud() {
    let p = point(12, &[601]);
    assert_eq!(p.attributes.snow_size, 5);
    assert_eq!(p.attributes.snow_mask, 7);
    assert_eq!(p.attributes.cloud_size, 4);
    assert_eq!(p.attributes.rain_size, 0);
    assert!(!p.attributes.thunder);

    let strip = render_one(12, &[601]);

    let mut flakes = Canvas::new(SLOT, STRIP_HEIGHT);
    icons::snow(&mut flakes, precipitation_anchor(), 5, 7).unwrap();
    assert_rows_match(&strip, &flakes, BELOW_CLOUD..STRIP_HEIGHT);

    let centres = icons::precipitation_offsets(7, 5, icons::SNOW_ROW_STEP);
    assert_eq!(centres.len(), 3);
    for offset in centres {
        let c = precipitation_anchor() + offset;
        assert_eq!(strip.pixel(c.x as u32, c.y as u32), BinaryColor::On);
    }

    // Outline cloud above the flakes
    assert!(strip.count_ink_in(0, 30, SLOT, BELOW_CLOUD) > 0);
}

#[test]
fn thunderstorm_draws_two_drops_and_a_bolt() {
    let p = point(12, &[200]);
    assert_eq!(p.attributes.rain_size, 2);
    assert_eq!(p.attributes.rain_mask, 3);
    assert!(p.attributes.thunder);
    assert_eq!(p.attributes.cloud_size, 4);

    let strip = render_one(12, &[200]);

    let layout = StripLayout::default();
    let mut expected = Canvas::new(SLOT, STRIP_HEIGHT);
    icons::rain(&mut expected, precipitation_anchor(), 2, 3).unwrap();
    icons::thunder_bolt(
        &mut expected,
        Point::new(SLOT as i32 / 2, layout.cloud_offset()),
        layout.thunder_size,
    )
    .unwrap();
    assert_rows_match(&strip, &expected, BELOW_CLOUD..STRIP_HEIGHT);

    let drops = icons::precipitation_offsets(3, 2, icons::RAIN_ROW_STEP);
    assert_eq!(drops.len(), 2);
}

#[test]
fn night_slot_shades_header_only() {
    let strip = render_one(2, &[800]);
    let layout = StripLayout::default();

    // Fully inverted band: the corners are ink, the labels show as paper
    assert_eq!(strip.pixel(0, 0), BinaryColor::On);
    assert_eq!(strip.pixel(SLOT - 1, layout.header_offset - 1), BinaryColor::On);
    // Below the band nothing is inverted
    assert_eq!(strip.pixel(0, layout.header_offset), BinaryColor::Off);
    assert_eq!(strip.count_ink_in(0, 75, SLOT, STRIP_HEIGHT), 0);
}

#[test]
fn night_mask_applied_twice_restores_icons() {
    let timeline = Timeline::from_points([point(2, &[800]), point(5, &[500])], 2);
    let icons_only = {
        // Same timeline in daylight: no shading at all
        let mut day = astro();
        day.sunrise_minute = 0;
        day.sunset_minute = 1439;
        ForecastStripRenderer::new(StripLayout::default())
            .render(&timeline, &day, 2 * SLOT, STRIP_HEIGHT)
            .unwrap()
    };

    let mut mask = Canvas::new(2 * SLOT, STRIP_HEIGHT);
    let night = NightOverlay::new(&astro(), 90);
    for (i, p) in timeline.iter().enumerate() {
        night.paint(&mut mask, i as u32 * SLOT, SLOT, 14, p.minute_of_day());
    }
    assert!(mask.count_ink() > 0);

    let mut merged = icons_only.clone();
    overlay::apply(&mut merged, &mask);
    assert_ne!(merged, icons_only);
    overlay::apply(&mut merged, &mask);
    assert_eq!(merged, icons_only);
}

#[test]
fn short_timeline_leaves_trailing_slots_blank() {
    let timeline = Timeline::from_points(
        [point(9, &[800]), point(12, &[601]), point(15, &[200])],
        FORECAST_SLOTS,
    );
    let strip = render(&timeline);
    assert_eq!(strip.width(), SLOT * FORECAST_SLOTS as u32);
    for slot in 0..3 {
        assert!(strip.count_ink_in(slot * SLOT, 0, (slot + 1) * SLOT, STRIP_HEIGHT) > 0);
    }
    assert_eq!(strip.count_ink_in(3 * SLOT, 0, strip.width(), STRIP_HEIGHT), 0);
}

#[test]
fn unknown_codes_render_labels_only() {
    let strip = render_one(12, &[999]);
    assert!(strip.count_ink_in(0, 0, SLOT, 30) > 0);
    assert_eq!(strip.count_ink_in(0, 30, SLOT, STRIP_HEIGHT), 0);
}

#[test]
fn offline_fallback_composes_blank_strip_with_marker() {
    let config = Config::default();
    let now = FixedOffset::east_opt(3 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 6, 21, 23, 0, 0)
        .unwrap();
    let snapshot = fallback::approximate(&config, now);

    let renderer = ForecastStripRenderer::new(config.strip);
    let strip = renderer
        .render_snapshot(&snapshot, config.display.width)
        .unwrap();
    assert_eq!(strip.count_ink(), 0);

    let readings = Readings {
        offline: snapshot.offline,
        ..Readings::default()
    };
    let frame = dashboard::compose(
        &strip,
        NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
        &readings,
        config.display.width,
        config.display.height,
    );
    let (w, h) = (config.display.width, config.display.height);
    assert!(frame.count_ink_in(w - 100, h - 30, w, h) > 0);
}

#[test]
fn loop_wakes_on_the_minute() {
    let t = NaiveTime::from_hms_opt(10, 0, 45).unwrap();
    assert_eq!(crate::until_next_minute(&t).as_secs(), 15);
    let t = NaiveTime::from_hms_milli_opt(10, 0, 59, 500).unwrap();
    assert_eq!(crate::until_next_minute(&t).as_millis(), 500);
    let t = NaiveTime::from_hms_opt(10, 1, 0).unwrap();
    assert_eq!(crate::until_next_minute(&t).as_secs(), 60);
}

#[test]
fn written_config_loads_back_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weather-config.toml");
    let mut config = Config::default();
    config.location.label = "Ternopil".to_string();
    config.strip.height = 96;

    crate::write_config(&config, &path).unwrap();
    assert_eq!(Config::load_from_path(&path), config);

    let missing = dir.path().join("no-such-dir").join("weather-config.toml");
    assert!(crate::write_config(&config, &missing).is_err());
}
