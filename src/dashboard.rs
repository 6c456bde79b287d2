//! Full-frame composition
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ forecast strip (9 slots)                     │
//! ├──────────────────────────────────────────────┤
//! │ 12.3°             ┌──────────────┐           │
//! │   45%    742      │    HH:MM ×5  │           │
//! │ 18.2°             └──────────────┘           │
//! │                                     OFFLINE  │
//! └──────────────────────────────────────────────┘
//! ```

use crate::canvas::{infallible, Canvas};
use crate::sensor::ClimateReading;
use crate::text::{format_reading, LabelFont, MonoLabelFont};
use crate::CurrentConditions;
use chrono::NaiveTime;
use embedded_graphics::prelude::*;

const CLOCK_SCALE: u32 = 5;
const READING_SCALE: u32 = 2;
const MARGIN: i32 = 5;

/// Readings shown under the strip; every field may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Readings {
    pub indoor: Option<ClimateReading>,
    /// Outdoor thermometer, °C
    pub remote: Option<f32>,
    /// Provider's observed conditions, used when there is no indoor sensor
    pub current: Option<CurrentConditions>,
    pub offline: bool,
}

impl Readings {
    /// `"45%    742"`, preferring the indoor sensor over the provider.
    fn humidity_line(&self) -> Option<String> {
        let (humidity, pressure) = match (self.indoor, self.current) {
            (Some(r), _) => (r.humidity_pct, r.pressure_mmhg()),
            (None, Some(c)) => (c.humidity_pct, c.pressure_mmhg),
            (None, None) => return None,
        };
        Some(format!("{:.0}%    {}", humidity, pressure))
    }
}

/// Draw `text` at `top_left` with every font pixel blown up to `scale × scale`.
fn draw_scaled<F: LabelFont>(target: &mut Canvas, font: &F, text: &str, top_left: Point, scale: u32) {
    let size = font.measure(text);
    let mut glyphs = Canvas::new(size.width, size.height);
    infallible(font.draw(text, Point::zero(), &mut glyphs));
    target.blit(&glyphs, top_left, scale);
}

fn scaled_size<F: LabelFont>(font: &F, text: &str, scale: u32) -> Size {
    font.measure(text) * scale
}

/// Compose one dashboard frame.
///
/// The strip is pasted at the top-left; the clock is centred horizontally just below
/// it, readings run down the left edge and the offline marker sits bottom-right.
pub fn compose(strip: &Canvas, now: NaiveTime, readings: &Readings, width: u32, height: u32) -> Canvas {
    let large = MonoLabelFont::large();
    let small = MonoLabelFont::small();
    let mut frame = Canvas::new(width, height);
    frame.blit(strip, Point::zero(), 1);

    let top = strip.height() as i32 + MARGIN;

    let clock = now.format("%H:%M").to_string();
    let clock_size = scaled_size(&large, &clock, CLOCK_SCALE);
    let clock_x = (width as i32 - clock_size.width as i32).div_euclid(2);
    draw_scaled(&mut frame, &large, &clock, Point::new(clock_x, top), CLOCK_SCALE);

    if let Some(indoor) = readings.indoor {
        let text = format_reading(indoor.temperature_c);
        draw_scaled(&mut frame, &large, &text, Point::new(MARGIN, top), READING_SCALE);
    }

    if let Some(line) = readings.humidity_line() {
        infallible(small.draw(&line, Point::new(3 * MARGIN, top + 50), &mut frame));
    }

    if let Some(remote) = readings.remote {
        let text = format_reading(remote);
        draw_scaled(&mut frame, &large, &text, Point::new(MARGIN, top + 75), READING_SCALE);
    }

    if readings.offline {
        let marker = "OFFLINE";
        let size = large.measure(marker);
        let origin = Point::new(
            width as i32 - size.width as i32 - MARGIN,
            height as i32 - size.height as i32 - MARGIN,
        );
        infallible(large.draw(marker, origin, &mut frame));
    }

    frame
}

/// Start-up screen: `text` centred on an otherwise blank frame.
pub fn splash(text: &str, width: u32, height: u32) -> Canvas {
    let font = MonoLabelFont::large();
    let size = scaled_size(&font, text, READING_SCALE);
    let origin = Point::new(
        (width as i32 - size.width as i32).div_euclid(2),
        (height as i32 - size.height as i32).div_euclid(2),
    );
    let mut frame = Canvas::new(width, height);
    draw_scaled(&mut frame, &font, text, origin, READING_SCALE);
    frame
}
