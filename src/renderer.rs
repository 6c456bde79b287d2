//! # Forecast Strip Rendering
//!
//! Lays the timeline out in equal-width slots and draws, per slot:
//!
//! ```text
//!  x0                         x0 + W
//!  ┌──────────── 09:00 ─────────┐  ← time label, y = 1 (inside the night band)
//!  │ 21°                        │  ← temperature, y = header + 2
//!  │            ☀ / ☾           │  ← sun or moon, by sunrise ≤ t ≤ sunset
//!  │         ☁☁☁☁☁☁☁           │  ← cloud base at header + 2·sun_r + moon_r
//!  │        ' ' ' ⚡ ' '         │  ← rain/snow 10 px below the cloud base
//!  └────────────────────────────┘
//! ```
//!
//! Icons and labels go into one layer, the night band into another; the two are
//! merged with XOR at the end of the pass.

use crate::canvas::{infallible, Canvas};
use crate::icons;
use crate::lunar::{self, PhaseError};
use crate::overlay::{self, NightOverlay};
use crate::text::{format_temperature, write_text, LabelFont, MonoLabelFont};
use crate::{AstronomicalContext, ForecastPoint, ForecastSnapshot, Timeline};
use chrono::Utc;
use embedded_graphics::prelude::*;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cloud width as a fraction of the slot width, indexed by `cloud_size`.
const CLOUD_WIDTH: [f64; 6] = [0.0, 0.3, 0.5, 0.7, 0.8, 0.8];

/// Gap between the cloud base line and the first row of precipitation.
const PRECIPITATION_DROP: i32 = 10;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("cannot place the moon: {0}")]
    Phase(#[from] PhaseError),
}

/// Fixed geometry of the strip.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripLayout {
    /// Number of forecast slots across the strip
    pub slots: usize,
    /// Strip height in pixels
    pub height: u32,
    /// Height of the label band that carries the night shading
    pub header_offset: u32,
    pub sun_radius: u32,
    pub sun_small_radius: u32,
    pub moon_radius: u32,
    pub moon_small_radius: u32,
    /// Half of the forecast granularity; each slot covers ±this many minutes
    pub half_period_minutes: u16,
    /// Step size of the lightning bolt
    pub thunder_size: u32,
}

impl Default for StripLayout {
    fn default() -> Self {
        Self {
            slots: crate::FORECAST_SLOTS,
            height: 90,
            header_offset: 14,
            sun_radius: 12,
            sun_small_radius: 10,
            moon_radius: 20,
            moon_small_radius: 16,
            half_period_minutes: 90,
            thunder_size: 5,
        }
    }
}

impl StripLayout {
    /// Base line of the cloud, below a full-size sun or moon.
    pub fn cloud_offset(&self) -> i32 {
        (self.header_offset + 2 * self.sun_radius + self.moon_radius) as i32
    }
}

/// Draws a [`Timeline`] into a 1-bit strip.
pub struct ForecastStripRenderer<F = MonoLabelFont> {
    layout: StripLayout,
    font: F,
}

impl ForecastStripRenderer<MonoLabelFont> {
    pub fn new(layout: StripLayout) -> Self {
        Self::with_font(layout, MonoLabelFont::small())
    }
}

impl<F: LabelFont> ForecastStripRenderer<F> {
    pub fn with_font(layout: StripLayout, font: F) -> Self {
        Self { layout, font }
    }

    pub fn layout(&self) -> &StripLayout {
        &self.layout
    }

    /// Render every slot of `timeline` into a fresh `width × height` canvas.
    ///
    /// Slot width is `width / timeline.capacity()`; slots past the end of a short
    /// timeline stay blank. Fails only on observer coordinates the moon model rejects.
    pub fn render(
        &self,
        timeline: &Timeline,
        ctx: &AstronomicalContext,
        width: u32,
        height: u32,
    ) -> Result<Canvas, RenderError> {
        lunar::validate_coordinates(ctx.latitude, ctx.longitude)?;

        let mut icons = Canvas::new(width, height);
        let mut mask = Canvas::new(width, height);
        let slot_width = width / timeline.capacity().max(1) as u32;
        let band_height = self.layout.header_offset.min(height);
        let night = NightOverlay::new(ctx, self.layout.half_period_minutes);

        for (index, point) in timeline.iter().enumerate() {
            let x0 = index as u32 * slot_width;
            self.draw_slot(&mut icons, point, ctx, x0 as i32, slot_width)?;
            let shaded = night.paint(&mut mask, x0, slot_width, band_height, point.minute_of_day());
            debug!(
                "slot {} at {}: {:?}, {} night columns",
                index,
                point.time.format("%H:%M"),
                point.attributes,
                shaded
            );
        }

        overlay::apply(&mut icons, &mask);
        Ok(icons)
    }

    /// Render a refresh-cycle snapshot at the layout's own strip height.
    pub fn render_snapshot(&self, snapshot: &ForecastSnapshot, width: u32) -> Result<Canvas, RenderError> {
        self.render(&snapshot.timeline, &snapshot.astro, width, self.layout.height)
    }

    fn draw_slot(
        &self,
        target: &mut Canvas,
        point: &ForecastPoint,
        ctx: &AstronomicalContext,
        x0: i32,
        slot_width: u32,
    ) -> Result<(), RenderError> {
        let layout = &self.layout;
        let attrs = point.attributes;
        let w = slot_width as i32;
        let center_x = x0 + w / 2;
        let header = layout.header_offset as i32;
        let daytime = ctx.is_daytime(point.minute_of_day());

        let time_label = point.time.format("%H:%M").to_string();
        infallible(write_text(&self.font, target, &time_label, x0, 1, Some(slot_width), None));
        infallible(write_text(
            &self.font,
            target,
            &format_temperature(point.temperature),
            x0 + 4,
            header + 2,
            None,
            None,
        ));

        let body = match attrs.sun_size {
            2 => Some((
                Point::new(center_x, header + 2 * layout.sun_radius as i32),
                layout.sun_radius,
                layout.moon_radius,
            )),
            1 => Some((
                Point::new(x0 + w * 2 / 3, header + 2 * layout.sun_small_radius as i32),
                layout.sun_small_radius,
                layout.moon_small_radius,
            )),
            _ => None,
        };
        if let Some((center, sun_r, moon_r)) = body {
            if daytime {
                infallible(icons::sun(target, center, sun_r));
            } else {
                let shape = lunar::moon_shape(ctx.latitude, ctx.longitude, point.time.with_timezone(&Utc))?;
                infallible(icons::moon(target, center, moon_r, shape));
            }
        }

        let cloud_offset = layout.cloud_offset();
        if attrs.cloud_size > 0 {
            let fraction = CLOUD_WIDTH[(attrs.cloud_size as usize).min(CLOUD_WIDTH.len() - 1)];
            let cloud_width = slot_width as f64 * fraction;
            let left = x0 as f64 + ((slot_width as f64 - cloud_width) / 2.0).floor();
            let filled = attrs.cloud_size >= 5 || attrs.thunder;
            infallible(icons::cloud(target, left, cloud_offset as f64, cloud_width, filled));
        }

        let precipitation_anchor = Point::new(center_x, cloud_offset + PRECIPITATION_DROP);
        infallible(icons::rain(target, precipitation_anchor, attrs.rain_size, attrs.rain_mask));
        infallible(icons::snow(target, precipitation_anchor, attrs.snow_size, attrs.snow_mask));

        if attrs.thunder {
            infallible(icons::thunder_bolt(
                target,
                Point::new(center_x, cloud_offset),
                layout.thunder_size,
            ));
        }
        Ok(())
    }
}

/// Down-sampled text preview: one character per `step × step` block, `#` when the
/// block holds any ink. Steps of 0 or 1 give the full-resolution [`Canvas::to_ascii`].
pub fn ascii_preview(canvas: &Canvas, step: u32) -> String {
    if step <= 1 {
        return canvas.to_ascii();
    }
    let mut out = String::new();
    for by in (0..canvas.height()).step_by(step as usize) {
        for bx in (0..canvas.width()).step_by(step as usize) {
            let ink = canvas.count_ink_in(bx, by, bx + step, by + step) > 0;
            out.push(if ink { '#' } else { '.' });
        }
        out.push('\n');
    }
    out
}

/// Print the snapshot and its rendered strip, `step` pixels per character.
pub fn draw_ascii(snapshot: &ForecastSnapshot, strip: &Canvas, step: u32) {
    if snapshot.offline {
        println!("⚠ OFFLINE\n");
    }
    println!(
        "sunrise {:02}:{:02}  sunset {:02}:{:02}",
        snapshot.astro.sunrise_minute / 60,
        snapshot.astro.sunrise_minute % 60,
        snapshot.astro.sunset_minute / 60,
        snapshot.astro.sunset_minute % 60
    );
    for point in snapshot.timeline.iter() {
        println!(
            "{}  {:>4}  {:?}",
            point.time.format("%H:%M"),
            format_temperature(point.temperature),
            point.codes
        );
    }
    println!();
    print!("{}", ascii_preview(strip, step));
}
