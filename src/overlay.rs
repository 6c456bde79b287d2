//! Day/night shading band
//!
//! Each slot covers `[t - half, t + half]` minutes around its forecast time. The part
//! of that window outside `[sunrise, sunset]` is painted into a separate mask layer,
//! which the renderer XORs onto the icon layer so night spans come out inverted.

use crate::canvas::Canvas;
use crate::{AstronomicalContext, MINUTES_PER_DAY};
use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
};
use std::ops::Range;

/// Night-span calculator for one refresh cycle.
#[derive(Clone, Copy, Debug)]
pub struct NightOverlay {
    sunrise: i32,
    sunset: i32,
    half_period: i32,
}

impl NightOverlay {
    pub fn new(astro: &AstronomicalContext, half_period_minutes: u16) -> Self {
        Self {
            sunrise: astro.sunrise_minute as i32,
            sunset: astro.sunset_minute as i32,
            half_period: half_period_minutes.max(1) as i32,
        }
    }

    fn sun_never_sets(&self) -> bool {
        self.sunrise == 0 && self.sunset >= MINUTES_PER_DAY as i32 - 1
    }

    fn sun_never_rises(&self) -> bool {
        self.sunset <= self.sunrise
    }

    /// Columns of a slot (relative to its left edge, half-open) that lie in the night.
    ///
    /// `None` for a slot that is daylight from end to end.
    pub fn span(&self, minute: u16, slot_width: u32) -> Option<Range<u32>> {
        if slot_width == 0 || self.sun_never_sets() {
            return None;
        }
        if self.sun_never_rises() {
            return Some(0..slot_width);
        }

        let t = minute as i32;
        let start = t - self.half_period;
        let end = t + self.half_period;
        let window = 2 * self.half_period;
        let column = |m: i32| ((m - start) as i64 * slot_width as i64 / window as i64) as u32;

        if end <= self.sunrise || start >= self.sunset {
            Some(0..slot_width)
        } else if start < self.sunrise && self.sunrise < end {
            Some(0..column(self.sunrise))
        } else if start < self.sunset && self.sunset < end {
            Some(column(self.sunset)..slot_width)
        } else {
            None
        }
    }

    /// Paint the night part of one slot into `mask`, `band_height` rows from the top.
    ///
    /// Returns the number of shaded columns.
    pub fn paint(&self, mask: &mut Canvas, slot_x: u32, slot_width: u32, band_height: u32, minute: u16) -> u32 {
        let Some(span) = self.span(minute, slot_width) else {
            return 0;
        };
        let columns = span.end.saturating_sub(span.start);
        if columns == 0 || band_height == 0 {
            return 0;
        }

        let area = Rectangle::new(
            Point::new((slot_x + span.start) as i32, 0),
            Size::new(columns, band_height),
        );
        crate::canvas::infallible(
            area.into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
                .draw(mask),
        );
        columns
    }
}

/// Merge a night mask into the icon layer; applying the same mask twice undoes it.
pub fn apply(icons: &mut Canvas, mask: &Canvas) {
    icons.xor_with(mask);
}
