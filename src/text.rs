//! Label text rendering
//!
//! The strip only needs two capabilities from a font: measure a string and draw it
//! at a top-left position. [`LabelFont`] captures that boundary; [`MonoLabelFont`]
//! implements it with the embedded-graphics mono fonts (ISO 8859-1 variants, so the
//! degree sign is available).

use embedded_graphics::{
    mono_font::{iso_8859_1, MonoFont, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{renderer::TextRenderer, Baseline, Text},
};

/// Measure-and-draw capability used for time and temperature labels.
pub trait LabelFont {
    /// Bounding box size of `text` when drawn.
    fn measure(&self, text: &str) -> Size;

    /// Draw `text` with its bounding box's top-left corner at `top_left`.
    fn draw<D>(&self, text: &str, top_left: Point, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>;
}

/// Mono bitmap font drawn in ink.
#[derive(Clone, Copy)]
pub struct MonoLabelFont {
    font: &'static MonoFont<'static>,
}

impl MonoLabelFont {
    pub fn new(font: &'static MonoFont<'static>) -> Self {
        Self { font }
    }

    /// 7×13, fits the 14 px header band of the strip.
    pub fn small() -> Self {
        Self::new(&iso_8859_1::FONT_7X13)
    }

    /// 10×20, used for dashboard readings and the scaled clock.
    pub fn large() -> Self {
        Self::new(&iso_8859_1::FONT_10X20)
    }

    fn style(&self) -> MonoTextStyle<'static, BinaryColor> {
        MonoTextStyle::new(self.font, BinaryColor::On)
    }
}

impl Default for MonoLabelFont {
    fn default() -> Self {
        Self::small()
    }
}

impl LabelFont for MonoLabelFont {
    fn measure(&self, text: &str) -> Size {
        self.style()
            .measure_string(text, Point::zero(), Baseline::Top)
            .bounding_box
            .size
    }

    fn draw<D>(&self, text: &str, top_left: Point, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        Text::with_baseline(text, top_left, self.style(), Baseline::Top).draw(target)?;
        Ok(())
    }
}

/// Draw `text` at `(x, y)`, centred inside `width` and/or `height` when given.
///
/// Centring uses floor division, so text wider than its box starts left of `x`.
pub fn write_text<F, D>(
    font: &F,
    target: &mut D,
    text: &str,
    x: i32,
    y: i32,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<(), D::Error>
where
    F: LabelFont,
    D: DrawTarget<Color = BinaryColor>,
{
    let size = font.measure(text);
    let mut origin = Point::new(x, y);
    if let Some(w) = width {
        origin.x += (w as i32 - size.width as i32).div_euclid(2);
    }
    if let Some(h) = height {
        origin.y += (h as i32 - size.height as i32).div_euclid(2);
    }
    font.draw(text, origin, target)
}

/// `21.7` → `"21°"`; the fraction is truncated toward zero like the provider's own
/// whole-degree display.
pub fn format_temperature(value: f32) -> String {
    format!("{}°", value.trunc() as i32)
}

/// One-decimal reading with a degree sign, e.g. `"12.3°"`.
pub fn format_reading(value: f32) -> String {
    format!("{:.1}°", value)
}
