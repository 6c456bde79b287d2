//! 1-bit canvas
//!
//! Packed monochrome bitmap in the row layout e-paper controllers expect: each row
//! is `ceil(width / 8)` bytes, most significant bit first. A set bit is ink
//! (`BinaryColor::On`, black on the panel); a cleared bit is paper.
//!
//! The canvas is an embedded-graphics [`DrawTarget`], so every primitive in the
//! icon and text modules draws straight into it.

use core::convert::Infallible;
use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};

/// Fixed-size 1-bit bitmap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    bits: Vec<u8>,
}

impl Canvas {
    /// Blank (all paper) canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, BinaryColor::Off)
    }

    pub fn filled(width: u32, height: u32, color: BinaryColor) -> Self {
        // Buffer size: each row has (width+7)/8 bytes, total height rows
        let bytes_per_row = width.div_ceil(8);
        let buffer_size = (bytes_per_row * height) as usize;
        let fill = if color.is_on() { 0xFF } else { 0x00 };
        Self {
            width,
            height,
            bits: vec![fill; buffer_size],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Packed rows, 1 = ink.
    pub fn bytes(&self) -> &[u8] {
        &self.bits
    }

    fn bytes_per_row(&self) -> u32 {
        self.width.div_ceil(8)
    }

    fn locate(&self, x: u32, y: u32) -> (usize, u8) {
        let byte_index = (y * self.bytes_per_row() + x / 8) as usize;
        (byte_index, 0x80 >> (x % 8))
    }

    /// Pixel colour; anything outside the canvas reads as paper.
    pub fn pixel(&self, x: u32, y: u32) -> BinaryColor {
        if x >= self.width || y >= self.height {
            return BinaryColor::Off;
        }
        let (index, mask) = self.locate(x, y);
        BinaryColor::from(self.bits[index] & mask != 0)
    }

    /// Set one pixel; writes outside the canvas are clipped.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: BinaryColor) {
        if x >= self.width || y >= self.height {
            return;
        }
        let (index, mask) = self.locate(x, y);
        match color {
            BinaryColor::On => self.bits[index] |= mask,
            BinaryColor::Off => self.bits[index] &= !mask,
        }
    }

    /// Number of ink pixels.
    pub fn count_ink(&self) -> usize {
        let mut total = 0;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.pixel(x, y).is_on() {
                    total += 1;
                }
            }
        }
        total
    }

    /// Ink pixels inside `[x0, x1) × [y0, y1)`.
    pub fn count_ink_in(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> usize {
        (y0..y1.min(self.height))
            .flat_map(|y| (x0..x1.min(self.width)).map(move |x| (x, y)))
            .filter(|&(x, y)| self.pixel(x, y).is_on())
            .count()
    }

    /// Pixel-wise logical XOR with a layer of the same size.
    ///
    /// Applying the same layer twice restores the original image.
    pub fn xor_with(&mut self, layer: &Canvas) {
        debug_assert_eq!(
            (self.width, self.height),
            (layer.width, layer.height),
            "layers must share dimensions"
        );
        if (self.width, self.height) != (layer.width, layer.height) {
            // Fall back to pixel-wise over the overlap
            for y in 0..self.height.min(layer.height) {
                for x in 0..self.width.min(layer.width) {
                    if layer.pixel(x, y).is_on() {
                        let flipped = self.pixel(x, y).invert();
                        self.set_pixel(x, y, flipped);
                    }
                }
            }
            return;
        }
        for (dst, src) in self.bits.iter_mut().zip(&layer.bits) {
            *dst ^= *src;
        }
    }

    /// Copy `source` with its top-left corner at `origin`, each source pixel becoming
    /// a `scale × scale` block. Only ink is copied; paper leaves the target untouched.
    pub fn blit(&mut self, source: &Canvas, origin: Point, scale: u32) {
        let scale = scale.max(1) as i32;
        for sy in 0..source.height {
            for sx in 0..source.width {
                if source.pixel(sx, sy).is_off() {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let x = origin.x + sx as i32 * scale + dx;
                        let y = origin.y + sy as i32 * scale + dy;
                        if x >= 0 && y >= 0 {
                            self.set_pixel(x as u32, y as u32, BinaryColor::On);
                        }
                    }
                }
            }
        }
    }

    /// Binary PBM (`P4`) image; its bit convention (1 = black) matches ours.
    pub fn to_pbm(&self) -> Vec<u8> {
        let mut out = format!("P4\n{} {}\n", self.width, self.height).into_bytes();
        out.extend_from_slice(&self.bits);
        out
    }

    /// Text preview, one character per pixel (`#` = ink).
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(((self.width + 1) * self.height) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                out.push(if self.pixel(x, y).is_on() { '#' } else { '.' });
            }
            out.push('\n');
        }
        out
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Canvas {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as u32, point.y as u32, color);
            }
        }
        Ok(())
    }
}

/// Unwrap a draw result whose error type cannot be constructed.
pub fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}
