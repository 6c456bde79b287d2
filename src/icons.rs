//! # Procedural Weather Icons
//!
//! Every icon is a stateless draw function taking an explicit target, an anchor and a
//! size. Shapes are built from circles, rectangles, triangles, polygons and line
//! segments; there are no raster sprites.
//!
//! | Icon | Anchor | Size |
//! |------|--------|------|
//! | sun | centre | disc radius; 12 rays every 30° reach 1.8 r |
//! | moon | centre | disc radius; cut-out chosen by [`MoonShape`] |
//! | cloud | left end of the base line | total width |
//! | rain drop | centre of the drop | radius; the tip points up to 2 r |
//! | snow flake | centre | arm length |
//! | thunder bolt | joint of the zig-zag | step `d`; the bolt spans 7 d vertically |
//!
//! Ink is `BinaryColor::On`. Cut-outs paint paper (`Off`), so icons layer correctly
//! when drawn in the order the renderer uses: sun/moon, cloud, precipitation, bolt.

use crate::geometry::{disc, fill_polygon, rect, rotate_all, snap, PointF};
use crate::lunar::MoonShape;
use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Line, Polyline, PrimitiveStyle, PrimitiveStyleBuilder, StrokeAlignment, Triangle},
};

const INK: BinaryColor = BinaryColor::On;
const PAPER: BinaryColor = BinaryColor::Off;

/// Vertical spacing factor between the upper and lower row of drops.
pub const RAIN_ROW_STEP: i32 = 4;
/// Vertical spacing factor between the upper and lower row of flakes.
pub const SNOW_ROW_STEP: i32 = 2;

/// Mask bits in drawing order: centre, left, right, lower-left, lower-right.
pub const POSITION_BITS: [u8; 5] = [4, 1, 2, 8, 16];

fn ring(width: u32) -> PrimitiveStyle<BinaryColor> {
    PrimitiveStyleBuilder::new()
        .stroke_color(INK)
        .stroke_width(width)
        .stroke_alignment(StrokeAlignment::Inside)
        .build()
}

fn outline_polygon<D>(target: &mut D, vertices: &[Point]) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let Some(&first) = vertices.first() else {
        return Ok(());
    };
    let mut closed = vertices.to_vec();
    closed.push(first);
    Polyline::new(&closed)
        .into_styled(PrimitiveStyle::with_stroke(INK, 1))
        .draw(target)
}

fn to_f(point: Point) -> PointF {
    (point.x as f64, point.y as f64)
}

/// Outlined disc with 12 trapezoid rays.
pub fn sun<D>(target: &mut D, center: Point, radius: u32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let (x, y) = to_f(center);
    let r = radius as f64;

    if let Some(body) = disc((x, y), r) {
        body.into_styled(ring(2)).draw(target)?;
    }

    let ray = [
        (x - 1.0, y - r * 1.8),
        (x + 1.0, y - r * 1.8),
        (x + 1.0, y - r - 3.0),
        (x - 1.0, y - r - 3.0),
    ];
    for angle in (0..360).step_by(30) {
        let vertices: Vec<Point> = rotate_all(&ray, (x, y), angle as f64)
            .into_iter()
            .map(snap)
            .collect();
        outline_polygon(target, &vertices)?;
    }
    Ok(())
}

/// Dark disc with a phase-dependent cut-out and a thin outline.
pub fn moon<D>(target: &mut D, center: Point, radius: u32, shape: MoonShape) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let (x, y) = to_f(center);
    let r = radius as f64;
    let Some(body) = disc((x, y), r) else {
        return Ok(());
    };

    body.into_styled(PrimitiveStyle::with_fill(INK)).draw(target)?;
    match shape {
        MoonShape::Crescent => {
            if let Some(shadow) = disc((x - r / 2.0, y), r) {
                shadow
                    .into_styled(PrimitiveStyle::with_fill(PAPER))
                    .draw(target)?;
            }
        }
        MoonShape::Half => {
            rect((x - r, y - r), (x, y + r))
                .into_styled(PrimitiveStyle::with_fill(PAPER))
                .draw(target)?;
        }
        MoonShape::Full => {}
    }
    body.into_styled(ring(1)).draw(target)
}

/// Cloud silhouette sitting on the line `y`, starting at `x`, `width` pixels wide.
///
/// Four overlapping discs of decreasing size joined by a rectangle. Unless `filled`,
/// the same shape shrunk by `width / 20` is cut back out, leaving an outline.
pub fn cloud<D>(target: &mut D, x: f64, y: f64, width: f64, filled: bool) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let r1 = width / 4.0;
    let r2 = width / 6.0;
    let r3 = width / 8.0;
    let stroke = width / 20.0;

    let lobes = [
        ((x + r1 + r2 * 1.2, y - r1), r1),
        ((x + r2, y - r2), r2),
        ((x + width - r3, y - r3), r3),
        ((x + width - r3 * 2.0, y - r3 * 1.5), r3),
    ];

    for &(center, radius) in &lobes {
        if let Some(lobe) = disc(center, radius) {
            lobe.into_styled(PrimitiveStyle::with_fill(INK)).draw(target)?;
        }
    }
    rect((x + r2, y - r3 * 2.0), (x + width - r3, y))
        .into_styled(PrimitiveStyle::with_fill(INK))
        .draw(target)?;

    if filled {
        return Ok(());
    }

    for &(center, radius) in &lobes {
        if let Some(hole) = disc(center, radius - stroke) {
            hole.into_styled(PrimitiveStyle::with_fill(PAPER)).draw(target)?;
        }
    }
    rect((x + r2, y - r3 * 1.5), (x + width - r3, y - stroke))
        .into_styled(PrimitiveStyle::with_fill(PAPER))
        .draw(target)
}

/// Round drop outline with a solid triangular tip.
pub fn rain_drop<D>(target: &mut D, center: Point, size: u32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let (x, y) = to_f(center);
    let r = size as f64;
    if let Some(body) = disc((x, y), r) {
        body.into_styled(ring(1)).draw(target)?;
    }
    Triangle::new(snap((x - r, y)), snap((x, y - r * 2.0)), snap((x + r, y)))
        .into_styled(PrimitiveStyle::with_fill(INK))
        .draw(target)
}

/// Six-armed asterisk: one segment through the centre rotated in 120° steps.
pub fn snow_flake<D>(target: &mut D, center: Point, size: u32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let (x, y) = to_f(center);
    let r = size as f64;
    let arm = [(x, y - r), (x, y + r)];
    for angle in (0..360).step_by(120) {
        let ends = rotate_all(&arm, (x, y), angle as f64);
        Line::new(snap(ends[0]), snap(ends[1]))
            .into_styled(PrimitiveStyle::with_stroke(INK, 1))
            .draw(target)?;
    }
    Ok(())
}

/// Zig-zag lightning bolt, paper-filled with an ink outline so it reads on a dark cloud.
pub fn thunder_bolt<D>(target: &mut D, anchor: Point, step: u32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let (x, y) = to_f(anchor);
    let d = step as f64;
    let vertices: Vec<Point> = [
        (x, y),
        (x - d, y),
        (x, y - d * 4.0),
        (x + d, y - d * 4.0),
        (x + d / 2.0, y - d),
        (x + d * 1.5, y - d),
        (x - d / 2.0, y + d * 3.0),
    ]
    .into_iter()
    .map(snap)
    .collect();

    fill_polygon(target, &vertices, PAPER)?;
    outline_polygon(target, &vertices)
}

/// Offsets from the slot anchor for each populated mask position, in drawing order.
///
/// Horizontal spacing is `4 × size`, the lower row sits `row_step × size` below and
/// halfway in, so larger icons spread out instead of overlapping.
pub fn precipitation_offsets(mask: u8, size: u8, row_step: i32) -> Vec<Point> {
    let s = size as i32;
    POSITION_BITS
        .iter()
        .filter(|&&bit| mask & bit != 0)
        .map(|&bit| match bit {
            1 => Point::new(-4 * s, 0),
            2 => Point::new(4 * s, 0),
            8 => Point::new(-2 * s, row_step * s),
            16 => Point::new(2 * s, row_step * s),
            _ => Point::zero(),
        })
        .collect()
}

/// Drops for a rain mask around `anchor`.
pub fn rain<D>(target: &mut D, anchor: Point, size: u8, mask: u8) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    if size == 0 {
        return Ok(());
    }
    for offset in precipitation_offsets(mask, size, RAIN_ROW_STEP) {
        rain_drop(target, anchor + offset, size as u32)?;
    }
    Ok(())
}

/// Flakes for a snow mask around `anchor`.
pub fn snow<D>(target: &mut D, anchor: Point, size: u8, mask: u8) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    if size == 0 {
        return Ok(());
    }
    for offset in precipitation_offsets(mask, size, SNOW_ROW_STEP) {
        snow_flake(target, anchor + offset, size as u32)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use embedded_graphics::mock_display::MockDisplay;

    #[test]
    fn test_sun_on_mock_display() {
        let mut display = MockDisplay::<BinaryColor>::new();
        display.set_allow_overdraw(true);

        sun(&mut display, Point::new(32, 32), 12).unwrap();

        // Hollow body, two-pixel ring
        assert_eq!(display.get_pixel(Point::new(32, 32)), None);
        assert_eq!(display.get_pixel(Point::new(32, 20)), Some(BinaryColor::On));
        assert_eq!(display.get_pixel(Point::new(32, 21)), Some(BinaryColor::On));
        // Upright ray: left edge of the trapezoid
        assert_eq!(display.get_pixel(Point::new(31, 13)), Some(BinaryColor::On));
    }

    #[test]
    fn test_sun_has_twelve_rays() {
        let mut canvas = Canvas::new(64, 64);
        sun(&mut canvas, Point::new(32, 32), 12).unwrap();

        // Sample halfway along each ray and halfway between neighbouring rays
        let at = |angle_deg: f64| {
            let a = angle_deg.to_radians();
            (
                (32.0 + 18.0 * a.sin()).round() as u32,
                (32.0 - 18.0 * a.cos()).round() as u32,
            )
        };
        for k in 0..12 {
            let (x, y) = at(k as f64 * 30.0);
            assert!(
                canvas.count_ink_in(x - 1, y - 1, x + 2, y + 2) > 0,
                "ray {k} missing"
            );
            let (gx, gy) = at(k as f64 * 30.0 + 15.0);
            assert_eq!(canvas.pixel(gx, gy), BinaryColor::Off, "gap after ray {k}");
        }
    }

    #[test]
    fn test_moon_shapes() {
        let center = Point::new(30, 30);

        let mut crescent = Canvas::new(64, 64);
        moon(&mut crescent, center, 20, MoonShape::Crescent).unwrap();
        assert_eq!(crescent.pixel(45, 30), BinaryColor::On);
        assert_eq!(crescent.pixel(25, 30), BinaryColor::Off);
        assert_eq!(crescent.pixel(10, 30), BinaryColor::On, "outline");

        let mut half = Canvas::new(64, 64);
        moon(&mut half, center, 20, MoonShape::Half).unwrap();
        assert_eq!(half.pixel(25, 30), BinaryColor::Off);
        assert_eq!(half.pixel(35, 30), BinaryColor::On);

        let mut full = Canvas::new(64, 64);
        moon(&mut full, center, 20, MoonShape::Full).unwrap();
        assert_eq!(full.pixel(25, 30), BinaryColor::On);
        assert_eq!(full.pixel(35, 30), BinaryColor::On);
        assert!(full.count_ink() > crescent.count_ink());
        assert!(full.count_ink() > half.count_ink());
    }

    #[test]
    fn test_cloud_outline_and_filled() {
        let mut outline = Canvas::new(100, 80);
        cloud(&mut outline, 10.0, 60.0, 70.0, false).unwrap();
        let mut solid = Canvas::new(100, 80);
        cloud(&mut solid, 10.0, 60.0, 70.0, true).unwrap();

        // Centre of the largest lobe
        assert_eq!(outline.pixel(42, 43), BinaryColor::Off);
        assert_eq!(solid.pixel(42, 43), BinaryColor::On);
        assert!(outline.count_ink() > 0);
        assert!(solid.count_ink() > outline.count_ink());
        // Nothing below the base line
        assert_eq!(solid.count_ink_in(0, 62, 100, 80), 0);
    }

    #[test]
    fn test_rain_drop_tip() {
        let mut canvas = Canvas::new(40, 40);
        rain_drop(&mut canvas, Point::new(20, 20), 3).unwrap();
        assert_eq!(canvas.pixel(20, 17), BinaryColor::On);
        assert_eq!(canvas.pixel(20, 14), BinaryColor::On);
        assert_eq!(canvas.count_ink_in(0, 0, 40, 13), 0);
    }

    #[test]
    fn test_snow_flake_arms() {
        let mut canvas = Canvas::new(40, 40);
        snow_flake(&mut canvas, Point::new(20, 20), 5).unwrap();
        assert_eq!(canvas.pixel(20, 20), BinaryColor::On);
        assert_eq!(canvas.pixel(20, 15), BinaryColor::On);
        assert_eq!(canvas.pixel(20, 25), BinaryColor::On);
        assert_eq!(canvas.count_ink_in(0, 0, 40, 14), 0);
        assert_eq!(canvas.count_ink_in(0, 26, 40, 40), 0);
    }

    #[test]
    fn test_thunder_bolt_cuts_through_ink() {
        let mut canvas = Canvas::filled(80, 80, BinaryColor::On);
        thunder_bolt(&mut canvas, Point::new(40, 40), 5).unwrap();
        assert_eq!(canvas.pixel(41, 27), BinaryColor::Off, "bolt interior");
        assert_eq!(canvas.pixel(40, 20), BinaryColor::On, "bolt outline");
        assert_eq!(canvas.pixel(10, 10), BinaryColor::On, "untouched cloud");
    }

    #[test]
    fn test_precipitation_offsets() {
        assert_eq!(
            precipitation_offsets(7, 5, SNOW_ROW_STEP),
            vec![Point::new(0, 0), Point::new(-20, 0), Point::new(20, 0)]
        );
        assert_eq!(
            precipitation_offsets(24, 3, RAIN_ROW_STEP),
            vec![Point::new(-6, 12), Point::new(6, 12)]
        );
        assert_eq!(precipitation_offsets(31, 2, RAIN_ROW_STEP).len(), 5);
        assert!(precipitation_offsets(0, 4, RAIN_ROW_STEP).is_empty());
    }

    #[test]
    fn test_zero_size_precipitation_draws_nothing() {
        let mut canvas = Canvas::new(40, 40);
        rain(&mut canvas, Point::new(20, 20), 0, 31).unwrap();
        snow(&mut canvas, Point::new(20, 20), 0, 31).unwrap();
        assert_eq!(canvas.count_ink(), 0);
    }
}
