//! Small geometry helpers shared by the icon primitives.
//!
//! Icons are described in floating-point coordinates and snapped to the pixel grid
//! only when handed to embedded-graphics.

use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Circle, Rectangle},
};

/// A point in floating-point pixel coordinates.
pub type PointF = (f64, f64);

/// Rotate `point` about `center` by `angle_deg` (clockwise on screen, y grows downward).
pub fn rotate(point: PointF, center: PointF, angle_deg: f64) -> PointF {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let (dx, dy) = (point.0 - center.0, point.1 - center.1);
    (
        center.0 + cos * dx - sin * dy,
        center.1 + sin * dx + cos * dy,
    )
}

/// Rotate every vertex of a shape about `center`.
pub fn rotate_all(points: &[PointF], center: PointF, angle_deg: f64) -> Vec<PointF> {
    points
        .iter()
        .map(|&p| rotate(p, center, angle_deg))
        .collect()
}

/// Nearest pixel.
pub fn snap(point: PointF) -> Point {
    Point::new(point.0.round() as i32, point.1.round() as i32)
}

/// Circle covering the bounding box `[cx - r, cx + r]`; `None` for a non-positive radius.
pub fn disc(center: PointF, radius: f64) -> Option<Circle> {
    if radius <= 0.0 {
        return None;
    }
    let diameter = (2.0 * radius).round() as u32 + 1;
    Some(Circle::with_center(snap(center), diameter))
}

/// Rectangle spanning two inclusive corners.
pub fn rect(a: PointF, b: PointF) -> Rectangle {
    Rectangle::with_corners(snap(a), snap(b))
}

/// Fill a (possibly concave) polygon with the even-odd rule.
///
/// Pixels whose centre lies inside the polygon are set; the outline is not drawn.
pub fn fill_polygon<D>(target: &mut D, vertices: &[Point], color: BinaryColor) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    if vertices.len() < 3 {
        return Ok(());
    }

    let min_y = vertices.iter().map(|p| p.y).min().unwrap_or(0);
    let max_y = vertices.iter().map(|p| p.y).max().unwrap_or(0);
    let mut crossings: Vec<f64> = Vec::with_capacity(vertices.len());
    let mut pixels = Vec::new();

    for y in min_y..=max_y {
        let yc = y as f64 + 0.5;
        crossings.clear();

        for (i, a) in vertices.iter().enumerate() {
            let b = vertices[(i + 1) % vertices.len()];
            let (ay, by) = (a.y as f64, b.y as f64);
            if (ay <= yc && yc < by) || (by <= yc && yc < ay) {
                let t = (yc - ay) / (by - ay);
                crossings.push(a.x as f64 + t * (b.x - a.x) as f64);
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));

        for pair in crossings.chunks_exact(2) {
            let start = (pair[0] - 0.5).ceil() as i32;
            let end = (pair[1] - 0.5).floor() as i32;
            pixels.extend((start..=end).map(|x| Pixel(Point::new(x, y), color)));
        }
    }

    target.draw_iter(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;

    fn close(a: PointF, b: PointF) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let p = rotate((10.0, 0.0), (0.0, 0.0), 90.0);
        assert!(close(p, (0.0, 10.0)), "{p:?}");
    }

    #[test]
    fn test_rotate_about_center_keeps_distance() {
        let center = (40.0, 30.0);
        for angle in (0..360).step_by(30) {
            let p = rotate((40.0, 10.0), center, angle as f64);
            let dist = ((p.0 - center.0).powi(2) + (p.1 - center.1).powi(2)).sqrt();
            assert!((dist - 20.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_full_turn_is_identity() {
        let p = rotate((3.0, 7.0), (1.0, 1.0), 360.0);
        assert!(close(p, (3.0, 7.0)));
    }

    #[test]
    fn test_disc_size() {
        let c = disc((10.0, 10.0), 12.0).unwrap();
        assert_eq!(c.diameter, 25);
        assert_eq!(c.center(), Point::new(10, 10));
        assert!(disc((0.0, 0.0), 0.0).is_none());
        assert!(disc((0.0, 0.0), -1.0).is_none());
    }

    #[test]
    fn test_fill_square() {
        let mut canvas = Canvas::new(20, 20);
        let square = [
            Point::new(2, 2),
            Point::new(12, 2),
            Point::new(12, 12),
            Point::new(2, 12),
        ];
        fill_polygon(&mut canvas, &square, BinaryColor::On).unwrap();
        assert_eq!(canvas.count_ink(), 100);
        assert_eq!(canvas.pixel(2, 2), BinaryColor::On);
        assert_eq!(canvas.pixel(11, 11), BinaryColor::On);
        assert_eq!(canvas.pixel(12, 12), BinaryColor::Off);
    }

    #[test]
    fn test_fill_concave_leaves_notch_empty() {
        // "U" shape: the notch between the arms stays clear
        let mut canvas = Canvas::new(20, 20);
        let u = [
            Point::new(0, 0),
            Point::new(4, 0),
            Point::new(4, 10),
            Point::new(8, 10),
            Point::new(8, 0),
            Point::new(12, 0),
            Point::new(12, 14),
            Point::new(0, 14),
        ];
        fill_polygon(&mut canvas, &u, BinaryColor::On).unwrap();
        assert_eq!(canvas.pixel(6, 5), BinaryColor::Off);
        assert_eq!(canvas.pixel(2, 5), BinaryColor::On);
        assert_eq!(canvas.pixel(10, 5), BinaryColor::On);
        assert_eq!(canvas.pixel(6, 12), BinaryColor::On);
    }
}
