//! Pure geometry for rotated elliptical tone fields.
//!
//! Angles are degrees, clockwise in screen space (y grows downward), which
//! matches the SVG `rotate()` convention.

use serde::{Deserialize, Serialize};

use crate::config::{TONEFIELD_RATIO_X, TONEFIELD_RATIO_Y};

/// Below this `|sin φ|` the ellipse is treated as unrotated (or flipped).
const AXIS_ALIGNED_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Ellipse radii `(rx, ry)` for a tone field of the given size factor.
pub fn radii_from_scale(scale: f64) -> (f64, f64) {
    (scale * TONEFIELD_RATIO_X, scale * TONEFIELD_RATIO_Y)
}

/// Point on the ellipse boundary at parameter `theta`, after rotating by `phi`
/// (radians) about the center.
fn boundary_point(cx: f64, cy: f64, rx: f64, ry: f64, phi: f64, theta: f64) -> Point {
    let (sin_t, cos_t) = theta.sin_cos();
    let (sin_p, cos_p) = phi.sin_cos();
    Point {
        x: cx + rx * cos_t * cos_p - ry * sin_t * sin_p,
        y: cy + rx * cos_t * sin_p + ry * sin_t * cos_p,
    }
}

/// Lowest on-screen point (maximum `y`) of a rotated ellipse.
///
/// Solves `dy/dθ = 0`, i.e. `tan θ = (ry / rx) · cot φ`, and keeps whichever
/// of the two critical points lies lower.
pub fn ellipse_bottom_point(cx: f64, cy: f64, rx: f64, ry: f64, rotate_deg: f64) -> Point {
    let phi = rotate_deg.to_radians();
    let sin_p = phi.sin();
    if sin_p.abs() < AXIS_ALIGNED_EPSILON {
        return Point::new(cx, cy + ry);
    }

    let theta1 = ((ry / rx) / phi.tan()).atan();
    let theta2 = theta1 + std::f64::consts::PI;
    let p1 = boundary_point(cx, cy, rx, ry, phi, theta1);
    let p2 = boundary_point(cx, cy, rx, ry, phi, theta2);
    if p1.y >= p2.y {
        p1
    } else {
        p2
    }
}

/// Placement of a tone field: translate to its center, rotate, then scale
/// by `size_factor`. Drawing and hit-testing both go through this.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTransform {
    pub cx: f64,
    pub cy: f64,
    pub rotate: f64,
    pub size_factor: f64,
}

impl FieldTransform {
    pub fn new(cx: f64, cy: f64, rotate: f64, size_factor: f64) -> Self {
        FieldTransform { cx, cy, rotate, size_factor }
    }

    /// Map a point in field-local design coordinates to screen coordinates.
    pub fn apply(&self, p: Point) -> Point {
        let (sin_r, cos_r) = self.rotate.to_radians().sin_cos();
        let dx = (p.x - self.cx) * self.size_factor;
        let dy = (p.y - self.cy) * self.size_factor;
        Point {
            x: self.cx + dx * cos_r - dy * sin_r,
            y: self.cy + dx * sin_r + dy * cos_r,
        }
    }

    /// Inverse of [`apply`](Self::apply). A zero size factor collapses to the center.
    pub fn invert(&self, p: Point) -> Point {
        if self.size_factor == 0.0 {
            return Point::new(self.cx, self.cy);
        }
        let (sin_r, cos_r) = self.rotate.to_radians().sin_cos();
        let dx = p.x - self.cx;
        let dy = p.y - self.cy;
        let ux = (dx * cos_r + dy * sin_r) / self.size_factor;
        let uy = (-dx * sin_r + dy * cos_r) / self.size_factor;
        Point::new(self.cx + ux, self.cy + uy)
    }

    /// SVG `transform` attribute value.
    pub fn to_svg(&self) -> String {
        format!(
            "translate({:.2},{:.2}) rotate({:.2}) scale({:.4}) translate({:.2},{:.2})",
            self.cx, self.cy, self.rotate, self.size_factor, -self.cx, -self.cy
        )
    }

    /// Whether a screen point falls inside an ellipse of local radii `rx`/`ry`
    /// centered on the field.
    pub fn hit_test(&self, p: Point, rx: f64, ry: f64) -> bool {
        if rx <= 0.0 || ry <= 0.0 {
            return false;
        }
        let local = self.invert(p);
        let nx = (local.x - self.cx) / rx;
        let ny = (local.y - self.cy) / ry;
        nx * nx + ny * ny <= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        a.distance(b) < 1e-6
    }

    #[test]
    fn radii_keep_fixed_ratio() {
        for scale in [0.0, 146.0, 286.0, 389.7] {
            let (rx, ry) = radii_from_scale(scale);
            assert!((rx - scale * 0.3).abs() < 1e-12);
            assert!((ry - scale * 0.425).abs() < 1e-12);
        }
    }

    #[test]
    fn bottom_point_unrotated() {
        let p = ellipse_bottom_point(500.0, 500.0, 90.0, 120.0, 0.0);
        assert_eq!(p, Point::new(500.0, 620.0));
    }

    #[test]
    fn bottom_point_quarter_turn_uses_rx() {
        let p = ellipse_bottom_point(300.0, 400.0, 90.0, 120.0, 90.0);
        assert!(close(p, Point::new(300.0, 490.0)), "{p:?}");
    }

    #[test]
    fn bottom_point_continuous_through_half_turn() {
        let exact = ellipse_bottom_point(500.0, 500.0, 90.0, 120.0, 180.0);
        assert!(close(exact, Point::new(500.0, 620.0)), "{exact:?}");
        for rot in [179.999, 180.001] {
            let p = ellipse_bottom_point(500.0, 500.0, 90.0, 120.0, rot);
            assert!(p.distance(exact) < 1e-2, "rot {rot}: {p:?}");
        }
    }

    #[test]
    fn bottom_point_is_the_maximum_y_on_the_boundary() {
        let (cx, cy, rx, ry) = (661.0, 779.0, 85.8, 121.55);
        for rot in [17.0, 47.0, 121.0, 200.0, 290.0, 340.0] {
            let bottom = ellipse_bottom_point(cx, cy, rx, ry, rot);
            let phi = f64::to_radians(rot);
            for step in 0..720 {
                let theta = step as f64 * std::f64::consts::PI / 360.0;
                let p = boundary_point(cx, cy, rx, ry, phi, theta);
                assert!(p.y <= bottom.y + 1e-6, "rot {rot}: {p:?} below {bottom:?}");
            }
        }
    }

    #[test]
    fn transform_round_trips_and_hit_tests() {
        let t = FieldTransform::new(661.0, 779.0, 121.0, 1.1);
        let p = Point::new(700.0, 760.0);
        assert!(close(t.invert(t.apply(p)), p));

        // Center is always inside, a point far along the unrotated x-axis is not.
        assert!(t.hit_test(Point::new(661.0, 779.0), 85.8, 121.55));
        assert!(!t.hit_test(Point::new(661.0 + 130.0, 779.0), 10.0, 10.0));
    }

    #[test]
    fn transform_svg_string() {
        let t = FieldTransform::new(500.0, 500.0, 90.0, 1.0);
        assert_eq!(
            t.to_svg(),
            "translate(500.00,500.00) rotate(90.00) scale(1.0000) translate(-500.00,-500.00)"
        );
    }
}
