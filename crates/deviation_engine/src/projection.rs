//! Planar projection of a test point onto a bracketing pair.

use contracts::ProjectionMode;
use nalgebra::Vector2;

/// Result of projecting `p` onto the line through `a` and `b`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Foot of the perpendicular (the error point)
    pub foot: Vector2<f64>,
    /// Signed distance from `a` along `a -> b`
    pub along: f64,
    /// Distance from `p` to `foot`
    pub distance: f64,
}

#[inline]
pub fn to_vector(xy: [f64; 2]) -> Vector2<f64> {
    Vector2::new(xy[0], xy[1])
}

/// Planar length of `a -> b`
#[inline]
pub fn segment_length(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    (b - a).norm()
}

/// Project `p` onto the line (or segment) through `a` and `b`.
///
/// The caller guarantees `a != b`; a zero-length pair yields NaN.
pub fn project(
    a: &Vector2<f64>,
    b: &Vector2<f64>,
    p: &Vector2<f64>,
    mode: ProjectionMode,
) -> Projection {
    let ab = b - a;
    let length = ab.norm();

    let mut along = (p - a).dot(&ab) / length;
    if mode == ProjectionMode::Segment {
        along = along.clamp(0.0, length);
    }

    let foot = a + ab / length * along;
    Projection {
        foot,
        along,
        distance: (p - foot).norm(),
    }
}

/// Perpendicular distance from `p` to the infinite line through `a` and `b`
/// (cross-product form).
pub fn point_to_line_distance(a: &Vector2<f64>, b: &Vector2<f64>, p: &Vector2<f64>) -> f64 {
    let ab = b - a;
    let ap = p - a;
    (ab.x * ap.y - ab.y * ap.x).abs() / ab.norm()
}
