use serde::{Deserialize, Serialize};

/// A point in normalized image space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Angle at vertex `b` formed by `b→a` and `b→c`, in degrees within [0, 180].
pub fn angle(a: Point, b: Point, c: Point) -> f64 {
    let radians = (c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x);
    let degrees = radians.to_degrees().abs();
    if degrees > 180.0 {
        360.0 - degrees
    } else {
        degrees
    }
}

/// Like [`angle`], but returns `None` when the geometry is degenerate: a
/// non-finite coordinate or an arm of zero length.
pub fn checked_angle(a: Point, b: Point, c: Point) -> Option<f64> {
    let finite = [a, b, c].iter().all(|p| p.x.is_finite() && p.y.is_finite());
    if !finite || a == b || c == b {
        return None;
    }

    let degrees = angle(a, b, c);
    degrees.is_finite().then_some(degrees)
}
