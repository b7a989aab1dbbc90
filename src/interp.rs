use crate::types::{Point, Value};

// Return the interpolation factor t corresponding to iso_val
pub fn find_t(v0: Value, v1: Value, iso_val: Value) -> Value {
    (iso_val - v0) / (v1 - v0)
}

// Weighted blend t·p1 + (1 - t)·p2
pub fn interpolate_points(p1: &Point, p2: &Point, t: Value) -> Point {
    Point::from(p1.coords * t + p2.coords * (1. - t))
}

/// Estimates where the field crosses zero on the segment `p1`-`p2` from its endpoint values.
///
/// `t = f2 / (f2 - f1)` weights `p1`, so `t = 0` lands on `p2` and `t = 1` on `p1`.
/// When `f1 == f2` the division is `0/0` or `x/0` and the point is non-finite; it is
/// returned as is.
#[inline]
pub fn zero_crossing(p1: &Point, f1: Value, p2: &Point, f2: Value) -> Point {
    let t = find_t(f2, f1, 0.);
    interpolate_points(p1, p2, t)
}
