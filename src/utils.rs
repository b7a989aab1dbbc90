use crate::{
    tables::CORNER_OFFSETS,
    types::{Point, Value, Vector},
};

/// Inside/outside rule shared by cube classification and the field: a value is inside
/// unless it is strictly negative, so `+inf` (a sample on a source) and NaN count as inside.
#[inline]
pub fn is_inside(value: Value) -> bool {
    value >= 0. || value.is_nan()
}

/// Returns the 8 world-space corner positions of the cube with minimum corner `origin`.
///
/// Corners follow the ordering of [`CORNER_OFFSETS`].
#[inline]
pub fn get_corner_positions(origin: &Point, size: Value) -> [Point; 8] {
    CORNER_OFFSETS.map(|[dx, dy, dz]| origin + Vector::new(dx, dy, dz) * size)
}

/// Computes the marching cubes case for a cube from its corner values.
///
/// Bit `i` is set when corner `i` is inside the surface:
///
/// ```text
/// corner index:  7  6  5  4  3  2  1  0
/// state bits:   [_][_][_][_][_][_][_][_]
///                                      ^-- corner 0 inside?
/// ```
#[inline]
pub fn get_state(corner_values: &[Value; 8]) -> u8 {
    corner_values
        .iter()
        .enumerate()
        .filter(|&(_, &v)| is_inside(v))
        .fold(0, |state, (i, _)| state | (1 << i))
}
