use crate::{
    field::MetaballField,
    types::{Point, Value, Vector},
};

/// Default central-difference step, in world units.
pub const DEFAULT_NORMAL_EPSILON: Value = 0.001;

/// Shortest difference vector that is still normalised; anything shorter (or NaN) yields zero.
pub const MIN_NORMAL_LENGTH: Value = 1e-5;

/// Estimates the outward surface normal at `p` by central differences of the field.
///
/// Each component is `f(p - ε·axis) - f(p + ε·axis)`: the field grows towards the
/// sources, so the negated gradient points out of the surface. A difference vector
/// that is too short to normalise, or not finite, gives the zero vector.
pub fn estimate_normal(field: &MetaballField, p: &Point, epsilon: Value) -> Vector {
    let diff = Vector::from_fn(|axis, _| {
        let step = Vector::ith(axis, epsilon);
        field.evaluate(&(p - step)) - field.evaluate(&(p + step))
    });

    let length = diff.norm();
    if length > MIN_NORMAL_LENGTH && length.is_finite() {
        diff / length
    } else {
        Vector::zeros()
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;

    fn field(sources: &[Point]) -> MetaballField {
        let mut field = MetaballField::new(1.).unwrap();
        field.refresh(sources.iter().copied());
        field
    }

    #[test]
    fn sphere_normals_point_away_from_the_source() {
        let center = Point::new(1., -2., 0.5);
        let f = field(&[center]);
        for dir in [
            Vector::x(),
            -Vector::y(),
            Vector::z(),
            Vector::new(1., 1., -1.).normalize(),
        ] {
            let n = estimate_normal(&f, &(center + dir), DEFAULT_NORMAL_EPSILON);
            assert_relative_eq!(n.norm(), 1., epsilon = 1e-5);
            assert_abs_diff_eq!(n, dir, epsilon = 1e-3);
        }
    }

    #[test]
    fn symmetric_point_has_no_normal() {
        // midway between two equal sources the differences cancel exactly
        let f = field(&[Point::new(-1., 0., 0.), Point::new(1., 0., 0.)]);
        assert_eq!(estimate_normal(&f, &Point::origin(), DEFAULT_NORMAL_EPSILON), Vector::zeros());
    }

    #[test]
    fn non_finite_point_has_no_normal() {
        let f = field(&[Point::origin()]);
        let p = Point::new(Value::NAN, 0., 0.);
        assert_eq!(estimate_normal(&f, &p, DEFAULT_NORMAL_EPSILON), Vector::zeros());
    }
}
