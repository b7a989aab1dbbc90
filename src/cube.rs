use crate::{
    field::MetaballField,
    interp::zero_crossing,
    mesh::MeshAssembler,
    normal::estimate_normal,
    tables::{CORNER_POINT_INDICES, TRIANGLE_COUNTS, case_triangles},
    types::{Point, Value},
    utils::{get_corner_positions, get_state},
};

/// One axis-aligned sample cell, identified by its minimum corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cube {
    pub origin: Point,
    pub size: Value,
}

/// A cube's corners sampled against the field, with its case index.
#[derive(Debug, Clone, Copy)]
pub struct CubeCase {
    /// Bit `i` set when corner `i` is inside.
    pub mask: u8,
    pub corners: [Point; 8],
    pub values: [Value; 8],
}

impl Cube {
    pub fn new(origin: Point, size: Value) -> Self {
        Self { origin, size }
    }

    /// Evaluates the field at the 8 corners and builds the case mask.
    pub fn classify(&self, field: &MetaballField) -> CubeCase {
        let corners = get_corner_positions(&self.origin, self.size);
        let values = corners.map(|p| field.evaluate(&p));
        CubeCase {
            mask: get_state(&values),
            corners,
            values,
        }
    }
}

impl CubeCase {
    pub fn triangle_count(&self) -> usize {
        TRIANGLE_COUNTS[self.mask as usize] as usize
    }

    /// Triangles of this case, each as three edge indices.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> {
        case_triangles(self.mask)
    }

    /// Zero crossing of the field along `edge`, linearly interpolated from the corner values.
    #[inline]
    pub fn edge_point(&self, edge: usize) -> Point {
        let [a, b] = CORNER_POINT_INDICES[edge];
        zero_crossing(&self.corners[a], self.values[a], &self.corners[b], self.values[b])
    }

    /// Appends this case's triangles to `mesh`, with a field normal at every vertex.
    ///
    /// Returns the number of triangles emitted.
    pub fn emit(&self, field: &MetaballField, epsilon: Value, mesh: &mut MeshAssembler) -> usize {
        for edges in self.triangles() {
            for edge in edges {
                let p = self.edge_point(edge);
                mesh.append(&p, &estimate_normal(field, &p, epsilon));
            }
        }
        self.triangle_count()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{normal::DEFAULT_NORMAL_EPSILON, types::Vector};

    fn unit_ball_at(center: Point) -> MetaballField {
        let mut field = MetaballField::new(1.).unwrap();
        field.refresh([center]);
        field
    }

    #[test]
    fn far_cube_is_outside() {
        let field = unit_ball_at(Point::origin());
        let case = Cube::new(Point::new(5., 5., 5.), 1.).classify(&field);
        assert_eq!(case.mask, 0);
        assert_eq!(case.triangle_count(), 0);
    }

    #[test]
    fn enclosed_cube_is_inside() {
        let field = unit_ball_at(Point::origin());
        let case = Cube::new(Point::new(-0.25, -0.25, -0.25), 0.5).classify(&field);
        assert_eq!(case.mask, 0xFF);
        assert_eq!(case.triangles().count(), 0);
    }

    #[test]
    fn corner_inside_cuts_one_triangle() {
        // only corner 0 lies within the unit ball
        let field = unit_ball_at(Point::origin());
        let cube = Cube::new(Point::new(0.5, 0.5, 0.5), 1.);
        let case = cube.classify(&field);
        assert_eq!(case.mask, 0b0000_0001);
        assert_eq!(case.triangle_count(), 1);

        let mut mesh = MeshAssembler::new();
        assert_eq!(case.emit(&field, DEFAULT_NORMAL_EPSILON, &mut mesh), 1);
        let snapshot = mesh.snapshot();
        assert_eq!(snapshot.indices, &[0, 1, 2]);

        for (v, n) in snapshot.vertices.iter().zip(snapshot.normals) {
            let p = Point::from(*v);
            // each vertex lies on an edge leaving corner 0 where f changes sign
            assert!(field.evaluate(&p).abs() < 0.2, "{p:?}");
            assert!((0..3).filter(|&axis| (p[axis] - 0.5).abs() < 1e-6).count() >= 2);
            assert_relative_eq!(Vector::from(*n).norm(), 1., epsilon = 1e-5);
            assert!(Vector::from(*n).dot(&p.coords) > 0.);
        }
    }

    #[test]
    fn edge_point_matches_the_linear_estimate() {
        let field = unit_ball_at(Point::origin());
        let case = Cube::new(Point::new(0.5, -0.25, -0.25), 1.).classify(&field);
        // edge 0 runs from corner 0 (0.5, -0.25, -0.25) to corner 1 (1.5, -0.25, -0.25)
        let (f1, f2) = (case.values[0], case.values[1]);
        assert!(f1 > 0. && f2 < 0.);
        let t = f2 / (f2 - f1);
        let expected = 0.5 * t + 1.5 * (1. - t);
        assert_relative_eq!(case.edge_point(0).x, expected, epsilon = 1e-6);
        assert_relative_eq!(case.edge_point(0).y, -0.25, epsilon = 1e-6);
    }
}
