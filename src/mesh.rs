use bevy::prelude::Component;

use crate::types::{Point, Vector, Vertex};

/// Output of one extraction cycle, ready to hand to a renderer.
///
/// Three parallel buffers: `vertices[i]` and `normals[i]` describe vertex `i`, and
/// every three consecutive `indices` form one triangle. Vertices are never shared
/// between triangles, so `indices` is simply `0, 1, 2, ...`.
///
/// Triangles keep the winding of the case table: clockwise seen from outside the
/// surface. Use [`counter_clockwise_indices`](GeneratedMesh::counter_clockwise_indices)
/// for renderers whose front faces are counter-clockwise.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct GeneratedMesh {
    /// Vertex positions: `[[x, y, z], ...]`
    pub vertices: Vec<Vertex>,

    /// Unit outward normals, one per vertex (zero where none could be estimated).
    pub normals: Vec<Vertex>,

    /// Flat triangle list into `vertices`.
    pub indices: Vec<u32>,
}

impl GeneratedMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Returns the three vertex positions of triangle `tri`.
    pub fn triangle(&self, tri: usize) -> [Point; 3] {
        let corner = |k: usize| Point::from(self.vertices[self.indices[3 * tri + k] as usize]);
        [corner(0), corner(1), corner(2)]
    }

    /// Computes the right-handed face normal of triangle `tri`.
    ///
    /// With the table winding this points into the surface. Returns the zero vector
    /// if the triangle is degenerate.
    pub fn face_normal(&self, tri: usize) -> Vector {
        let [a, b, c] = self.triangle(tri);
        let cross = (b - a).cross(&(c - b));

        let nrm = cross.norm();
        if nrm == 0.0 {
            Vector::zeros()
        } else {
            cross / nrm
        }
    }

    /// Number of vertices with a NaN or infinite coordinate.
    pub fn non_finite_vertices(&self) -> usize {
        self.vertices
            .iter()
            .filter(|v| !v.iter().all(|c| c.is_finite()))
            .count()
    }

    /// Index buffer with every triangle's winding reversed.
    pub fn counter_clockwise_indices(&self) -> Vec<u32> {
        self.indices
            .chunks_exact(3)
            .flat_map(|tri| [tri[0], tri[2], tri[1]])
            .collect()
    }
}

/// Borrowed view of the buffers of the cycle in progress.
#[derive(Debug, Clone, Copy)]
pub struct MeshSnapshot<'a> {
    pub vertices: &'a [Vertex],
    pub normals: &'a [Vertex],
    pub indices: &'a [u32],
}

/// Accumulates the vertices, normals and indices emitted during a cycle.
///
/// Every appended vertex gets a fresh index; nothing is welded. Indices are `u32`, so a
/// mesh holds at most `u32::MAX + 1` vertices (checked in debug builds).
#[derive(Debug, Clone, Default)]
pub struct MeshAssembler {
    vertices: Vec<Vertex>,
    normals: Vec<Vertex>,
    indices: Vec<u32>,
}

impl MeshAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all three buffers, keeping their allocations.
    pub fn reset(&mut self) {
        self.vertices.clear();
        self.normals.clear();
        self.indices.clear();
    }

    /// Reserves room for `additional` more vertices.
    pub fn reserve(&mut self, additional: usize) {
        self.vertices.reserve(additional);
        self.normals.reserve(additional);
        self.indices.reserve(additional);
    }

    /// Pushes one triangle corner and indexes it.
    #[inline]
    pub fn append(&mut self, vertex: &Point, normal: &Vector) {
        self.indices.push(vertex_index(self.vertices.len()));
        self.vertices.push([vertex.x, vertex.y, vertex.z]);
        self.normals.push([normal.x, normal.y, normal.z]);
    }

    /// Appends everything `other` accumulated after the current contents.
    pub fn extend(&mut self, other: MeshAssembler) {
        let offset = vertex_index(self.vertices.len());
        self.vertices.extend(other.vertices);
        self.normals.extend(other.normals);
        self.indices.extend(other.indices.into_iter().map(|i| i + offset));
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn snapshot(&self) -> MeshSnapshot<'_> {
        MeshSnapshot {
            vertices: &self.vertices,
            normals: &self.normals,
            indices: &self.indices,
        }
    }

    /// Moves the buffers out, leaving the assembler empty.
    pub fn take(&mut self) -> GeneratedMesh {
        GeneratedMesh {
            vertices: std::mem::take(&mut self.vertices),
            normals: std::mem::take(&mut self.normals),
            indices: std::mem::take(&mut self.indices),
        }
    }
}

/// Index of the vertex at `position` in the buffers.
#[inline]
fn vertex_index(position: usize) -> u32 {
    debug_assert!(
        u32::try_from(position).is_ok(),
        "vertex {position} is past the u32 index range"
    );
    position as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(assembler: &mut MeshAssembler, corners: [[f32; 3]; 3]) {
        for [x, y, z] in corners {
            assembler.append(&Point::new(x, y, z), &Vector::z());
        }
    }

    #[test]
    fn append_never_shares_vertices() {
        let mut assembler = MeshAssembler::new();
        let corners = [[0., 0., 0.], [1., 0., 0.], [0., 1., 0.]];
        triangle(&mut assembler, corners);
        triangle(&mut assembler, corners);

        let snapshot = assembler.snapshot();
        assert_eq!(snapshot.vertices.len(), 6);
        assert_eq!(snapshot.normals.len(), 6);
        assert_eq!(snapshot.indices, &[0, 1, 2, 3, 4, 5]);
        assert_eq!(snapshot.vertices[3], [0., 0., 0.]);
    }

    #[test]
    fn reset_clears_everything() {
        let mut assembler = MeshAssembler::new();
        triangle(&mut assembler, [[0.; 3], [1., 0., 0.], [0., 1., 0.]]);
        assembler.reset();
        assert!(assembler.is_empty());
        assert!(assembler.snapshot().indices.is_empty());

        triangle(&mut assembler, [[0.; 3], [1., 0., 0.], [0., 1., 0.]]);
        assert_eq!(assembler.snapshot().indices, &[0, 1, 2]);
    }

    #[test]
    fn extend_offsets_indices() {
        let mut first = MeshAssembler::new();
        triangle(&mut first, [[0.; 3], [1., 0., 0.], [0., 1., 0.]]);
        let mut second = MeshAssembler::new();
        triangle(&mut second, [[5.; 3], [6., 5., 5.], [5., 6., 5.]]);

        first.extend(second);
        let mesh = first.take();
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(mesh.triangle(1)[0], Point::new(5., 5., 5.));
        assert!(first.is_empty());
    }

    #[test]
    fn face_normal_and_winding() {
        let mut assembler = MeshAssembler::new();
        triangle(&mut assembler, [[0.; 3], [1., 0., 0.], [0., 1., 0.]]);
        let mesh = assembler.take();

        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.face_normal(0), Vector::z());
        assert_eq!(mesh.counter_clockwise_indices(), vec![0, 2, 1]);
    }

    #[test]
    fn degenerate_triangle_has_zero_normal() {
        let mut assembler = MeshAssembler::new();
        triangle(&mut assembler, [[1.; 3], [1.; 3], [2., 2., 2.]]);
        assert_eq!(assembler.take().face_normal(0), Vector::zeros());
    }

    #[test]
    fn vertex_index_covers_the_u32_range() {
        assert_eq!(vertex_index(0), 0);
        assert_eq!(vertex_index(u32::MAX as usize), u32::MAX);
    }

    #[test]
    #[cfg(all(debug_assertions, target_pointer_width = "64"))]
    #[should_panic(expected = "past the u32 index range")]
    fn vertex_index_past_u32_panics() {
        vertex_index(u32::MAX as usize + 1);
    }

    #[test]
    fn counts_non_finite_vertices() {
        let mut assembler = MeshAssembler::new();
        triangle(&mut assembler, [[f32::NAN, 0., 0.], [1., 0., 0.], [0., f32::INFINITY, 0.]]);
        assert_eq!(assembler.take().non_finite_vertices(), 2);
    }
}
