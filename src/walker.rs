use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::trace;

use crate::{
    cube::Cube,
    error::{MetaballError, Result},
    field::{BoundingBox, MetaballField},
    mesh::MeshAssembler,
    types::{Value, Vector},
};

/// Tiles a field's bounding box with a fixed `steps³` grid of cubes and emits
/// the triangles of each one.
///
/// The cube size comes from the longest axis of the box, so the grid covers that
/// axis exactly and may stop short of (or run past) the others. Cubes are neither
/// clipped nor padded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CubeWalker {
    steps: usize,
}

impl CubeWalker {
    pub fn new(steps: usize) -> Result<Self> {
        if steps == 0 {
            return Err(MetaballError::InvalidSteps(steps));
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Edge length of every cube in the grid over `bounds`.
    pub fn cube_size(&self, bounds: &BoundingBox) -> Value {
        bounds.largest_extent() / self.steps as Value
    }

    /// Iterates every cube of the grid, `i` (X) outermost and `k` (Z) innermost.
    pub fn cubes(&self, bounds: &BoundingBox) -> impl Iterator<Item = Cube> {
        let (bounds, walker) = (*bounds, *self);
        (0..self.steps).flat_map(move |i| walker.slice(bounds, i))
    }

    /// Cubes of the X slice `i`, `j` then `k`.
    fn slice(self, bounds: BoundingBox, i: usize) -> impl Iterator<Item = Cube> {
        let size = self.cube_size(&bounds);
        let (min, steps) = (bounds.min, self.steps);
        (0..steps).flat_map(move |j| {
            (0..steps).map(move |k| {
                let offset = Vector::new(i as Value, j as Value, k as Value) * size;
                Cube::new(min + offset, size)
            })
        })
    }

    /// Classifies every cube against `field` and appends the emitted triangles to `mesh`.
    ///
    /// Returns the number of triangles emitted; zero when the field has no sources.
    pub fn walk(&self, field: &MetaballField, epsilon: Value, mesh: &mut MeshAssembler) -> usize {
        let Some(bounds) = field.bounds() else {
            return 0;
        };
        trace!(steps = self.steps, cube_size = self.cube_size(&bounds), "walking grid");

        self.cubes(&bounds)
            .map(|cube| cube.classify(field).emit(field, epsilon, mesh))
            .sum()
    }

    /// Like [`walk`](CubeWalker::walk), but each X slice is walked on the Rayon pool into its
    /// own accumulator. Slices are merged in order, so the output matches `walk` exactly.
    pub fn walk_parallel(
        &self,
        field: &MetaballField,
        epsilon: Value,
        mesh: &mut MeshAssembler,
    ) -> usize {
        let Some(bounds) = field.bounds() else {
            return 0;
        };
        trace!(steps = self.steps, cube_size = self.cube_size(&bounds), "walking grid in parallel");

        let per_x: Vec<(MeshAssembler, usize)> = (0..self.steps)
            .into_par_iter()
            .map(|i| {
                let mut local = MeshAssembler::new();
                let triangles: usize = self
                    .slice(bounds, i)
                    .map(|cube| cube.classify(field).emit(field, epsilon, &mut local))
                    .sum();
                (local, triangles)
            })
            .collect();

        // Merge per-X slices into a single set of buffers
        let total: usize = per_x.iter().map(|(local, _)| local.vertex_count()).sum();
        mesh.reserve(total);
        per_x
            .into_iter()
            .map(|(local, triangles)| {
                mesh.extend(local);
                triangles
            })
            .sum()
    }
}
