use tracing::debug;

use crate::{
    config::MetaballConfig,
    error::Result,
    field::MetaballField,
    mesh::{GeneratedMesh, MeshAssembler},
    types::{Point, Value},
    walker::CubeWalker,
};

/// Runs complete extraction cycles: field refresh, grid walk, mesh handoff.
///
/// Each [`run_cycle`](MeshGenerator::run_cycle) starts from empty buffers and runs to
/// completion; nothing but the settings carries over between cycles. Not reentrant:
/// the caller drives one cycle at a time.
///
/// ```text
/// run_cycle(positions)
///   → MetaballField::refresh      source snapshot + bounding box
///   → CubeWalker::walk            steps³ cubes
///       → Cube::classify          8 corner values → case mask
///       → CubeCase::emit          per triangle edge: zero crossing + normal
///   → MeshAssembler::take         buffers handed to the caller
/// ```
#[derive(Debug, Clone)]
pub struct MeshGenerator {
    config: MetaballConfig,
    walker: CubeWalker,
    field: MetaballField,
    assembler: MeshAssembler,
    last_vertex_count: usize,
}

impl MeshGenerator {
    /// Creates a generator for balls of the given shared radius.
    pub fn new(config: MetaballConfig, radius: Value) -> Result<Self> {
        config.validate()?;
        let walker = CubeWalker::new(config.steps)?;
        let field = MetaballField::new(radius)?.with_margin(config.bounds_margin)?;
        Ok(Self {
            config,
            walker,
            field,
            assembler: MeshAssembler::new(),
            last_vertex_count: 0,
        })
    }

    pub fn config(&self) -> &MetaballConfig {
        &self.config
    }

    /// The field as of the last cycle.
    pub fn field(&self) -> &MetaballField {
        &self.field
    }

    pub fn radius(&self) -> Value {
        self.field.radius()
    }

    pub fn set_radius(&mut self, radius: Value) -> Result<()> {
        self.field.set_radius(radius)
    }

    /// Extracts the surface around the given source positions.
    ///
    /// Never fails once constructed: numerical edge cases show up as non-finite
    /// vertices in the result, and no sources give an empty mesh.
    pub fn run_cycle<I>(&mut self, positions: I) -> GeneratedMesh
    where
        I: IntoIterator<Item = Point>,
    {
        self.assembler.reset();
        self.assembler.reserve(self.last_vertex_count);

        self.field.refresh(positions);

        let epsilon = self.config.normal_epsilon;
        let triangles = if self.config.parallel {
            self.walker.walk_parallel(&self.field, epsilon, &mut self.assembler)
        } else {
            self.walker.walk(&self.field, epsilon, &mut self.assembler)
        };

        let mesh = self.assembler.take();
        self.last_vertex_count = mesh.vertex_count();

        debug!(
            sources = self.field.sources().len(),
            steps = self.config.steps,
            vertices = mesh.vertex_count(),
            triangles,
            "metaball cycle complete"
        );
        let non_finite = mesh.non_finite_vertices();
        if non_finite > 0 {
            debug!(non_finite, "cycle produced non-finite vertices");
        }

        mesh
    }
}
