use bevy::{
    asset::RenderAssetUsages,
    mesh::{Indices, PrimitiveTopology},
    prelude::*,
};
use tracing::{error, warn};

use crate::{
    config::MetaballConfig,
    generator::MeshGenerator,
    mesh::GeneratedMesh,
    types::{Point, Value},
};

/// System sets for the metaball pipeline.
///
/// Both run in `PostUpdate`, after transform propagation, so ball movement made
/// anywhere in `Update` is picked up the same frame. Use these to order your own
/// systems relative to mesh generation:
///
/// ```rust,ignore
/// // Tweak the generated buffers before they reach the asset:
/// app.add_systems(
///     PostUpdate,
///     smooth_mesh.after(MetaballSet::Generate).before(MetaballSet::Upload),
/// );
/// ```
///
/// ```text
/// TransformSystems::Propagate  →  MetaballSet::Generate  →  [your systems]  →  MetaballSet::Upload
/// ```
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetaballSet {
    /// Runs one extraction cycle per [`MetaballSurface`] and inserts [`GeneratedMesh`].
    Generate,
    /// Moves [`GeneratedMesh`] data into the surface's [`Mesh3d`] and removes [`GeneratedMesh`].
    Upload,
}

/// An implicit surface around a set of ball entities.
///
/// Every frame the surface reads the [`GlobalTransform`] of each entity in `sources`,
/// extracts the zero level of their shared field and shows it through [`Mesh3d`].
/// Vertices are expressed in the surface entity's own frame.
///
/// ```rust,ignore
/// let ball = commands.spawn(Transform::from_xyz(1., 0., 0.)).id();
/// commands.spawn((
///     MetaballSurface::new(vec![ball], 1.0),
///     MeshMaterial3d(material),
/// ));
/// ```
#[derive(Component, Debug, Clone)]
#[require(Transform, SurfaceGenerator)]
pub struct MetaballSurface {
    /// Entities whose positions act as the field sources.
    pub sources: Vec<Entity>,
    /// Radius shared by every ball.
    pub radius: Value,
}

impl MetaballSurface {
    pub fn new(sources: Vec<Entity>, radius: Value) -> Self {
        Self { sources, radius }
    }
}

/// Extraction state kept on a surface between frames.
///
/// Filled on the first cycle and rebuilt whenever [`MetaballConfig`] or the surface
/// radius changes.
#[derive(Component, Debug, Default)]
pub struct SurfaceGenerator(pub Option<MeshGenerator>);

/// Bevy plugin that re-extracts every [`MetaballSurface`] each frame.
///
/// With the `auto_regenerate` feature enabled (the default) the systems are added to
/// `PostUpdate`, after [`TransformSystems::Propagate`](bevy::transform::TransformSystems).
/// Without it only [`MetaballConfig`] is inserted, and the host schedules
/// [`generate_surfaces`] and [`upload_surfaces`] itself, or calls [`regenerate_surface`]
/// directly:
///
/// ```text
/// MetaballSurface
///   → source GlobalTransforms read     (MetaballSet::Generate)
///   → MeshGenerator::run_cycle
///   → GeneratedMesh inserted
///   → [your systems here]
///   → Mesh3d written                   (MetaballSet::Upload)
///   → GeneratedMesh removed
/// ```
pub struct MetaballPlugin {
    /// Initial value for [`MetaballConfig::steps`].
    pub steps: usize,
    /// Initial value for [`MetaballConfig::normal_epsilon`].
    pub normal_epsilon: Value,
    /// Initial value for [`MetaballConfig::bounds_margin`].
    pub bounds_margin: Value,
    /// Initial value for [`MetaballConfig::parallel`].
    pub parallel: bool,
}

impl Default for MetaballPlugin {
    fn default() -> Self {
        let config = MetaballConfig::default();
        Self {
            steps: config.steps,
            normal_epsilon: config.normal_epsilon,
            bounds_margin: config.bounds_margin,
            parallel: config.parallel,
        }
    }
}

impl Plugin for MetaballPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(MetaballConfig {
            steps: self.steps,
            normal_epsilon: self.normal_epsilon,
            bounds_margin: self.bounds_margin,
            parallel: self.parallel,
        });

        #[cfg(feature = "auto_regenerate")]
        app.configure_sets(
            PostUpdate,
            (MetaballSet::Generate, MetaballSet::Upload)
                .chain()
                .after(bevy::transform::TransformSystems::Propagate),
        )
        .add_systems(
            PostUpdate,
            (
                generate_surfaces.in_set(MetaballSet::Generate),
                upload_surfaces.in_set(MetaballSet::Upload),
            ),
        );
    }
}

/// Positions of the surface's sources, in the surface entity's local frame.
///
/// Sources without a [`GlobalTransform`] (for example despawned balls) are skipped.
pub fn source_positions(
    surface: &MetaballSurface,
    surface_transform: &GlobalTransform,
    transforms: &Query<&GlobalTransform>,
) -> Vec<Point> {
    let to_local = surface_transform.affine().inverse();
    surface
        .sources
        .iter()
        .filter_map(|&source| match transforms.get(source) {
            Ok(transform) => {
                let p = to_local.transform_point3(transform.translation());
                Some(Point::new(p.x, p.y, p.z))
            }
            Err(_) => {
                warn!(?source, "metaball source has no GlobalTransform, skipping it");
                None
            }
        })
        .collect()
}

/// Runs one extraction cycle for `surface`, reusing `generator` when its settings still apply.
///
/// Returns `None` (after logging) when the configuration or radius is invalid.
pub fn regenerate_surface(
    surface: &MetaballSurface,
    surface_transform: &GlobalTransform,
    transforms: &Query<&GlobalTransform>,
    config: &MetaballConfig,
    generator: &mut Option<MeshGenerator>,
) -> Option<GeneratedMesh> {
    let reusable = generator
        .as_ref()
        .is_some_and(|g| g.config() == config && g.radius() == surface.radius);
    if !reusable {
        match MeshGenerator::new(config.clone(), surface.radius) {
            Ok(fresh) => *generator = Some(fresh),
            Err(err) => {
                error!(%err, "invalid metaball settings, surface not regenerated");
                return None;
            }
        }
    }

    let positions = source_positions(surface, surface_transform, transforms);
    generator.as_mut().map(|g| g.run_cycle(positions))
}

/// Runs an extraction cycle for every [`MetaballSurface`] and inserts the [`GeneratedMesh`].
pub fn generate_surfaces(
    mut commands: Commands,
    config: Res<MetaballConfig>,
    mut surfaces: Query<(Entity, &MetaballSurface, &GlobalTransform, &mut SurfaceGenerator)>,
    transforms: Query<&GlobalTransform>,
) {
    for (entity, surface, surface_transform, mut state) in surfaces.iter_mut() {
        if let Some(generated) = regenerate_surface(
            surface,
            surface_transform,
            &transforms,
            &config,
            &mut state.0,
        ) {
            commands.entity(entity).insert(generated);
        }
    }
}

/// Writes each [`GeneratedMesh`] into the surface's [`Mesh3d`], then removes [`GeneratedMesh`].
///
/// The vertex data Vecs are **moved** into the Bevy mesh with no copies. The first upload
/// creates the mesh asset; later ones overwrite it in place.
pub fn upload_surfaces(
    mut commands: Commands,
    mut query: Query<(Entity, &mut GeneratedMesh, Option<&Mesh3d>)>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    for (entity, mut generated, mesh3d) in query.iter_mut() {
        let generated = std::mem::take(&mut *generated);
        commands.entity(entity).remove::<GeneratedMesh>();

        if let Some(Mesh3d(handle)) = mesh3d {
            if let Some(mut mesh) = meshes.get_mut(handle) {
                write_mesh(&mut mesh, generated);
                continue;
            }
        }

        commands
            .entity(entity)
            .insert(Mesh3d(meshes.add(to_bevy_mesh(generated))));
    }
}

/// Builds a Bevy triangle-list mesh from a cycle's output.
///
/// Triangles are rewound counter-clockwise, which is what Bevy treats as front facing.
/// The asset stays in the main world so later cycles can overwrite it.
pub fn to_bevy_mesh(generated: GeneratedMesh) -> Mesh {
    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    write_mesh(&mut mesh, generated);
    mesh
}

fn write_mesh(mesh: &mut Mesh, generated: GeneratedMesh) {
    let indices = generated.counter_clockwise_indices();
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, generated.vertices);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, generated.normals);
    mesh.insert_indices(Indices::U32(indices));
}
