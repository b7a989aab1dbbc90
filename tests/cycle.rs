use std::collections::HashMap;

use approx::assert_relative_eq;
use bevy_metaballs::{
    GeneratedMesh, MeshGenerator, MetaballConfig,
    types::{Point, Value, Vector},
};

fn generate(steps: usize, radius: Value, sources: &[Point]) -> GeneratedMesh {
    let config = MetaballConfig::default().with_steps(steps);
    let mut generator = MeshGenerator::new(config, radius).unwrap();
    generator.run_cycle(sources.iter().copied())
}

fn three_in_a_row() -> [Point; 3] {
    [
        Point::new(-2., 0., 0.),
        Point::new(0., 0., 0.),
        Point::new(2., 0., 0.),
    ]
}

fn assert_well_formed(mesh: &GeneratedMesh) {
    assert_eq!(mesh.vertices.len(), mesh.normals.len());
    assert_eq!(mesh.indices.len() % 3, 0);
    assert_eq!(mesh.indices.len(), mesh.vertices.len());
    for (expected, &index) in mesh.indices.iter().enumerate() {
        assert_eq!(index as usize, expected);
    }
}

/// Counts how many triangles share each edge once vertices are welded on a 1e-3 grid.
///
/// Triangles that collapse under welding add every edge an even number of times,
/// so they are skipped.
fn welded_edge_counts(mesh: &GeneratedMesh) -> HashMap<([i64; 3], [i64; 3]), usize> {
    let weld = |p: Point| [p.x, p.y, p.z].map(|c| (c * 1e3).round() as i64);
    let mut counts = HashMap::new();
    for tri in 0..mesh.triangle_count() {
        let [a, b, c] = mesh.triangle(tri).map(weld);
        if a == b || b == c || c == a {
            continue;
        }
        for (u, v) in [(a, b), (b, c), (c, a)] {
            *counts.entry((u.min(v), u.max(v))).or_insert(0) += 1;
        }
    }
    counts
}

#[test]
fn three_balls_merge_into_one_blob() {
    let mesh = generate(20, 1., &three_in_a_row());

    assert!(!mesh.is_empty());
    assert_well_formed(&mesh);
    assert_eq!(mesh.non_finite_vertices(), 0);

    for n in &mesh.normals {
        assert_relative_eq!(Vector::from(*n).norm(), 1., epsilon = 1e-3);
    }

    let min_x = mesh.vertices.iter().map(|v| v[0]).fold(Value::MAX, Value::min);
    let max_x = mesh.vertices.iter().map(|v| v[0]).fold(Value::MIN, Value::max);
    assert!(min_x < -3. && min_x > -3.25, "{min_x}");
    assert!(max_x > 3. && max_x < 3.25, "{max_x}");

    // the gaps between the balls are bridged, so no surface crosses the axis there
    for v in &mesh.vertices {
        let p = Point::from(*v);
        assert!((p - Point::new(1., 0., 0.)).norm() > 0.5, "{p:?}");
        assert!((p - Point::new(-1., 0., 0.)).norm() > 0.5, "{p:?}");
    }
}

#[test]
fn single_ball_approximates_a_sphere() {
    let mesh = generate(20, 1., &[Point::origin()]);
    assert!(!mesh.is_empty());
    assert_well_formed(&mesh);

    for (v, n) in mesh.vertices.iter().zip(&mesh.normals) {
        let p = Point::from(*v);
        let distance = p.coords.norm();
        assert!((distance - 1.).abs() < 0.02, "{p:?}");
        let radial = p.coords / distance;
        assert!(Vector::from(*n).dot(&radial) > 0.99, "{n:?} at {p:?}");
    }

    // closed: once welded, every edge borders an even number of triangles
    let edges = welded_edge_counts(&mesh);
    assert!(!edges.is_empty());
    for (edge, count) in &edges {
        assert_eq!(count % 2, 0, "open edge {edge:?}");
    }
}

#[test]
fn triangles_wind_clockwise_seen_from_outside() {
    let mesh = generate(16, 0.7, &[Point::origin(), Point::new(1.2, 0., 0.)]);
    assert!(!mesh.is_empty());

    let mut checked = 0;
    for tri in 0..mesh.triangle_count() {
        let [a, b, c] = mesh.triangle(tri);
        let cross = (b - a).cross(&(c - b));
        if cross.norm() < 1e-5 {
            continue;
        }
        let outward = Vector::from(mesh.normals[tri * 3]);
        assert!(cross.dot(&outward) < 0., "triangle {tri} faces inward");
        checked += 1;
    }
    assert!(checked > mesh.triangle_count() / 2);

    // rewinding flips every face
    let ccw = mesh.counter_clockwise_indices();
    assert_eq!(ccw[..3], [0, 2, 1]);
}

#[test]
fn repeated_cycles_are_identical() {
    let config = MetaballConfig::default();
    let mut generator = MeshGenerator::new(config.clone(), 1.).unwrap();
    let first = generator.run_cycle(three_in_a_row());
    let second = generator.run_cycle(three_in_a_row());
    assert_eq!(first, second);

    let mut fresh = MeshGenerator::new(config, 1.).unwrap();
    assert_eq!(fresh.run_cycle(three_in_a_row()), first);
}

#[test]
fn parallel_walk_gives_the_same_mesh() {
    let mut sequential = MeshGenerator::new(MetaballConfig::default(), 1.).unwrap();
    let mut parallel =
        MeshGenerator::new(MetaballConfig::default().with_parallel(true), 1.).unwrap();
    assert_eq!(
        sequential.run_cycle(three_in_a_row()),
        parallel.run_cycle(three_in_a_row())
    );
}

#[test]
fn one_step_is_too_coarse_for_any_surface() {
    let mesh = generate(1, 1., &three_in_a_row());
    assert!(mesh.is_empty());
    assert_well_formed(&mesh);
}

#[test]
fn triangle_count_grows_with_the_square_of_steps() {
    let coarse = generate(10, 1., &[Point::origin()]).triangle_count();
    let fine = generate(20, 1., &[Point::origin()]).triangle_count();
    assert!(coarse > 0);
    let ratio = fine as f64 / coarse as f64;
    assert!(ratio > 3. && ratio < 5., "{ratio}");
}

#[test]
fn corner_on_a_source_yields_non_finite_vertices() {
    // with two steps the grid has a corner exactly on the source
    let mesh = generate(2, 1., &[Point::origin()]);
    assert_eq!(mesh.triangle_count(), 8);
    assert_well_formed(&mesh);
    assert!(mesh.non_finite_vertices() > 0);

    for (v, n) in mesh.vertices.iter().zip(&mesh.normals) {
        if v.iter().any(|c| !c.is_finite()) {
            assert_eq!(*n, [0.; 3]);
        }
    }
}

#[test]
fn no_sources_give_an_empty_mesh() {
    let mesh = generate(20, 1., &[]);
    assert!(mesh.is_empty());
    assert_eq!(mesh, GeneratedMesh::default());
}
