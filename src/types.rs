use nalgebra::{Point3, Vector3};

/// Scalar field value at a point in space.
pub type Value = f32;

/// A 3D point with [`Value`] components.
pub type Point = Point3<Value>;

/// A 3D vector with [`Value`] components.
pub type Vector = Vector3<Value>;

/// A vertex position or normal as handed to the renderer.
pub type Vertex = [f32; 3];
