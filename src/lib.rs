pub mod config;
pub mod cube;
pub mod error;
pub mod field;
pub mod generator;
pub mod interp;
pub mod mesh;
pub mod normal;
pub mod plugin;
pub mod tables;
pub mod types;
pub mod utils;
pub mod walker;

pub use config::MetaballConfig;
pub use generator::MeshGenerator;
pub use mesh::GeneratedMesh;
pub use plugin::{MetaballPlugin, MetaballSurface};
