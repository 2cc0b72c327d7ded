//! CPU-side mesh data and procedural primitives.

pub mod mesh_data;
pub mod primitives;

pub use mesh_data::{MeshData, MeshVertex};
pub use primitives::{PlaneOptions, create_box, create_plane};
