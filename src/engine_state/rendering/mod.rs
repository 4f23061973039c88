//! Rendering-side data of the world core.
//!
//! This module turns voxels into renderer-ready geometry. It owns no graphics API
//! state: meshes are plain vertex buffers and the atlas is only a UV layout, so any
//! presentation layer can upload them.

pub mod meshing;
pub mod tasks;
pub mod texture_atlas;

// Re-export commonly used types
pub use meshing::{build_mesh, MeshManager, MeshPair, MeshRegion, MeshStats};
