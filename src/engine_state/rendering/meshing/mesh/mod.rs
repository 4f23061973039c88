//! Geometry primitives for the mesh builder.
//!
//! # Architecture
//! - [`MeshData`] / [`MeshPair`]: the finished vertex buffers
//! - [`MeshWriter`]: fixed-capacity buffer filled during one build
//! - [`Face`]: one culled block face with its texture placement
//! - [`billboard`]: crossed quads for plant voxels

pub mod billboard;
mod face;
mod mesh_data;

pub use face::Face;
pub use mesh_data::*;
