//! Background tasks for the rendering system.
//!
//! # Available Tasks
//! - `MeshRebuildTask`: Meshes the sub-chunks in render range in the background

pub mod mesh_rebuild_task;

pub use mesh_rebuild_task::MeshRebuildTask;
