//! Task for rebuilding the sub-chunk meshes around the player in a background thread.
//!
//! The task works on a snapshot of the chunks it touches, so edits made while it runs
//! are invisible to it. Each result carries the edit epoch it was dispatched at; the
//! session uses it to drop meshes that a synchronous edit rebuild has already replaced.

use std::collections::HashSet;

use cgmath::Point3;

use crate::engine_state::{
    rendering::meshing::{build_mesh, MeshPair, MeshRegion, SubChunkKey},
    task_management::task::{Task, TaskCategory, TaskResult},
    voxels::world::ChunkMap,
    SessionState,
};

/// A task that meshes a batch of sub-chunks.
pub struct MeshRebuildTask {
    /// Chunks holding the sub-chunks to build and their horizontal neighbours
    snapshot: ChunkMap,
    /// Sub-chunks to build
    keys: Vec<SubChunkKey>,
    /// Every sub-chunk in range at dispatch; anything else is disposed on completion
    desired: HashSet<SubChunkKey>,
    center: Point3<f32>,
    render_distance: f32,
    capacity: usize,
    epoch: u64,
}

impl MeshRebuildTask {
    /// Creates a new mesh rebuild task.
    ///
    /// # Arguments
    /// * `snapshot` - Copied chunks the builds read from
    /// * `keys` - Sub-chunks to build
    /// * `desired` - Sub-chunks that should stay resident
    /// * `center` - Player position at dispatch
    /// * `render_distance` - Distance cutoff for voxels
    /// * `capacity` - Vertex limit of a single build
    /// * `epoch` - Edit epoch of the session at dispatch
    pub fn new(
        snapshot: ChunkMap,
        keys: Vec<SubChunkKey>,
        desired: HashSet<SubChunkKey>,
        center: Point3<f32>,
        render_distance: f32,
        capacity: usize,
        epoch: u64,
    ) -> Self {
        MeshRebuildTask {
            snapshot,
            keys,
            desired,
            center,
            render_distance,
            capacity,
            epoch,
        }
    }

    pub fn keys(&self) -> &[SubChunkKey] {
        &self.keys
    }

    /// Builds every requested sub-chunk against the snapshot.
    pub fn build_all(&self) -> Vec<(SubChunkKey, MeshPair)> {
        self.keys
            .iter()
            .map(|&key| {
                let mesh = build_mesh(
                    &self.snapshot,
                    MeshRegion::SubChunk(key),
                    self.center,
                    self.render_distance,
                    self.capacity,
                );
                (key, mesh)
            })
            .collect()
    }
}

impl Task for MeshRebuildTask {
    fn category(&self) -> TaskCategory {
        TaskCategory::Rebuild
    }

    /// Processes the mesh rebuild task on a worker.
    ///
    /// # Returns
    /// A boxed `TaskResult` holding one mesh per requested sub-chunk
    fn process(&self) -> Box<dyn TaskResult + Send> {
        Box::new(MeshRebuildTaskResult {
            built: self.build_all(),
            desired: self.desired.clone(),
            epoch: self.epoch,
        })
    }
}

/// The result of a mesh rebuild task.
pub struct MeshRebuildTaskResult {
    built: Vec<(SubChunkKey, MeshPair)>,
    desired: HashSet<SubChunkKey>,
    epoch: u64,
}

impl TaskResult for MeshRebuildTaskResult {
    /// Disposes out-of-range meshes and installs the new ones on the main thread.
    fn handle_result(self: Box<Self>, session: &mut SessionState) {
        session.install_rebuild(self.built, &self.desired, self.epoch);
    }
}
