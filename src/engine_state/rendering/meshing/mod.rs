//! Mesh generation and management for voxel rendering.
//!
//! This module converts block volumes into surface geometry and keeps track of which
//! sub-chunk meshes are currently resident.
//!
//! # Architecture
//! - [`build_mesh`]: face-culling builder over a [`MeshRegion`]
//! - [`MeshManager`]: resident sub-chunk meshes, diffed against the set in range
//! - [`sub_chunk`]: 8x8x8 addressing used for incremental rebuilds
//! - `mesh/`: vertex buffers, face quads and plant billboards
//!
//! # Face Culling
//! A solid voxel emits a quad for each of its six faces whose neighbour is transparent
//! (air or a plant). Output therefore scales with exposed surface, not volume. Plant
//! voxels skip this path and emit crossed billboards into a separate buffer.
//!
//! # Determinism
//! Identical block content, region and centre produce byte-identical buffers. The only
//! variation (tile mirroring and plant height) is seeded from voxel coordinates.

use std::collections::{HashMap, HashSet};

use cgmath::Point3;

use crate::engine_state::voxels::{
    block::{block_side::BlockSide, BLOCK_CATALOG},
    chunk::{CHUNK_HEIGHT, CHUNK_SIZE},
    terrain::hash::terrain_hash,
    world::{BlockLookup, ChunkKey, WorldBounds},
};

pub mod mesh;
pub mod sub_chunk;

pub use mesh::*;
pub use sub_chunk::{SubChunkKey, SUB_CHUNK_SIZE};

/// Default vertex capacity of a single build (4,000,000 position floats).
pub const DEFAULT_VERTEX_CAPACITY: usize = 4_000_000 / POSITION_COMPONENTS;

/// The block range a build covers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MeshRegion {
    /// Every loaded column inside the bounds, further limited by the render sphere.
    World(WorldBounds),
    /// One full chunk column.
    Chunk(ChunkKey),
    /// One 8x8x8 cube.
    SubChunk(SubChunkKey),
}

impl MeshRegion {
    /// Inclusive minimum and exclusive maximum block of the region.
    fn block_range(&self, center: Point3<f32>, render_distance: f32) -> (Point3<i32>, Point3<i32>) {
        match *self {
            MeshRegion::World(bounds) => {
                let reach = render_distance.max(0.0);
                let min_x = (bounds.min_cx * CHUNK_SIZE).max((center.x - reach).floor() as i32);
                let max_x = ((bounds.max_cx + 1) * CHUNK_SIZE).min((center.x + reach).floor() as i32 + 1);
                let min_z = (bounds.min_cz * CHUNK_SIZE).max((center.z - reach).floor() as i32);
                let max_z = ((bounds.max_cz + 1) * CHUNK_SIZE).min((center.z + reach).floor() as i32 + 1);
                (Point3::new(min_x, 0, min_z), Point3::new(max_x, CHUNK_HEIGHT, max_z))
            }
            MeshRegion::Chunk(key) => {
                let (x, z) = key.origin();
                (Point3::new(x, 0, z), Point3::new(x + CHUNK_SIZE, CHUNK_HEIGHT, z + CHUNK_SIZE))
            }
            MeshRegion::SubChunk(key) => {
                let min = key.min_block();
                (
                    min,
                    Point3::new(min.x + SUB_CHUNK_SIZE, min.y + SUB_CHUNK_SIZE, min.z + SUB_CHUNK_SIZE),
                )
            }
        }
    }
}

/// Builds terrain and plant geometry for a region.
///
/// # Arguments
/// * `lookup` - block source; neighbours outside the region are read through it too, so
///   faces on region borders are culled against the real world
/// * `region` - which blocks to mesh
/// * `center` - player position for the distance cutoff
/// * `render_distance` - voxels whose centre is farther than this are skipped
/// * `capacity` - vertex limit per buffer; faces past it are dropped
pub fn build_mesh(
    lookup: &impl BlockLookup,
    region: MeshRegion,
    center: Point3<f32>,
    render_distance: f32,
    capacity: usize,
) -> MeshPair {
    let (min, max) = region.block_range(center, render_distance);
    let volume = [max.x - min.x, max.y - min.y, max.z - min.z]
        .into_iter()
        .map(|extent| extent.max(0) as usize)
        .product::<usize>();

    // Every voxel can emit at most six faces or four billboard quads.
    let mut terrain = MeshWriter::new(capacity.min(volume * 6 * VERTICES_PER_QUAD));
    let mut grass = MeshWriter::new(capacity.min(volume * 4 * VERTICES_PER_QUAD));
    let max_dist_sq = render_distance * render_distance;

    for y in min.y..max.y {
        for z in min.z..max.z {
            for x in min.x..max.x {
                let dx = x as f32 + 0.5 - center.x;
                let dy = y as f32 + 0.5 - center.y;
                let dz = z as f32 + 0.5 - center.z;
                if dx * dx + dy * dy + dz * dz > max_dist_sq {
                    continue;
                }

                let block = lookup.block_at(x, y, z);
                if !block.is_renderable() {
                    continue;
                }

                let def = BLOCK_CATALOG.get(block);
                if let Some(plant) = &def.plant {
                    billboard::write_billboard(&mut grass, plant, x, y, z);
                    continue;
                }
                if !block.is_solid() {
                    continue;
                }

                for side in BlockSide::all() {
                    let offset = side.offset();
                    if !lookup.block_at(x + offset.x, y + offset.y, z + offset.z).is_transparent() {
                        continue;
                    }
                    let variant = if def.face_variation > 1 {
                        terrain_hash(x, y, z, 0, 0, side as u32 + 1) % def.face_variation as u32
                    } else {
                        0
                    };
                    let tile = def.face_tiles[side as usize].uvs();
                    Face::new([x, y, z], side, tile, variant).write(&mut terrain);
                }
            }
        }
    }

    if terrain.is_truncated() || grass.is_truncated() {
        log::debug!(
            "Mesh build for {:?} hit capacity {}, dropped {} terrain and {} plant quads",
            region,
            capacity,
            terrain.dropped_quads(),
            grass.dropped_quads()
        );
    }

    MeshPair {
        terrain: terrain.finish(),
        grass: grass.finish(),
    }
}

/// Every sub-chunk of the given chunks that may hold a voxel within range.
pub fn sub_chunks_in_range(
    chunks: impl IntoIterator<Item = ChunkKey>,
    center: Point3<f32>,
    render_distance: f32,
) -> HashSet<SubChunkKey> {
    chunks
        .into_iter()
        .flat_map(SubChunkKey::of_chunk)
        .filter(|key| key.in_range(center, render_distance))
        .collect()
}

/// Aggregated size of the resident meshes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MeshStats {
    pub sub_chunks: usize,
    pub terrain_vertices: usize,
    pub grass_vertices: usize,
}

/// Tracks the sub-chunk meshes currently handed to the renderer.
///
/// A sub-chunk is resident once a mesh has been installed for it, even if that mesh is
/// empty, so it is not rebuilt until it is disposed or marked dirty.
#[derive(Debug, Default)]
pub struct MeshManager {
    meshes: HashMap<SubChunkKey, MeshPair>,
}

impl MeshManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_resident(&self, key: SubChunkKey) -> bool {
        self.meshes.contains_key(&key)
    }

    pub fn get(&self, key: SubChunkKey) -> Option<&MeshPair> {
        self.meshes.get(&key)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SubChunkKey, &MeshPair)> {
        self.meshes.iter()
    }

    /// Installs a mesh, returning the one it replaces.
    pub fn install(&mut self, key: SubChunkKey, mesh: MeshPair) -> Option<MeshPair> {
        self.meshes.insert(key, mesh)
    }

    pub fn dispose(&mut self, key: SubChunkKey) -> Option<MeshPair> {
        self.meshes.remove(&key)
    }

    /// Disposes every mesh not in `desired`.
    ///
    /// # Returns
    /// The number of meshes disposed.
    pub fn retain_only(&mut self, desired: &HashSet<SubChunkKey>) -> usize {
        let before = self.meshes.len();
        self.meshes.retain(|key, _| desired.contains(key));
        before - self.meshes.len()
    }

    /// Sub-chunks of `desired` that must be built: those not resident plus those dirty.
    /// Sorted so builds are issued in a stable order.
    pub fn plan(&self, desired: &HashSet<SubChunkKey>, dirty: &HashSet<SubChunkKey>) -> Vec<SubChunkKey> {
        let mut keys: Vec<_> = desired
            .iter()
            .filter(|key| !self.meshes.contains_key(key) || dirty.contains(key))
            .copied()
            .collect();
        keys.sort_unstable();
        keys
    }

    pub fn stats(&self) -> MeshStats {
        self.meshes.values().fold(
            MeshStats {
                sub_chunks: self.meshes.len(),
                ..MeshStats::default()
            },
            |mut stats, mesh| {
                stats.terrain_vertices += mesh.terrain.vertex_count();
                stats.grass_vertices += mesh.grass.vertex_count();
                stats
            },
        )
    }
}
