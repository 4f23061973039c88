//! # World Module
//!
//! This module provides the `World` struct which owns every chunk of a session together
//! with the rectangle of chunk coordinates that have been generated so far.
//!
//! ## Architecture
//!
//! The world is sparse on the horizontal plane: chunks are keyed by `ChunkKey { cx, cz }`
//! and each one holds its full vertical column. World-space lookups floor-divide into
//! chunk coordinates, so negative coordinates address the chunks west and south of the
//! origin without special cases.
//!
//! ## Bounds
//!
//! `WorldBounds` only ever grows. Every coordinate inside the bounds has a chunk once a
//! generation pass completes, and chunks are never removed.
//!
//! ## Performance Considerations
//!
//! - Chunk lookup is O(1) using a hash map
//! - Background work receives cloned snapshots (`ChunkMap`) rather than shared references

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use cgmath::Point3;

use super::block::block_type::BlockId;
use super::chunk::{Chunk, CHUNK_HEIGHT, CHUNK_SIZE};

/// Integer grid coordinate of a chunk on the horizontal plane.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    pub cx: i32,
    pub cz: i32,
}

impl ChunkKey {
    pub const fn new(cx: i32, cz: i32) -> Self {
        ChunkKey { cx, cz }
    }

    /// The chunk containing a world-space block column.
    pub fn containing(x: i32, z: i32) -> Self {
        ChunkKey {
            cx: x.div_euclid(CHUNK_SIZE),
            cz: z.div_euclid(CHUNK_SIZE),
        }
    }

    /// World-space block coordinates of the chunk's (0, 0) column.
    pub fn origin(&self) -> (i32, i32) {
        (self.cx * CHUNK_SIZE, self.cz * CHUNK_SIZE)
    }

    /// The four chunks sharing an edge with this one.
    pub fn edge_neighbors(&self) -> [ChunkKey; 4] {
        [
            ChunkKey::new(self.cx + 1, self.cz),
            ChunkKey::new(self.cx - 1, self.cz),
            ChunkKey::new(self.cx, self.cz + 1),
            ChunkKey::new(self.cx, self.cz - 1),
        ]
    }
}

/// Keys are persisted as `"{cx}_{cz}"`.
impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.cx, self.cz)
    }
}

impl FromStr for ChunkKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (cx, cz) = s
            .split_once('_')
            .ok_or_else(|| format!("chunk key `{s}` has no separator"))?;
        let cx = cx.parse().map_err(|_| format!("bad chunk x in `{s}`"))?;
        let cz = cz.parse().map_err(|_| format!("bad chunk z in `{s}`"))?;
        Ok(ChunkKey { cx, cz })
    }
}

/// Inclusive rectangle of chunk coordinates that exist in the world.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WorldBounds {
    #[serde(rename = "minCX")]
    pub min_cx: i32,
    #[serde(rename = "maxCX")]
    pub max_cx: i32,
    #[serde(rename = "minCZ")]
    pub min_cz: i32,
    #[serde(rename = "maxCZ")]
    pub max_cz: i32,
}

impl WorldBounds {
    /// A square of chunks centred on the origin chunk.
    pub fn around_origin(radius: i32) -> Self {
        let radius = radius.max(0);
        WorldBounds {
            min_cx: -radius,
            max_cx: radius,
            min_cz: -radius,
            max_cz: radius,
        }
    }

    pub fn contains(&self, key: ChunkKey) -> bool {
        (self.min_cx..=self.max_cx).contains(&key.cx) && (self.min_cz..=self.max_cz).contains(&key.cz)
    }

    /// Smallest rectangle covering both `self` and `other`.
    pub fn union(&self, other: &WorldBounds) -> WorldBounds {
        WorldBounds {
            min_cx: self.min_cx.min(other.min_cx),
            max_cx: self.max_cx.max(other.max_cx),
            min_cz: self.min_cz.min(other.min_cz),
            max_cz: self.max_cz.max(other.max_cz),
        }
    }

    /// Whether `self` covers every coordinate of `other`.
    pub fn covers(&self, other: &WorldBounds) -> bool {
        self.min_cx <= other.min_cx
            && self.max_cx >= other.max_cx
            && self.min_cz <= other.min_cz
            && self.max_cz >= other.max_cz
    }

    /// Iterates every key inside the rectangle, row by row.
    pub fn keys(&self) -> impl Iterator<Item = ChunkKey> {
        let (min_cx, max_cx) = (self.min_cx, self.max_cx);
        (self.min_cz..=self.max_cz)
            .flat_map(move |cz| (min_cx..=max_cx).map(move |cx| ChunkKey::new(cx, cz)))
    }

    /// Number of chunk coordinates inside the rectangle.
    pub fn area(&self) -> usize {
        let width = (self.max_cx - self.min_cx + 1).max(0) as usize;
        let depth = (self.max_cz - self.min_cz + 1).max(0) as usize;
        width * depth
    }

    /// Returns the rectangle grown by one chunk toward every edge the player is within
    /// `threshold` blocks of, or `None` when no edge is that close.
    pub fn expanded_toward(&self, player_x: f32, player_z: f32, threshold: f32) -> Option<WorldBounds> {
        let world_min_x = (self.min_cx * CHUNK_SIZE) as f32;
        let world_max_x = ((self.max_cx + 1) * CHUNK_SIZE) as f32;
        let world_min_z = (self.min_cz * CHUNK_SIZE) as f32;
        let world_max_z = ((self.max_cz + 1) * CHUNK_SIZE) as f32;

        let need_west = player_x < world_min_x + threshold;
        let need_east = player_x > world_max_x - threshold;
        let need_south = player_z < world_min_z + threshold;
        let need_north = player_z > world_max_z - threshold;

        if !(need_west || need_east || need_south || need_north) {
            return None;
        }

        Some(WorldBounds {
            min_cx: self.min_cx - need_west as i32,
            max_cx: self.max_cx + need_east as i32,
            min_cz: self.min_cz - need_south as i32,
            max_cz: self.max_cz + need_north as i32,
        })
    }
}

/// Read-only access to blocks by world coordinate.
///
/// Implemented by the live [`World`] and by the chunk snapshots handed to background
/// tasks, so the mesh builder and raycaster run unchanged on either.
pub trait BlockLookup {
    fn chunk(&self, key: ChunkKey) -> Option<&Chunk>;

    /// Block at a world coordinate. Missing chunks and heights outside the column read
    /// as air.
    fn block_at(&self, x: i32, y: i32, z: i32) -> BlockId {
        if !(0..CHUNK_HEIGHT).contains(&y) {
            return BlockId::Air;
        }
        match self.chunk(ChunkKey::containing(x, z)) {
            Some(chunk) => chunk.get(x.rem_euclid(CHUNK_SIZE), y, z.rem_euclid(CHUNK_SIZE)),
            None => BlockId::Air,
        }
    }
}

/// Owned chunk collection, used for snapshots and generation results.
pub type ChunkMap = HashMap<ChunkKey, Chunk>;

impl BlockLookup for ChunkMap {
    fn chunk(&self, key: ChunkKey) -> Option<&Chunk> {
        self.get(&key)
    }
}

/// Represents a voxel world composed of multiple chunks.
///
/// # Examples
///
/// ```
/// use voxel_sandbox::engine_state::voxels::world::{World, WorldBounds, ChunkKey, BlockLookup};
/// use voxel_sandbox::engine_state::voxels::chunk::Chunk;
/// use voxel_sandbox::engine_state::voxels::block::block_type::BlockId;
///
/// let mut world = World::new(WorldBounds::around_origin(0));
/// world.insert_if_absent(ChunkKey::new(0, 0), Chunk::empty());
/// world.set_block(3, 4, 5, BlockId::Dirt);
/// assert_eq!(world.block_at(3, 4, 5), BlockId::Dirt);
/// ```
#[derive(Debug, Clone)]
pub struct World {
    chunks: ChunkMap,
    bounds: WorldBounds,
}

impl World {
    /// Creates a world with no chunks and the given starting rectangle.
    pub fn new(bounds: WorldBounds) -> Self {
        World {
            chunks: HashMap::new(),
            bounds,
        }
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    /// Grows the bounds to cover `other`. Never shrinks.
    pub fn extend_bounds(&mut self, other: &WorldBounds) {
        self.bounds = self.bounds.union(other);
    }

    pub fn contains(&self, key: ChunkKey) -> bool {
        self.chunks.contains_key(&key)
    }

    pub fn chunk_mut(&mut self, key: ChunkKey) -> Option<&mut Chunk> {
        self.chunks.get_mut(&key)
    }

    /// Inserts a chunk unless one already exists at `key`.
    ///
    /// # Returns
    /// `true` if the chunk was inserted.
    pub fn insert_if_absent(&mut self, key: ChunkKey, chunk: Chunk) -> bool {
        if self.chunks.contains_key(&key) {
            return false;
        }
        self.chunks.insert(key, chunk);
        true
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ChunkKey, &Chunk)> {
        self.chunks.iter()
    }

    /// Coordinates inside the bounds that have no chunk yet.
    pub fn missing_in(&self, bounds: &WorldBounds) -> Vec<ChunkKey> {
        bounds.keys().filter(|key| !self.chunks.contains_key(key)).collect()
    }

    /// Writes a block at a world coordinate.
    ///
    /// # Returns
    /// The key of the modified chunk, or `None` if the position is outside the column
    /// or its chunk does not exist.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: BlockId) -> Option<ChunkKey> {
        let key = ChunkKey::containing(x, z);
        let chunk = self.chunks.get_mut(&key)?;
        chunk
            .set(x.rem_euclid(CHUNK_SIZE), y, z.rem_euclid(CHUNK_SIZE), block)
            .then_some(key)
    }

    /// Samples the voxel containing a point, for axis-aligned collision checks.
    pub fn is_solid_at(&self, point: Point3<f32>) -> bool {
        self.block_at(
            point.x.floor() as i32,
            point.y.floor() as i32,
            point.z.floor() as i32,
        )
        .is_solid()
    }

    /// Copies the listed chunks that exist, for handing to a background task.
    pub fn snapshot(&self, keys: impl IntoIterator<Item = ChunkKey>) -> ChunkMap {
        keys.into_iter()
            .filter_map(|key| self.chunks.get(&key).map(|chunk| (key, chunk.clone())))
            .collect()
    }
}

impl BlockLookup for World {
    fn chunk(&self, key: ChunkKey) -> Option<&Chunk> {
        self.chunks.get(&key)
    }
}
