//! Sub-chunk addressing.
//!
//! Chunks are tiled into 8x8x8 cubes for incremental meshing. A `SubChunkKey` is a
//! coordinate on the global sub-chunk grid, so keys from neighbouring chunks compare and
//! hash like any other.

use cgmath::{MetricSpace, Point3};

use crate::engine_state::voxels::chunk::{CHUNK_HEIGHT, CHUNK_SIZE};
use crate::engine_state::voxels::world::ChunkKey;

/// Edge length of a sub-chunk in blocks.
pub const SUB_CHUNK_SIZE: i32 = 8;
/// Sub-chunks along each horizontal axis of a chunk.
pub const SUB_CHUNKS_PER_SIDE: i32 = CHUNK_SIZE / SUB_CHUNK_SIZE;
/// Sub-chunk layers in a chunk column.
pub const SUB_CHUNK_LAYERS: i32 = CHUNK_HEIGHT / SUB_CHUNK_SIZE;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubChunkKey {
    pub sx: i32,
    pub sy: i32,
    pub sz: i32,
}

impl SubChunkKey {
    pub const fn new(sx: i32, sy: i32, sz: i32) -> Self {
        SubChunkKey { sx, sy, sz }
    }

    /// The sub-chunk containing a world block, or `None` above or below the column.
    pub fn containing(x: i32, y: i32, z: i32) -> Option<Self> {
        if !(0..CHUNK_HEIGHT).contains(&y) {
            return None;
        }
        Some(SubChunkKey {
            sx: x.div_euclid(SUB_CHUNK_SIZE),
            sy: y / SUB_CHUNK_SIZE,
            sz: z.div_euclid(SUB_CHUNK_SIZE),
        })
    }

    /// Whether the key lies inside the vertical extent of the world.
    pub fn is_valid(&self) -> bool {
        (0..SUB_CHUNK_LAYERS).contains(&self.sy)
    }

    /// The chunk this sub-chunk belongs to.
    pub fn chunk(&self) -> ChunkKey {
        ChunkKey::new(
            self.sx.div_euclid(SUB_CHUNKS_PER_SIDE),
            self.sz.div_euclid(SUB_CHUNKS_PER_SIDE),
        )
    }

    /// World-space minimum block.
    pub fn min_block(&self) -> Point3<i32> {
        Point3::new(
            self.sx * SUB_CHUNK_SIZE,
            self.sy * SUB_CHUNK_SIZE,
            self.sz * SUB_CHUNK_SIZE,
        )
    }

    pub fn center(&self) -> Point3<f32> {
        let min = self.min_block();
        let half = SUB_CHUNK_SIZE as f32 * 0.5;
        Point3::new(min.x as f32 + half, min.y as f32 + half, min.z as f32 + half)
    }

    /// Whether any voxel of the cube can lie within `render_distance` of `center`.
    pub fn in_range(&self, center: Point3<f32>, render_distance: f32) -> bool {
        let half_diagonal = SUB_CHUNK_SIZE as f32 * 0.5 * 3f32.sqrt();
        self.center().distance(center) <= render_distance + half_diagonal
    }

    /// The six face-adjacent sub-chunks that exist vertically.
    pub fn face_neighbors(&self) -> impl Iterator<Item = SubChunkKey> {
        let SubChunkKey { sx, sy, sz } = *self;
        [
            (1, 0, 0),
            (-1, 0, 0),
            (0, 1, 0),
            (0, -1, 0),
            (0, 0, 1),
            (0, 0, -1),
        ]
        .into_iter()
        .map(move |(dx, dy, dz)| SubChunkKey::new(sx + dx, sy + dy, sz + dz))
        .filter(SubChunkKey::is_valid)
    }

    /// All sub-chunks of a chunk.
    pub fn of_chunk(chunk: ChunkKey) -> impl Iterator<Item = SubChunkKey> {
        let base_x = chunk.cx * SUB_CHUNKS_PER_SIDE;
        let base_z = chunk.cz * SUB_CHUNKS_PER_SIDE;
        (0..SUB_CHUNK_LAYERS).flat_map(move |sy| {
            (0..SUB_CHUNKS_PER_SIDE).flat_map(move |dz| {
                (0..SUB_CHUNKS_PER_SIDE).map(move |dx| SubChunkKey::new(base_x + dx, sy, base_z + dz))
            })
        })
    }

    /// Sub-chunks of `chunk` that share a face with the edge-adjacent chunk `toward`.
    ///
    /// Returns nothing if the two chunks are not edge neighbours.
    pub fn along_edge(chunk: ChunkKey, toward: ChunkKey) -> impl Iterator<Item = SubChunkKey> {
        let (dx, dz) = (toward.cx - chunk.cx, toward.cz - chunk.cz);
        let adjacent = dx.abs() + dz.abs() == 1;
        let last = SUB_CHUNKS_PER_SIDE - 1;
        SubChunkKey::of_chunk(chunk).filter(move |key| {
            let local_x = key.sx.rem_euclid(SUB_CHUNKS_PER_SIDE);
            let local_z = key.sz.rem_euclid(SUB_CHUNKS_PER_SIDE);
            adjacent
                && match (dx, dz) {
                    (1, _) => local_x == last,
                    (-1, _) => local_x == 0,
                    (_, 1) => local_z == last,
                    _ => local_z == 0,
                }
        })
    }
}
