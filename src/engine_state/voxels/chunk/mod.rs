//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a dense 32x32x32 column of block ids
//! addressed by integer chunk coordinates on the horizontal plane.
//!
//! ## Memory Layout
//!
//! Blocks are stored in a flat byte vector, one `BlockTypeSize` per voxel, indexed
//! `x + z * CHUNK_SIZE + y * CHUNK_SIZE * CHUNK_SIZE`. A horizontal layer is therefore
//! contiguous, which keeps the column fill of the terrain generator and the per-layer
//! walks of the mesh builder cache friendly.
//!
//! ### Performance Characteristics
//! - **Block Lookup**: O(1)
//! - **Memory Usage**: 32 KiB per chunk
//! - **Transfer**: chunks are cloned into background tasks, never shared

use cgmath::Point3;

use super::block::{block_type::BlockId, BlockTypeSize};

pub mod chunk_packing;

/// Horizontal edge length of a chunk in blocks.
pub const CHUNK_SIZE: i32 = 32;
/// Vertical extent of a chunk in blocks. Height is not chunked.
pub const CHUNK_HEIGHT: i32 = 32;
/// The number of voxels in one horizontal layer.
pub const CHUNK_LAYER_SIZE: usize = (CHUNK_SIZE * CHUNK_SIZE) as usize;
/// The total number of voxels in a chunk.
pub const CHUNK_VOLUME: usize = CHUNK_LAYER_SIZE * CHUNK_HEIGHT as usize;

/// A dense block volume of `CHUNK_SIZE x CHUNK_HEIGHT x CHUNK_SIZE` voxels.
#[derive(Clone, PartialEq, Eq)]
pub struct Chunk {
    blocks: Vec<BlockTypeSize>,
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let solid = self
            .blocks
            .iter()
            .filter(|raw| BlockId::from_raw(**raw).is_solid())
            .count();
        f.debug_struct("Chunk").field("solid_voxels", &solid).finish()
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::empty()
    }
}

impl Chunk {
    /// Creates a new, completely empty chunk (all blocks are air).
    pub fn empty() -> Self {
        Chunk {
            blocks: vec![BlockId::Air.raw(); CHUNK_VOLUME],
        }
    }

    /// Wraps an existing voxel buffer.
    ///
    /// Returns `None` if the buffer does not hold exactly `CHUNK_VOLUME` voxels.
    pub fn from_raw(blocks: Vec<BlockTypeSize>) -> Option<Self> {
        (blocks.len() == CHUNK_VOLUME).then_some(Chunk { blocks })
    }

    /// Computes the flat index of a local coordinate, or `None` when it lies outside
    /// the chunk.
    pub fn index_of(x: i32, y: i32, z: i32) -> Option<usize> {
        if !(0..CHUNK_SIZE).contains(&x)
            || !(0..CHUNK_HEIGHT).contains(&y)
            || !(0..CHUNK_SIZE).contains(&z)
        {
            return None;
        }
        Some((x + z * CHUNK_SIZE + y * CHUNK_SIZE * CHUNK_SIZE) as usize)
    }

    /// Inverse of [`Chunk::index_of`].
    pub fn position_of(index: usize) -> Point3<i32> {
        let index = index as i32;
        let layer = CHUNK_SIZE * CHUNK_SIZE;
        Point3::new(index % CHUNK_SIZE, index / layer, (index % layer) / CHUNK_SIZE)
    }

    /// Gets the block at the specified chunk-relative coordinates.
    ///
    /// Out-of-range coordinates read as air.
    pub fn get(&self, x: i32, y: i32, z: i32) -> BlockId {
        match Self::index_of(x, y, z) {
            Some(index) => BlockId::from_raw(self.blocks[index]),
            None => BlockId::Air,
        }
    }

    /// Sets the block at the specified chunk-relative coordinates.
    ///
    /// Returns `false` and leaves the chunk untouched if the coordinates are out of
    /// range.
    pub fn set(&mut self, x: i32, y: i32, z: i32, block: BlockId) -> bool {
        match Self::index_of(x, y, z) {
            Some(index) => {
                self.blocks[index] = block.raw();
                true
            }
            None => false,
        }
    }

    /// The raw voxel buffer in storage order.
    pub fn as_raw(&self) -> &[BlockTypeSize] {
        &self.blocks
    }

    /// Mutable access to the raw voxel buffer, used by bulk writers.
    pub fn as_raw_mut(&mut self) -> &mut [BlockTypeSize] {
        &mut self.blocks
    }

    /// Returns the y of the highest solid block in a column, if any.
    pub fn surface_height(&self, x: i32, z: i32) -> Option<i32> {
        (0..CHUNK_HEIGHT).rev().find(|y| self.get(x, *y, z).is_solid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_and_position_are_inverse() {
        for index in [0, 1, 31, 32, 1023, 1024, 5000, CHUNK_VOLUME - 1] {
            let p = Chunk::position_of(index);
            assert_eq!(Chunk::index_of(p.x, p.y, p.z), Some(index));
        }
    }

    #[test]
    fn layout_is_x_then_z_then_y() {
        assert_eq!(Chunk::index_of(1, 0, 0), Some(1));
        assert_eq!(Chunk::index_of(0, 0, 1), Some(32));
        assert_eq!(Chunk::index_of(0, 1, 0), Some(1024));
    }

    #[test]
    fn out_of_range_reads_air_and_ignores_writes() {
        let mut chunk = Chunk::empty();
        assert!(!chunk.set(-1, 0, 0, BlockId::Dirt));
        assert!(!chunk.set(0, CHUNK_HEIGHT, 0, BlockId::Dirt));
        assert_eq!(chunk.get(CHUNK_SIZE, 0, 0), BlockId::Air);
        assert_eq!(chunk, Chunk::empty());
    }

    #[test]
    fn surface_height_finds_top_solid() {
        let mut chunk = Chunk::empty();
        chunk.set(3, 7, 4, BlockId::GrassBlock);
        chunk.set(3, 8, 4, BlockId::Grass);
        assert_eq!(chunk.surface_height(3, 4), Some(7));
        assert_eq!(chunk.surface_height(0, 0), None);
    }
}
