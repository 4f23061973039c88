//! # Block Type Module
//!
//! This module defines the different types of blocks in the voxel world.
//! It provides block id conversion from the compact storage integer and the
//! solidity/transparency predicates consumed by generation, meshing and raycasting.

use std::fmt;

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use super::BlockTypeSize;

/// Enumerates all possible block types in the voxel world.
///
/// The discriminant is the value stored in chunk buffers and packed by the chunk
/// codec, so the order must never change.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, FromPrimitive)]
pub enum BlockId {
    /// Empty space.
    #[default]
    Air = 0,
    /// Dirt topped with grass; the decoratable terrain surface.
    GrassBlock = 1,
    /// Plain dirt, fills terrain columns below the surface.
    Dirt = 2,
    /// Oak trunk.
    Wood = 3,
    /// Oak canopy.
    Leaves = 4,
    /// Non-solid grass tuft rendered as crossed billboards.
    Grass = 5,
    BirchWood = 6,
    BirchLeaves = 7,
    SpruceWood = 8,
    SpruceLeaves = 9,
    JungleWood = 10,
    JungleLeaves = 11,
    AcaciaWood = 12,
    AcaciaLeaves = 13,
    DarkOakWood = 14,
    DarkOakLeaves = 15,
    CherryWood = 16,
    CherryLeaves = 17,
}

impl BlockId {
    /// Number of block ids in the catalog.
    pub const COUNT: usize = 18;

    /// Every block id in discriminant order.
    pub const ALL: [BlockId; Self::COUNT] = [
        BlockId::Air,
        BlockId::GrassBlock,
        BlockId::Dirt,
        BlockId::Wood,
        BlockId::Leaves,
        BlockId::Grass,
        BlockId::BirchWood,
        BlockId::BirchLeaves,
        BlockId::SpruceWood,
        BlockId::SpruceLeaves,
        BlockId::JungleWood,
        BlockId::JungleLeaves,
        BlockId::AcaciaWood,
        BlockId::AcaciaLeaves,
        BlockId::DarkOakWood,
        BlockId::DarkOakLeaves,
        BlockId::CherryWood,
        BlockId::CherryLeaves,
    ];

    /// Converts a stored `BlockTypeSize` into a `BlockId`.
    ///
    /// Values outside the catalog read as air, the same policy used for
    /// out-of-bounds lookups.
    pub fn from_raw(raw: BlockTypeSize) -> Self {
        BlockId::from_u8(raw).unwrap_or(BlockId::Air)
    }

    /// The compact storage representation of this id.
    pub fn raw(self) -> BlockTypeSize {
        self as BlockTypeSize
    }

    /// Whether this block occupies its voxel and occludes neighbouring faces.
    pub fn is_solid(self) -> bool {
        match self {
            BlockId::Air | BlockId::Grass => false,
            BlockId::GrassBlock
            | BlockId::Dirt
            | BlockId::Wood
            | BlockId::Leaves
            | BlockId::BirchWood
            | BlockId::BirchLeaves
            | BlockId::SpruceWood
            | BlockId::SpruceLeaves
            | BlockId::JungleWood
            | BlockId::JungleLeaves
            | BlockId::AcaciaWood
            | BlockId::AcaciaLeaves
            | BlockId::DarkOakWood
            | BlockId::DarkOakLeaves
            | BlockId::CherryWood
            | BlockId::CherryLeaves => true,
        }
    }

    /// Whether a solid neighbour facing this block must draw its face.
    pub fn is_transparent(self) -> bool {
        !self.is_solid()
    }

    /// Whether the mesh builder produces any geometry for this block.
    pub fn is_renderable(self) -> bool {
        !matches!(self, BlockId::Air)
    }

    /// Whether the aim ray stops on this block.
    ///
    /// Grass tufts are not solid but can still be targeted and broken.
    pub fn is_targetable(self) -> bool {
        match self {
            BlockId::Air => false,
            BlockId::Grass => true,
            other => other.is_solid(),
        }
    }

    /// Whether this block is any tree canopy block.
    pub fn is_leaves(self) -> bool {
        matches!(
            self,
            BlockId::Leaves
                | BlockId::BirchLeaves
                | BlockId::SpruceLeaves
                | BlockId::JungleLeaves
                | BlockId::AcaciaLeaves
                | BlockId::DarkOakLeaves
                | BlockId::CherryLeaves
        )
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(super::BLOCK_CATALOG.get(*self).name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_round_trip() {
        for id in BlockId::ALL {
            assert_eq!(BlockId::from_raw(id.raw()), id);
        }
    }

    #[test]
    fn unknown_raw_values_read_as_air() {
        assert_eq!(BlockId::from_raw(18), BlockId::Air);
        assert_eq!(BlockId::from_raw(255), BlockId::Air);
    }

    #[test]
    fn grass_plant_is_targetable_but_not_solid() {
        assert!(!BlockId::Grass.is_solid());
        assert!(BlockId::Grass.is_transparent());
        assert!(BlockId::Grass.is_targetable());
        assert!(BlockId::Grass.is_renderable());
    }

    #[test]
    fn air_is_inert() {
        assert!(!BlockId::Air.is_solid());
        assert!(!BlockId::Air.is_targetable());
        assert!(!BlockId::Air.is_renderable());
    }
}
