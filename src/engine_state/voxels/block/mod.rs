//! # Block Module
//!
//! This module provides the core block-related functionality for the voxel engine.
//! It includes block id definitions, block face handling, and the immutable block
//! catalog shared by the generator, the mesh builder and the codec.

use block_type::BlockId;

use crate::engine_state::rendering::texture_atlas::TileId;

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in memory.
/// This is used for efficient storage and serialization of block data.
pub type BlockTypeSize = u8;

/// Geometry parameters for non-solid vegetation drawn as crossed billboards.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlantSchema {
    /// Horizontal extent of each billboard quad, in blocks.
    pub width: f32,
    /// Nominal billboard height before per-voxel jitter, in blocks.
    pub height: f32,
    /// Atlas tile spanned by both quads.
    pub tile: TileId,
}

/// Static description of one block type.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BlockDef {
    pub id: BlockId,
    pub name: &'static str,
    /// Tile index per face, in [`block_side::BlockSide`] order: +X, -X, +Y, -Y, +Z, -Z.
    pub face_tiles: [TileId; 6],
    /// Number of tonal variants per face. 1 means no variation.
    pub face_variation: u8,
    pub plant: Option<PlantSchema>,
}

impl BlockDef {
    const fn uniform(id: BlockId, name: &'static str, tile: TileId) -> Self {
        BlockDef {
            id,
            name,
            face_tiles: [tile; 6],
            face_variation: 1,
            plant: None,
        }
    }
}

/// The block catalog, indexed by block id.
///
/// There is exactly one instance, [`BLOCK_CATALOG`], built at compile time and
/// never mutated.
#[derive(Debug)]
pub struct BlockCatalog {
    defs: [BlockDef; BlockId::COUNT],
}

impl BlockCatalog {
    /// Looks up the definition of a block.
    pub fn get(&self, id: BlockId) -> &BlockDef {
        &self.defs[id as usize]
    }

    /// Resolves a block by its catalog name.
    pub fn by_name(&self, name: &str) -> Option<BlockId> {
        BLOCK_NAMES.get(name).copied()
    }

    /// Iterates over every definition in id order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockDef> {
        self.defs.iter()
    }
}

pub static BLOCK_CATALOG: BlockCatalog = BlockCatalog {
    defs: [
        BlockDef::uniform(BlockId::Air, "air", TileId::Dirt),
        BlockDef {
            id: BlockId::GrassBlock,
            name: "grass_block",
            face_tiles: [
                TileId::GrassSide,
                TileId::GrassSide,
                TileId::GrassTop,
                TileId::Dirt,
                TileId::GrassSide,
                TileId::GrassSide,
            ],
            face_variation: 4,
            plant: None,
        },
        BlockDef {
            id: BlockId::Dirt,
            name: "dirt",
            face_tiles: [TileId::Dirt; 6],
            face_variation: 4,
            plant: None,
        },
        BlockDef::uniform(BlockId::Wood, "wood", TileId::Wood),
        BlockDef::uniform(BlockId::Leaves, "leaves", TileId::Leaves),
        BlockDef {
            id: BlockId::Grass,
            name: "grass",
            face_tiles: [TileId::Dirt; 6],
            face_variation: 1,
            plant: Some(PlantSchema {
                width: 0.8,
                height: 0.9,
                tile: TileId::GrassPlant,
            }),
        },
        BlockDef::uniform(BlockId::BirchWood, "birch_wood", TileId::BirchWood),
        BlockDef::uniform(BlockId::BirchLeaves, "birch_leaves", TileId::BirchLeaves),
        BlockDef::uniform(BlockId::SpruceWood, "spruce_wood", TileId::SpruceWood),
        BlockDef::uniform(BlockId::SpruceLeaves, "spruce_leaves", TileId::SpruceLeaves),
        BlockDef::uniform(BlockId::JungleWood, "jungle_wood", TileId::JungleWood),
        BlockDef::uniform(BlockId::JungleLeaves, "jungle_leaves", TileId::JungleLeaves),
        BlockDef::uniform(BlockId::AcaciaWood, "acacia_wood", TileId::AcaciaWood),
        BlockDef::uniform(BlockId::AcaciaLeaves, "acacia_leaves", TileId::AcaciaLeaves),
        BlockDef::uniform(BlockId::DarkOakWood, "dark_oak_wood", TileId::DarkOakWood),
        BlockDef::uniform(BlockId::DarkOakLeaves, "dark_oak_leaves", TileId::DarkOakLeaves),
        BlockDef::uniform(BlockId::CherryWood, "cherry_wood", TileId::CherryWood),
        BlockDef::uniform(BlockId::CherryLeaves, "cherry_leaves", TileId::CherryLeaves),
    ],
};

/// Compile-time map from catalog name to block id, used when block choices
/// come from configuration or saved settings.
static BLOCK_NAMES: phf::Map<&'static str, BlockId> = phf::phf_map! {
    "air" => BlockId::Air,
    "grass_block" => BlockId::GrassBlock,
    "dirt" => BlockId::Dirt,
    "wood" => BlockId::Wood,
    "leaves" => BlockId::Leaves,
    "grass" => BlockId::Grass,
    "birch_wood" => BlockId::BirchWood,
    "birch_leaves" => BlockId::BirchLeaves,
    "spruce_wood" => BlockId::SpruceWood,
    "spruce_leaves" => BlockId::SpruceLeaves,
    "jungle_wood" => BlockId::JungleWood,
    "jungle_leaves" => BlockId::JungleLeaves,
    "acacia_wood" => BlockId::AcaciaWood,
    "acacia_leaves" => BlockId::AcaciaLeaves,
    "dark_oak_wood" => BlockId::DarkOakWood,
    "dark_oak_leaves" => BlockId::DarkOakLeaves,
    "cherry_wood" => BlockId::CherryWood,
    "cherry_leaves" => BlockId::CherryLeaves,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_indexed_by_id() {
        for (index, def) in BLOCK_CATALOG.iter().enumerate() {
            assert_eq!(def.id as usize, index);
        }
    }

    #[test]
    fn names_resolve_to_their_definitions() {
        for def in BLOCK_CATALOG.iter() {
            assert_eq!(BLOCK_CATALOG.by_name(def.name), Some(def.id));
        }
        assert_eq!(BLOCK_CATALOG.by_name("stone"), None);
    }

    #[test]
    fn only_non_solid_blocks_carry_plant_schemas() {
        for def in BLOCK_CATALOG.iter() {
            if def.plant.is_some() {
                assert!(!def.id.is_solid());
            }
        }
        assert!(BLOCK_CATALOG.get(BlockId::Grass).plant.is_some());
    }
}
