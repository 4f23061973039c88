//! Texture atlas layout.
//!
//! The atlas is a single row of square tiles. Pixel content is produced by the
//! presentation layer; the core only needs to know where each tile sits so it can
//! emit texture coordinates.

/// Edge length of one tile in pixels.
pub const TILE_SIZE: u32 = 16;
/// Number of tiles in the atlas row.
pub const TILE_COUNT: u32 = 18;

/// Index of a tile in the atlas row.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TileId {
    Dirt = 0,
    GrassTop = 1,
    /// Dirt with a strip of grass along the upper edge.
    GrassSide = 2,
    Wood = 3,
    Leaves = 4,
    /// Grass tuft with an alpha-tested background.
    GrassPlant = 5,
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

/// Texture-space rectangle covered by a tile.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TileUvs {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl TileId {
    /// Returns the UV rectangle of this tile. `v0` is the bottom edge.
    pub fn uvs(self) -> TileUvs {
        let index = self as u32;
        TileUvs {
            u0: (index * TILE_SIZE) as f32 / (TILE_COUNT * TILE_SIZE) as f32,
            v0: 0.0,
            u1: ((index + 1) * TILE_SIZE) as f32 / (TILE_COUNT * TILE_SIZE) as f32,
            v1: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiles_partition_the_unit_interval() {
        assert_eq!(TileId::Dirt.uvs().u0, 0.0);
        assert_eq!(TileId::CherryLeaves.uvs().u1, 1.0);
        assert_eq!(TileId::GrassTop.uvs().u0, TileId::Dirt.uvs().u1);
    }
}
