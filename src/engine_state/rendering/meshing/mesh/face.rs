use crate::engine_state::rendering::texture_atlas::TileUvs;
use crate::engine_state::voxels::block::block_side::BlockSide;

use super::mesh_data::MeshWriter;

/// Corner offsets of each face quad relative to the voxel's minimum corner.
///
/// Corners run `a, b, c, d` counter-clockwise seen from outside the block, with `a`
/// and `d` on the lower edge for side faces, so triangles `a b c` and `a c d` face
/// outward.
const FACE_CORNERS: [[[f32; 3]; 4]; 6] = [
    // RIGHT (+X)
    [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0], [1.0, 0.0, 1.0]],
    // LEFT (-X)
    [[0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]],
    // TOP (+Y)
    [[0.0, 1.0, 0.0], [0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0]],
    // BOTTOM (-Y)
    [[0.0, 0.0, 1.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0]],
    // FRONT (+Z)
    [[1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0], [0.0, 0.0, 1.0]],
    // BACK (-Z)
    [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]],
];

/// A single visible block face waiting to be written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// World-space minimum corner of the voxel.
    pub origin: [i32; 3],
    pub side: BlockSide,
    pub tile: TileUvs,
    /// Tonal variant. Bit 0 mirrors the tile horizontally; on top and bottom faces
    /// bit 1 also mirrors it vertically.
    pub variant: u32,
}

impl Face {
    pub fn new(origin: [i32; 3], side: BlockSide, tile: TileUvs, variant: u32) -> Self {
        Face {
            origin,
            side,
            tile,
            variant,
        }
    }

    /// World-space corners `a, b, c, d`.
    pub fn corners(&self) -> [[f32; 3]; 4] {
        let [x, y, z] = self.origin.map(|v| v as f32);
        FACE_CORNERS[self.side as usize].map(|[cx, cy, cz]| [x + cx, y + cy, z + cz])
    }

    /// Texture coordinates of `a, b, c, d`: `a` takes the tile's lower-left corner and
    /// `b` the upper-left.
    pub fn uvs(&self) -> [[f32; 2]; 4] {
        let TileUvs { mut u0, mut v0, mut u1, mut v1 } = self.tile;
        if self.variant & 1 == 1 {
            std::mem::swap(&mut u0, &mut u1);
        }
        if self.side.is_vertical() && self.variant & 2 == 2 {
            std::mem::swap(&mut v0, &mut v1);
        }
        [[u0, v0], [u0, v1], [u1, v1], [u1, v0]]
    }

    /// Writes the face, returning `false` if the writer is full.
    pub fn write(&self, writer: &mut MeshWriter) -> bool {
        writer.push_quad(self.corners(), self.side.normal(), self.uvs())
    }
}
