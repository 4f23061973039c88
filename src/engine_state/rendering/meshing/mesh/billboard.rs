//! Crossed-quad billboards for vegetation.
//!
//! A plant voxel is drawn as two vertical quads along the diagonals of its footprint,
//! each written twice (front and back) so it is visible from both sides with back-face
//! culling enabled. The quad height is jittered per voxel from the shared terrain hash.

use std::f32::consts::FRAC_1_SQRT_2;

use crate::engine_state::voxels::block::PlantSchema;
use crate::engine_state::voxels::terrain::hash::{random01, terrain_hash};

use super::mesh_data::MeshWriter;

/// Lower bound of the height jitter factor.
pub const HEIGHT_JITTER_MIN: f32 = 0.85;
/// Width of the height jitter band.
pub const HEIGHT_JITTER_SPAN: f32 = 0.30;

/// Billboard height of the plant at a world voxel.
pub fn plant_height(schema: &PlantSchema, x: i32, y: i32, z: i32) -> f32 {
    let h = terrain_hash(x, y, z, 0, 0, 0);
    schema.height * (HEIGHT_JITTER_MIN + HEIGHT_JITTER_SPAN * random01(h))
}

/// Writes the four quads of a plant billboard.
///
/// # Returns
/// `false` if any quad was dropped for lack of capacity.
pub fn write_billboard(writer: &mut MeshWriter, schema: &PlantSchema, x: i32, y: i32, z: i32) -> bool {
    let half = schema.width * 0.5 * FRAC_1_SQRT_2;
    let (cx, cz) = (x as f32 + 0.5, z as f32 + 0.5);
    let y0 = y as f32;
    let y1 = y0 + plant_height(schema, x, y, z);
    let tile = schema.tile.uvs();
    let uvs = [
        [tile.u0, tile.v0],
        [tile.u0, tile.v1],
        [tile.u1, tile.v1],
        [tile.u1, tile.v0],
    ];

    // Endpoints of each diagonal and the normal of its front side.
    let planes = [
        ((cx - half, cz - half), (cx + half, cz + half), [FRAC_1_SQRT_2, 0.0, -FRAC_1_SQRT_2]),
        ((cx - half, cz + half), (cx + half, cz - half), [-FRAC_1_SQRT_2, 0.0, -FRAC_1_SQRT_2]),
    ];

    let mut complete = true;
    for ((x0, z0), (x1, z1), normal) in planes {
        let a = [x0, y0, z0];
        let b = [x0, y1, z0];
        let c = [x1, y1, z1];
        let d = [x1, y0, z1];
        complete &= writer.push_quad([a, b, c, d], normal, uvs);

        // Back side: same corners, reversed winding, mirrored UVs.
        let back = normal.map(|v| -v);
        complete &= writer.push_quad([d, c, b, a], back, [uvs[3], uvs[2], uvs[1], uvs[0]]);
    }
    complete
}
