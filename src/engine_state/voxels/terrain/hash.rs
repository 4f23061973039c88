//! Coordinate hashing shared by every decoration pass.
//!
//! Grass tufts, tree sites, tree species and billboard jitter all draw from this one
//! function, so two subsystems asking about the same voxel always agree.

/// Deterministic 32-bit hash of a voxel position.
///
/// `x`, `z` are chunk-local and `offset_x`, `offset_z` the chunk origin in blocks; only
/// their sums enter the mix, so callers holding world coordinates may pass zero offsets.
/// All arithmetic wraps at 32 bits.
#[inline]
pub fn terrain_hash(x: i32, y: i32, z: i32, offset_x: i32, offset_z: i32, seed: u32) -> u32 {
    let mut h = (offset_x.wrapping_add(x) as u32)
        .wrapping_mul(374_761_393)
        .wrapping_add((offset_z.wrapping_add(z) as u32).wrapping_mul(668_265_263))
        .wrapping_add((y as u32).wrapping_mul(2_147_483_647))
        .wrapping_add(seed);
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    h ^ (h >> 16)
}

/// Reduces a hash to `[0, 1)` in steps of 1/1000.
#[inline]
pub fn random01(h: u32) -> f32 {
    (h % 1000) as f32 / 1000.0
}

/// Derives an independent stream from `seed` for a secondary draw.
#[inline]
pub fn salted(seed: u32, salt: u32) -> u32 {
    seed ^ salt.wrapping_mul(0x9e37_79b9)
}
