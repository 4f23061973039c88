//! # Voxel Raycasting
//!
//! Finds the block the player is aiming at with an incremental grid traversal (DDA):
//! starting in the voxel containing the origin, the ray advances one voxel boundary at a
//! time along whichever axis reaches its next boundary first.
//!
//! Range is checked against the squared distance from the origin to each voxel centre
//! rather than against the traversal parameter, so diagonal rays are not penalised for
//! crossing more boundaries.

use cgmath::{Point3, Vector3};

use super::world::BlockLookup;

/// Default interaction range in blocks.
pub const DEFAULT_RAYCAST_RANGE: f32 = 5.0;

/// The block hit by a ray.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RaycastHit {
    /// The targetable voxel that stopped the ray.
    pub block: Point3<i32>,
    /// The voxel visited just before the hit, where a new block would be placed.
    pub previous: Point3<i32>,
}

/// Casts a ray through the block grid.
///
/// # Arguments
/// * `origin` - world-space ray start
/// * `direction` - ray direction, need not be normalised
/// * `max_range` - hits whose voxel centre lies farther than this are rejected
/// * `lookup` - block source
///
/// # Returns
/// The first targetable voxel within range, or `None`. A zero direction tests only the
/// voxel containing the origin.
pub fn cast(
    origin: Point3<f32>,
    direction: Vector3<f32>,
    max_range: f32,
    lookup: &impl BlockLookup,
) -> Option<RaycastHit> {
    let max_range_sq = max_range * max_range;
    let mut voxel = Point3::new(
        origin.x.floor() as i32,
        origin.y.floor() as i32,
        origin.z.floor() as i32,
    );
    let mut previous = voxel;

    let within_range = |v: Point3<i32>| {
        let dx = v.x as f32 + 0.5 - origin.x;
        let dy = v.y as f32 + 0.5 - origin.y;
        let dz = v.z as f32 + 0.5 - origin.z;
        dx * dx + dy * dy + dz * dz <= max_range_sq
    };
    let hit_at = |v: Point3<i32>, previous: Point3<i32>| {
        if !lookup.block_at(v.x, v.y, v.z).is_targetable() {
            return None;
        }
        Some(within_range(v).then_some(RaycastHit { block: v, previous }))
    };

    if direction.x == 0.0 && direction.y == 0.0 && direction.z == 0.0 {
        return hit_at(voxel, previous).flatten();
    }

    let step = direction.map(|d| if d >= 0.0 { 1 } else { -1 });
    let t_delta = direction.map(|d| if d != 0.0 { (1.0 / d).abs() } else { f32::INFINITY });
    let boundary = |d: f32, o: f32, v: i32, delta: f32| {
        if d == 0.0 {
            f32::INFINITY
        } else if d > 0.0 {
            (v as f32 + 1.0 - o) * delta
        } else {
            (o - v as f32) * delta
        }
    };
    let mut t_max = Vector3::new(
        boundary(direction.x, origin.x, voxel.x, t_delta.x),
        boundary(direction.y, origin.y, voxel.y, t_delta.y),
        boundary(direction.z, origin.z, voxel.z, t_delta.z),
    );

    let max_steps = (max_range * 3.0).ceil().max(1.0) as usize;

    for _ in 0..max_steps {
        // A targetable voxel beyond range ends the cast.
        if let Some(hit) = hit_at(voxel, previous) {
            return hit;
        }

        previous = voxel;

        if t_max.x < t_max.y && t_max.x < t_max.z {
            voxel.x += step.x;
            t_max.x += t_delta.x;
        } else if t_max.y < t_max.z {
            voxel.y += step.y;
            t_max.y += t_delta.y;
        } else {
            voxel.z += step.z;
            t_max.z += t_delta.z;
        }

        if !within_range(voxel) {
            return None;
        }
    }

    None
}
