//! # Tree Placement
//!
//! Deterministic vegetation pass run once per generated chunk, after the column fill and
//! grass tufts.
//!
//! ## Site Selection
//!
//! A candidate site is a grass block with dirt directly below and air or a grass tuft
//! directly above. Each site draws from [`terrain_hash`]:
//!
//! 1. Sites within three blocks of the chunk centre first try a salted draw against
//!    [`WORLD_TREE_CHANCE`] for the oversized world tree.
//! 2. Otherwise the site's own hash is compared with [`TREE_CHANCE`], and a second salted
//!    draw picks one of the seven ordinary species and a height in its range.
//!
//! ## Clearance
//!
//! Every cell of a vertical cylinder above the site must be air or a grass tuft. Cells
//! outside the chunk count as blocked, so trees never straddle chunk borders and
//! generation stays independent per chunk.

use std::ops::RangeInclusive;

use crate::engine_state::voxels::block::block_type::BlockId;
use crate::engine_state::voxels::chunk::{Chunk, CHUNK_HEIGHT, CHUNK_SIZE};

use super::hash::{random01, salted, terrain_hash};

/// Probability that an eligible site grows an ordinary tree.
pub const TREE_CHANCE: f32 = 0.07;
/// Probability that a site near the chunk centre grows a world tree.
pub const WORLD_TREE_CHANCE: f32 = 0.004;
/// Maximum horizontal distance from the chunk centre for world-tree sites.
pub const WORLD_TREE_SITE_RADIUS: i32 = 3;

const SPECIES_SALT: u32 = 0x5eed_0001;
const WORLD_TREE_SALT: u32 = 0x5eed_0002;

/// The tree archetypes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TreeSpecies {
    Oak,
    Birch,
    Spruce,
    Jungle,
    Acacia,
    DarkOak,
    Cherry,
    WorldTree,
}

/// Static shape parameters of one archetype.
#[derive(Clone, Debug)]
pub struct Archetype {
    pub wood: BlockId,
    pub leaves: BlockId,
    pub heights: RangeInclusive<i32>,
    /// Edge length of the square trunk.
    pub trunk_width: i32,
    /// Radius of the clearance cylinder.
    pub clear_radius: i32,
    /// How far the canopy reaches above the top trunk block.
    pub crown_above: i32,
}

impl TreeSpecies {
    /// Species chosen by the ordinary draw. The world tree is never picked here.
    pub const ORDINARY: [TreeSpecies; 7] = [
        TreeSpecies::Oak,
        TreeSpecies::Birch,
        TreeSpecies::Spruce,
        TreeSpecies::Jungle,
        TreeSpecies::Acacia,
        TreeSpecies::DarkOak,
        TreeSpecies::Cherry,
    ];

    pub fn archetype(self) -> Archetype {
        let (wood, leaves, heights, trunk_width, clear_radius, crown_above) = match self {
            TreeSpecies::Oak => (BlockId::Wood, BlockId::Leaves, 4..=5, 1, 3, 2),
            TreeSpecies::Birch => (BlockId::BirchWood, BlockId::BirchLeaves, 5..=7, 1, 2, 1),
            TreeSpecies::Spruce => (BlockId::SpruceWood, BlockId::SpruceLeaves, 6..=9, 1, 3, 1),
            TreeSpecies::Jungle => (BlockId::JungleWood, BlockId::JungleLeaves, 8..=11, 1, 3, 2),
            TreeSpecies::Acacia => (BlockId::AcaciaWood, BlockId::AcaciaLeaves, 4..=6, 1, 3, 1),
            TreeSpecies::DarkOak => (BlockId::DarkOakWood, BlockId::DarkOakLeaves, 5..=7, 2, 4, 2),
            TreeSpecies::Cherry => (BlockId::CherryWood, BlockId::CherryLeaves, 4..=6, 1, 3, 2),
            TreeSpecies::WorldTree => (BlockId::Wood, BlockId::Leaves, 10..=13, 3, 6, 5),
        };
        Archetype {
            wood,
            leaves,
            heights,
            trunk_width,
            clear_radius,
            crown_above,
        }
    }

    /// Picks a height in the archetype's range from a hash draw.
    fn height_from(self, draw: u32) -> i32 {
        let heights = self.archetype().heights;
        let span = (heights.end() - heights.start() + 1) as u32;
        heights.start() + ((draw >> 12) % span) as i32
    }

    /// Horizontal offsets of the trunk footprint relative to the site.
    fn trunk_offsets(self) -> RangeInclusive<i32> {
        match self.archetype().trunk_width {
            3 => -1..=1,
            2 => 0..=1,
            _ => 0..=0,
        }
    }
}

/// Runs the tree pass over a freshly generated chunk.
pub fn place_trees(chunk: &mut Chunk, offset_x: i32, offset_z: i32, seed: u32) {
    let center = CHUNK_SIZE / 2;

    for x in 0..CHUNK_SIZE {
        for z in 0..CHUNK_SIZE {
            for y in 1..CHUNK_HEIGHT - 1 {
                if !is_candidate_site(chunk, x, y, z) {
                    continue;
                }

                let near_center = (x - center).pow(2) + (z - center).pow(2)
                    <= WORLD_TREE_SITE_RADIUS * WORLD_TREE_SITE_RADIUS;
                if near_center {
                    let draw = terrain_hash(x, y, z, offset_x, offset_z, salted(seed, WORLD_TREE_SALT));
                    if random01(draw) < WORLD_TREE_CHANCE {
                        let species = TreeSpecies::WorldTree;
                        let height = species.height_from(draw);
                        if place_tree(chunk, x, y, z, species, height, draw) {
                            log::debug!("World tree at ({}, {}, {})", offset_x + x, y, offset_z + z);
                            continue;
                        }
                    }
                }

                let h = terrain_hash(x, y, z, offset_x, offset_z, seed);
                if random01(h) >= TREE_CHANCE {
                    continue;
                }

                let draw = terrain_hash(x, y, z, offset_x, offset_z, salted(seed, SPECIES_SALT));
                let species = TreeSpecies::ORDINARY[((draw >> 4) % 7) as usize];
                let height = species.height_from(draw);
                place_tree(chunk, x, y, z, species, height, h);
            }
        }
    }
}

/// A grass block with dirt below and air or a tuft above.
pub fn is_candidate_site(chunk: &Chunk, x: i32, y: i32, z: i32) -> bool {
    chunk.get(x, y, z) == BlockId::GrassBlock
        && chunk.get(x, y - 1, z) == BlockId::Dirt
        && matches!(chunk.get(x, y + 1, z), BlockId::Air | BlockId::Grass)
}

/// Grows one tree whose ground block is `(x, y, z)`.
///
/// # Arguments
/// * `height` - number of trunk blocks above the ground block
/// * `h` - the site hash, used by thinned canopies
///
/// # Returns
/// `false` and leaves the chunk untouched if the trunk footprint or the clearance
/// cylinder is blocked.
pub fn place_tree(
    chunk: &mut Chunk,
    x: i32,
    y: i32,
    z: i32,
    species: TreeSpecies,
    height: i32,
    h: u32,
) -> bool {
    let archetype = species.archetype();
    let footprint = species.trunk_offsets();

    for dx in footprint.clone() {
        for dz in footprint.clone() {
            if !matches!(chunk.get(x + dx, y, z + dz), BlockId::GrassBlock | BlockId::Dirt) {
                return false;
            }
        }
    }

    if !has_clearance(chunk, x, y, z, archetype.clear_radius, height + archetype.crown_above) {
        return false;
    }

    for dy in 1..=height {
        for dx in footprint.clone() {
            for dz in footprint.clone() {
                chunk.set(x + dx, y + dy, z + dz, archetype.wood);
            }
        }
    }

    let mut canopy = Canopy {
        chunk,
        x,
        y,
        z,
        leaves: archetype.leaves,
    };
    match species {
        TreeSpecies::Oak => canopy.oak(height),
        TreeSpecies::Birch => canopy.birch(height),
        TreeSpecies::Spruce => canopy.spruce(height),
        TreeSpecies::Jungle => canopy.jungle(height, h),
        TreeSpecies::Acacia => canopy.acacia(height),
        TreeSpecies::DarkOak => canopy.dark_oak(height),
        TreeSpecies::Cherry => canopy.cherry(height),
        TreeSpecies::WorldTree => canopy.world_tree(height, h),
    }
    true
}

/// Checks the clearance cylinder `dx² + dz² <= r²`, `1 <= dy <= clear_height`.
fn has_clearance(chunk: &Chunk, x: i32, y: i32, z: i32, radius: i32, clear_height: i32) -> bool {
    for dx in -radius..=radius {
        for dz in -radius..=radius {
            if dx * dx + dz * dz > radius * radius {
                continue;
            }
            for dy in 1..=clear_height {
                let (bx, by, bz) = (x + dx, y + dy, z + dz);
                if Chunk::index_of(bx, by, bz).is_none() {
                    return false;
                }
                if !matches!(chunk.get(bx, by, bz), BlockId::Air | BlockId::Grass) {
                    return false;
                }
            }
        }
    }
    true
}

/// Pseudo-random thinning mask shared by the bushy canopies.
fn thinned(h: u32, dx: i32, dy: i32, dz: i32, modulus: i64) -> bool {
    (h as i64 + dx as i64 * 7 + dz as i64 * 13 + dy as i64 * 31).rem_euclid(modulus) == 0
}

/// Leaf writer anchored at a tree's ground block.
struct Canopy<'a> {
    chunk: &'a mut Chunk,
    x: i32,
    y: i32,
    z: i32,
    leaves: BlockId,
}

impl Canopy<'_> {
    /// Leaves only replace air, tufts or other leaves. Trunks are never overwritten.
    fn leaf(&mut self, dx: i32, dy: i32, dz: i32) {
        let (bx, by, bz) = (self.x + dx, self.y + dy, self.z + dz);
        let current = self.chunk.get(bx, by, bz);
        if current == BlockId::Air || current == BlockId::Grass || current.is_leaves() {
            self.chunk.set(bx, by, bz, self.leaves);
        }
    }

    fn square(&mut self, dy: i32, radius: i32, trim_corners: bool) {
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                if trim_corners && radius > 0 && dx.abs() == radius && dz.abs() == radius {
                    continue;
                }
                self.leaf(dx, dy, dz);
            }
        }
    }

    fn disc(&mut self, dy: i32, radius: i32) {
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                if dx * dx + dz * dz <= radius * radius + 1 {
                    self.leaf(dx, dy, dz);
                }
            }
        }
    }

    fn oak(&mut self, top: i32) {
        for dy in top - 1..=top + 1 {
            self.square(dy, 2, false);
        }
        self.leaf(0, top + 2, 0);
    }

    fn birch(&mut self, top: i32) {
        self.square(top - 2, 2, true);
        self.square(top - 1, 2, true);
        self.square(top, 1, false);
        self.square(top + 1, 1, true);
    }

    fn spruce(&mut self, top: i32) {
        for dy in 3..=top + 1 {
            let layer = top + 1 - dy;
            let radius = ((layer + 1) / 2).min(3);
            self.square(dy, radius, radius >= 2);
        }
    }

    fn jungle(&mut self, top: i32, h: u32) {
        for dy in top - 2..=top + 2 {
            let radius = match dy - top {
                -1 | 0 => 3,
                -2 | 1 => 2,
                _ => 1,
            };
            for dx in -radius..=radius {
                for dz in -radius..=radius {
                    if dx * dx + dz * dz > radius * radius + 1 || thinned(h, dx, dy, dz, 3) {
                        continue;
                    }
                    self.leaf(dx, dy, dz);
                }
            }
        }
    }

    fn acacia(&mut self, top: i32) {
        self.disc(top, 3);
        self.disc(top + 1, 2);
    }

    /// Canopy centred on the middle of the 2x2 trunk, measured in half blocks.
    fn dark_oak(&mut self, top: i32) {
        for dy in top - 1..=top + 2 {
            let diameter = match dy - top {
                -1 | 0 => 7,
                1 => 5,
                _ => 3,
            };
            let reach = diameter / 2 + 1;
            for dx in -reach..=reach + 1 {
                for dz in -reach..=reach + 1 {
                    let (hx, hz) = (2 * dx - 1, 2 * dz - 1);
                    if hx * hx + hz * hz <= diameter * diameter {
                        self.leaf(dx, dy, dz);
                    }
                }
            }
        }
    }

    fn cherry(&mut self, top: i32) {
        self.ellipsoid(top as f32 + 0.5, 3, 2, None);
    }

    fn world_tree(&mut self, top: i32, h: u32) {
        self.ellipsoid(top as f32 + 1.0, 6, 4, Some(h));
    }

    /// Squared-distance ellipsoid test around `(0, center_y, 0)`, optionally thinned.
    fn ellipsoid(&mut self, center_y: f32, radius_xz: i32, radius_y: i32, thinning: Option<u32>) {
        let rxz = radius_xz as f32;
        let ry = radius_y as f32;
        let low = (center_y - ry).floor() as i32;
        let high = (center_y + ry).ceil() as i32;
        for dy in low..=high {
            for dx in -radius_xz..=radius_xz {
                for dz in -radius_xz..=radius_xz {
                    let fy = dy as f32 - center_y;
                    let dist = (dx * dx + dz * dz) as f32 / (rxz * rxz) + fy * fy / (ry * ry);
                    if dist > 1.0 {
                        continue;
                    }
                    if let Some(h) = thinning {
                        if dist > 0.5 && thinned(h, dx, dy, dz, 5) {
                            continue;
                        }
                    }
                    self.leaf(dx, dy, dz);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_chunk(ground: i32) -> Chunk {
        let mut chunk = Chunk::empty();
        for x in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                for y in 0..ground {
                    chunk.set(x, y, z, BlockId::Dirt);
                }
                chunk.set(x, ground, z, BlockId::GrassBlock);
            }
        }
        chunk
    }

    #[test]
    fn oak_trunk_runs_from_ground_to_height() {
        let mut chunk = flat_chunk(10);
        assert!(place_tree(&mut chunk, 16, 10, 16, TreeSpecies::Oak, 4, 0));
        for y in 11..=14 {
            assert_eq!(chunk.get(16, y, 16), BlockId::Wood);
        }
        assert_eq!(chunk.get(16, 15, 16), BlockId::Leaves);
        assert_eq!(chunk.get(16, 16, 16), BlockId::Leaves);
        assert_eq!(chunk.get(18, 13, 16), BlockId::Leaves);
        assert_eq!(chunk.get(19, 13, 16), BlockId::Air);
    }

    #[test]
    fn blocked_site_is_left_untouched() {
        let mut chunk = flat_chunk(10);
        chunk.set(17, 13, 16, BlockId::Dirt);
        let before = chunk.clone();
        assert!(!place_tree(&mut chunk, 16, 10, 16, TreeSpecies::Oak, 4, 0));
        assert_eq!(chunk, before);
    }

    #[test]
    fn sites_near_the_border_are_blocked() {
        let mut chunk = flat_chunk(10);
        assert!(!place_tree(&mut chunk, 1, 10, 16, TreeSpecies::Oak, 4, 0));
        assert!(!place_tree(&mut chunk, 16, 10, 16, TreeSpecies::Oak, 30, 0));
    }

    #[test]
    fn wide_trunks_fill_their_footprint() {
        let mut chunk = flat_chunk(8);
        assert!(place_tree(&mut chunk, 16, 8, 16, TreeSpecies::DarkOak, 5, 0));
        for (dx, dz) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            assert_eq!(chunk.get(16 + dx, 13, 16 + dz), BlockId::DarkOakWood);
        }

        let mut chunk = flat_chunk(8);
        assert!(place_tree(&mut chunk, 16, 8, 16, TreeSpecies::WorldTree, 10, 7));
        for dx in -1..=1 {
            for dz in -1..=1 {
                assert_eq!(chunk.get(16 + dx, 18, 16 + dz), BlockId::Wood);
            }
        }
    }

    #[test]
    fn no_species_overwrites_its_trunk() {
        for species in TreeSpecies::ORDINARY.into_iter().chain([TreeSpecies::WorldTree]) {
            let mut chunk = flat_chunk(6);
            let height = *species.archetype().heights.start();
            assert!(place_tree(&mut chunk, 16, 6, 16, species, height, 12345), "{species:?}");
            let wood = species.archetype().wood;
            for dx in species.trunk_offsets() {
                for dz in species.trunk_offsets() {
                    for dy in 1..=height {
                        assert_eq!(chunk.get(16 + dx, 6 + dy, 16 + dz), wood, "{species:?}");
                    }
                }
            }
            let leaves = species.archetype().leaves;
            assert!(chunk.as_raw().contains(&leaves.raw()), "{species:?} grew no leaves");
        }
    }

    #[test]
    fn heights_stay_in_range() {
        for species in TreeSpecies::ORDINARY {
            let range = species.archetype().heights;
            for draw in [0, 1 << 12, 2 << 12, 3 << 12, u32::MAX] {
                assert!(range.contains(&species.height_from(draw)));
            }
        }
    }

    #[test]
    fn candidate_needs_dirt_below_and_open_sky() {
        let mut chunk = flat_chunk(10);
        assert!(is_candidate_site(&chunk, 5, 10, 5));
        chunk.set(5, 11, 5, BlockId::Grass);
        assert!(is_candidate_site(&chunk, 5, 10, 5));
        chunk.set(5, 11, 5, BlockId::Wood);
        assert!(!is_candidate_site(&chunk, 5, 10, 5));
        chunk.set(6, 9, 6, BlockId::Air);
        assert!(!is_candidate_site(&chunk, 6, 10, 6));
    }
}
