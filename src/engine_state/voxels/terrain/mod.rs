//! # Terrain Generation
//!
//! Turns a seed and a chunk coordinate into a fully decorated chunk. Generation is a pure
//! function of `(seed, offset_x, offset_z)`: the same inputs always produce the same
//! blocks, so any chunk can be regenerated instead of stored.
//!
//! ## Passes
//!
//! 1. **Heightmap**: 2D simplex noise sampled at `world * TERRAIN_SCALE`, mapped to
//!    `floor(BASE + AMPLITUDE * (n + 1) * FACTOR)`.
//! 2. **Column fill**: dirt below the surface, a grass block on it, air above.
//! 3. **Grass tufts**: each exposed grass block grows a tuft with probability
//!    [`GRASS_CHANCE`].
//! 4. **Trees**: see [`trees`].

use noise::{NoiseFn, Simplex};

use super::block::block_type::BlockId;
use super::chunk::{Chunk, CHUNK_HEIGHT, CHUNK_SIZE};
use super::world::ChunkKey;

pub mod hash;
pub mod trees;

use hash::{random01, terrain_hash};

pub const TERRAIN_SCALE: f64 = 0.02;
pub const TERRAIN_AMPLITUDE: f64 = 10.0;
pub const TERRAIN_BASE_HEIGHT: f64 = 8.0;
pub const TERRAIN_HEIGHT_FACTOR: f64 = 0.6;
pub const DEFAULT_TERRAIN_SEED: u32 = 12345;
/// Probability that an exposed grass block grows a tuft.
pub const GRASS_CHANCE: f32 = 0.56;

/// Seeded chunk generator. Cheap to construct; one is created per generation task.
#[derive(Clone)]
pub struct TerrainGenerator {
    seed: u32,
    noise: Simplex,
}

impl std::fmt::Debug for TerrainGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerrainGenerator").field("seed", &self.seed).finish()
    }
}

impl TerrainGenerator {
    pub fn new(seed: u32) -> Self {
        TerrainGenerator {
            seed,
            noise: Simplex::new(seed),
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Surface height of a world column, clamped into the chunk's vertical range.
    pub fn column_height(&self, world_x: i32, world_z: i32) -> i32 {
        let n = self
            .noise
            .get([world_x as f64 * TERRAIN_SCALE, world_z as f64 * TERRAIN_SCALE])
            .clamp(-1.0, 1.0);
        let height = (TERRAIN_BASE_HEIGHT + TERRAIN_AMPLITUDE * (n + 1.0) * TERRAIN_HEIGHT_FACTOR).floor();
        (height as i32).clamp(0, CHUNK_HEIGHT - 1)
    }

    /// Generates the chunk at a chunk coordinate.
    pub fn generate(&self, key: ChunkKey) -> Chunk {
        let (offset_x, offset_z) = key.origin();
        self.generate_at(offset_x, offset_z)
    }

    /// Generates the chunk whose (0, 0) column sits at the given world offset.
    pub fn generate_at(&self, offset_x: i32, offset_z: i32) -> Chunk {
        let mut chunk = Chunk::empty();

        for x in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                let height = self.column_height(offset_x + x, offset_z + z);
                for y in 0..height {
                    chunk.set(x, y, z, BlockId::Dirt);
                }
                chunk.set(x, height, z, BlockId::GrassBlock);
            }
        }

        self.place_grass(&mut chunk, offset_x, offset_z);
        trees::place_trees(&mut chunk, offset_x, offset_z, self.seed);

        chunk
    }

    fn place_grass(&self, chunk: &mut Chunk, offset_x: i32, offset_z: i32) {
        for x in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                for y in 0..CHUNK_HEIGHT - 1 {
                    if chunk.get(x, y, z) != BlockId::GrassBlock || chunk.get(x, y + 1, z) != BlockId::Air {
                        continue;
                    }
                    let h = terrain_hash(x, y, z, offset_x, offset_z, self.seed);
                    if random01(h) < GRASS_CHANCE {
                        chunk.set(x, y + 1, z, BlockId::Grass);
                    }
                }
            }
        }
    }
}

impl Default for TerrainGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_TERRAIN_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heights_stay_within_the_noise_envelope() {
        let generator = TerrainGenerator::default();
        for x in (-200..200).step_by(17) {
            for z in (-200..200).step_by(13) {
                let h = generator.column_height(x, z);
                assert!((8..=20).contains(&h), "height {h} at ({x}, {z})");
            }
        }
    }

    #[test]
    fn columns_are_dirt_under_a_single_grass_block() {
        let generator = TerrainGenerator::new(7);
        let chunk = generator.generate(ChunkKey::new(2, -1));
        let (ox, oz) = ChunkKey::new(2, -1).origin();
        for (x, z) in [(0, 0), (5, 30), (31, 31)] {
            let height = generator.column_height(ox + x, oz + z);
            assert_eq!(chunk.get(x, 0, z), BlockId::Dirt);
            let top = chunk.get(x, height, z);
            assert!(top == BlockId::GrassBlock || top == BlockId::Dirt);
        }
    }

    #[test]
    fn tufts_only_sit_on_grass_blocks() {
        let chunk = TerrainGenerator::default().generate(ChunkKey::new(0, 0));
        let mut tufts = 0;
        for (index, raw) in chunk.as_raw().iter().enumerate() {
            if BlockId::from_raw(*raw) != BlockId::Grass {
                continue;
            }
            tufts += 1;
            let p = Chunk::position_of(index);
            assert_eq!(chunk.get(p.x, p.y - 1, p.z), BlockId::GrassBlock);
        }
        assert!(tufts > 0);
    }

    #[test]
    fn generation_is_deterministic() {
        let a = TerrainGenerator::new(99).generate(ChunkKey::new(-3, 4));
        let b = TerrainGenerator::new(99).generate(ChunkKey::new(-3, 4));
        assert_eq!(a, b);
    }
}
