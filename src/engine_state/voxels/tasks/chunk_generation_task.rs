//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which generates the ring of chunks
//! added when the player approaches an edge of the world. The task runs the terrain
//! generator on its own copy of the seed and returns owned chunks, already packed for
//! persistence, so the main tick only has to merge them.

use crate::engine_state::{
    task_management::task::{Task, TaskCategory, TaskResult},
    voxels::{
        chunk::{chunk_packing, Chunk},
        terrain::TerrainGenerator,
        world::{ChunkKey, WorldBounds},
    },
    SessionState,
};

/// One generated chunk together with its packed form.
#[derive(Debug, Clone)]
pub struct GeneratedChunk {
    pub key: ChunkKey,
    pub chunk: Chunk,
    pub packed: String,
}

impl GeneratedChunk {
    pub fn generate(generator: &TerrainGenerator, key: ChunkKey) -> Self {
        let chunk = generator.generate(key);
        let packed = chunk_packing::pack(&chunk);
        GeneratedChunk { key, chunk, packed }
    }
}

/// A task that generates a set of chunks in the background.
///
/// This task is responsible for:
/// 1. Generating terrain and trees for every requested coordinate
/// 2. Packing each chunk for storage
/// 3. Handing the chunks and the grown bounds back to the main tick
#[derive(Debug)]
pub struct ChunkGenerationTask {
    /// Generator seeded for the open world
    generator: TerrainGenerator,
    /// Coordinates to generate, all absent from the world at dispatch
    keys: Vec<ChunkKey>,
    /// Bounds the world grows to once the chunks are merged
    bounds: WorldBounds,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    ///
    /// # Arguments
    /// * `generator` - The terrain generator of the open world
    /// * `keys` - The chunk coordinates to generate
    /// * `bounds` - The expanded world rectangle
    pub fn new(generator: TerrainGenerator, keys: Vec<ChunkKey>, bounds: WorldBounds) -> Self {
        ChunkGenerationTask {
            generator,
            keys,
            bounds,
        }
    }
}

impl Task for ChunkGenerationTask {
    fn category(&self) -> TaskCategory {
        TaskCategory::Generation
    }

    /// Executes the chunk generation task.
    ///
    /// # Returns
    /// A boxed `TaskResult` containing the generated chunks
    fn process(&self) -> Box<dyn TaskResult + Send> {
        let chunks = self
            .keys
            .iter()
            .map(|&key| GeneratedChunk::generate(&self.generator, key))
            .collect();

        Box::new(ChunkGenerationTaskResult {
            chunks,
            bounds: self.bounds,
        })
    }
}

/// The result of a chunk generation task.
#[derive(Debug)]
pub struct ChunkGenerationTaskResult {
    chunks: Vec<GeneratedChunk>,
    bounds: WorldBounds,
}

impl TaskResult for ChunkGenerationTaskResult {
    /// Merges the chunks into the world on the main thread.
    ///
    /// Chunks that appeared in the meantime are kept; the generated copies are dropped.
    fn handle_result(self: Box<Self>, session: &mut SessionState) {
        let inserted = session.merge_generated(self.chunks, self.bounds);
        log::debug!(
            "Merged {} generated chunks, world bounds now {:?}",
            inserted,
            session.world().bounds()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::world::BlockLookup;

    #[test]
    fn generated_chunks_match_the_generator() {
        let generator = TerrainGenerator::new(99);
        let keys = vec![ChunkKey::new(2, 0), ChunkKey::new(2, 1)];
        let task = ChunkGenerationTask::new(generator.clone(), keys.clone(), WorldBounds::around_origin(2));
        assert_eq!(task.category(), TaskCategory::Generation);

        let generated: Vec<_> = keys.iter().map(|&key| GeneratedChunk::generate(&generator, key)).collect();
        for item in &generated {
            assert_eq!(item.chunk, generator.generate(item.key));
            assert_eq!(chunk_packing::unpack(&item.packed).unwrap(), item.chunk);
        }

        let map: crate::engine_state::voxels::world::ChunkMap =
            generated.into_iter().map(|item| (item.key, item.chunk)).collect();
        assert!(map.chunk(ChunkKey::new(2, 1)).is_some());
    }
}
