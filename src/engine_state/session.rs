//! State of one open world, mutated only on the main tick.
//!
//! Background results are applied through the methods here. Sub-chunks whose content
//! changed are tracked in a dirty set until the next rebuild picks them up; edits stamp
//! the sub-chunks they rebuild with an epoch so that an older background mesh never
//! replaces a newer synchronous one.

use std::collections::{HashMap, HashSet};

use cgmath::Point3;

use crate::config::EngineConfig;
use crate::engine_state::persistence::{Persistence, SavedWorld, WorldStorage};
use crate::engine_state::rendering::meshing::{build_mesh, MeshManager, MeshPair, MeshRegion, SubChunkKey};
use crate::engine_state::voxels::{
    block::block_type::BlockId,
    chunk::chunk_packing,
    tasks::GeneratedChunk,
    terrain::TerrainGenerator,
    world::{BlockLookup, ChunkKey, World, WorldBounds},
};

pub struct SessionState {
    world: World,
    meshes: MeshManager,
    generator: TerrainGenerator,
    persistence: Option<Persistence>,
    render_distance: f32,
    mesh_capacity: usize,
    pub(crate) generation_pending: bool,
    pub(crate) rebuild_pending: bool,
    /// Set when a full rebuild is wanted regardless of movement.
    pub(crate) rebuild_requested: bool,
    dirty: HashSet<SubChunkKey>,
    edit_epochs: HashMap<SubChunkKey, u64>,
    epoch: u64,
}

impl SessionState {
    /// Opens the configured world.
    ///
    /// A saved world is loaded from `storage` if one exists and decodes cleanly;
    /// otherwise a new world is generated around the origin. Coordinates inside the
    /// loaded bounds that have no chunk are generated as well. New or transcoded
    /// content is written back before returning.
    pub fn open(config: &EngineConfig, storage: Option<Box<dyn WorldStorage>>) -> Self {
        let loaded = storage.as_deref().and_then(|storage| {
            match Persistence::load(storage, &config.world_name) {
                Ok(loaded) => loaded,
                Err(err) => {
                    log::warn!(
                        "Saved world {:?} could not be read, starting fresh: {}",
                        config.world_name,
                        err
                    );
                    None
                }
            }
        });

        let (seed, bounds, chunks, mut needs_flush) = match loaded {
            Some(loaded) => {
                log::info!(
                    "Loaded world {:?} with {} chunks{}",
                    config.world_name,
                    loaded.chunks.len(),
                    if loaded.transcoded { " from the legacy layout" } else { "" }
                );
                (loaded.seed.unwrap_or(config.seed), loaded.bounds, loaded.chunks, loaded.transcoded)
            }
            None => (
                config.seed,
                WorldBounds::around_origin(config.initial_chunk_radius),
                HashMap::new(),
                true,
            ),
        };

        let generator = TerrainGenerator::new(seed);
        let mut world = World::new(bounds);
        let mut record = SavedWorld::new(seed, bounds);
        for (key, chunk) in chunks {
            record.put_chunk(key, chunk_packing::pack(&chunk));
            world.insert_if_absent(key, chunk);
        }

        let missing = world.missing_in(&bounds);
        if !missing.is_empty() {
            log::info!("Generating {} chunks for world {:?}", missing.len(), config.world_name);
            needs_flush = true;
        }
        for key in missing {
            let generated = GeneratedChunk::generate(&generator, key);
            record.put_chunk(key, generated.packed);
            world.insert_if_absent(key, generated.chunk);
        }

        let persistence = storage.map(|storage| {
            let mut persistence = Persistence::new(storage, config.world_name.clone(), record);
            if needs_flush {
                if let Err(err) = persistence.flush() {
                    log::error!("Failed to save world {:?}: {}", config.world_name, err);
                }
            }
            persistence
        });

        SessionState {
            world,
            meshes: MeshManager::new(),
            generator,
            persistence,
            render_distance: config.render_distance,
            mesh_capacity: config.mesh_vertex_capacity,
            generation_pending: false,
            rebuild_pending: false,
            rebuild_requested: true,
            dirty: HashSet::new(),
            edit_epochs: HashMap::new(),
            epoch: 0,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn meshes(&self) -> &MeshManager {
        &self.meshes
    }

    pub fn generator(&self) -> &TerrainGenerator {
        &self.generator
    }

    pub fn persistence(&self) -> Option<&Persistence> {
        self.persistence.as_ref()
    }

    pub fn is_generation_pending(&self) -> bool {
        self.generation_pending
    }

    pub fn is_rebuild_pending(&self) -> bool {
        self.rebuild_pending
    }

    pub fn dirty(&self) -> &HashSet<SubChunkKey> {
        &self.dirty
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn take_dirty(&mut self) -> HashSet<SubChunkKey> {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn extend_bounds(&mut self, bounds: &WorldBounds) {
        self.world.extend_bounds(bounds);
    }

    /// Merges the chunks of a finished generation task.
    ///
    /// Existing chunks are never overwritten. New chunks are persisted, their sub-chunks
    /// and the facing sub-chunks of already loaded neighbours are marked dirty, and a
    /// rebuild is requested.
    ///
    /// # Returns
    /// The number of chunks inserted.
    pub fn merge_generated(&mut self, chunks: Vec<GeneratedChunk>, bounds: WorldBounds) -> usize {
        let mut inserted = Vec::with_capacity(chunks.len());
        let mut packed = Vec::with_capacity(chunks.len());
        for GeneratedChunk { key, chunk, packed: text } in chunks {
            if self.world.insert_if_absent(key, chunk) {
                inserted.push(key);
                packed.push((key, text));
            }
        }

        self.world.extend_bounds(&bounds);
        self.generation_pending = false;
        self.persist(packed);

        let new_keys: HashSet<ChunkKey> = inserted.iter().copied().collect();
        for &key in &inserted {
            self.dirty.extend(SubChunkKey::of_chunk(key));
            for neighbour in key.edge_neighbors() {
                if self.world.contains(neighbour) && !new_keys.contains(&neighbour) {
                    self.dirty.extend(SubChunkKey::along_edge(neighbour, key));
                }
            }
        }
        self.rebuild_requested = true;
        inserted.len()
    }

    /// Applies a finished background rebuild.
    ///
    /// Meshes outside `desired` are disposed. A built mesh is skipped when its sub-chunk
    /// was rebuilt by an edit after the task was dispatched at `epoch`.
    pub fn install_rebuild(&mut self, built: Vec<(SubChunkKey, MeshPair)>, desired: &HashSet<SubChunkKey>, epoch: u64) {
        self.rebuild_pending = false;
        let disposed = self.meshes.retain_only(desired);

        let mut installed = 0;
        for (key, mesh) in built {
            if self.edit_epochs.get(&key).is_some_and(|&edited| edited > epoch) {
                continue;
            }
            self.meshes.install(key, mesh);
            installed += 1;
        }

        // No rebuild is in flight now, so no older epoch can arrive.
        self.edit_epochs.clear();

        log::debug!(
            "Rebuild applied: {} meshes installed, {} disposed, {} resident",
            installed,
            disposed,
            self.meshes.len()
        );
    }

    /// Writes a block, persists its chunk and rebuilds the affected meshes at once.
    ///
    /// # Arguments
    /// * `position` - world block coordinate
    /// * `block` - the new block
    /// * `center` - player position used for the distance cutoff of the rebuild
    ///
    /// # Returns
    /// `false` if the position is outside the loaded world.
    pub fn edit_block(&mut self, position: Point3<i32>, block: BlockId, center: Point3<f32>) -> bool {
        let Some(chunk_key) = self.world.set_block(position.x, position.y, position.z, block) else {
            return false;
        };
        let mut touched = vec![chunk_key];

        // A plant cannot float; it goes with the block beneath it.
        if block == BlockId::Air && self.world.block_at(position.x, position.y + 1, position.z) == BlockId::Grass {
            if let Some(key) = self.world.set_block(position.x, position.y + 1, position.z, BlockId::Air) {
                touched.push(key);
            }
        }

        let packed: Vec<_> = touched
            .iter()
            .filter_map(|&key| self.world.chunk(key).map(|chunk| (key, chunk_packing::pack(chunk))))
            .collect();
        self.persist(packed);

        if let Some(sub_chunk) = SubChunkKey::containing(position.x, position.y, position.z) {
            self.epoch += 1;
            let keys: Vec<_> = std::iter::once(sub_chunk)
                .chain(sub_chunk.face_neighbors())
                .filter(|key| self.world.contains(key.chunk()))
                .collect();
            for key in keys {
                let mesh = build_mesh(
                    &self.world,
                    MeshRegion::SubChunk(key),
                    center,
                    self.render_distance,
                    self.mesh_capacity,
                );
                self.meshes.install(key, mesh);
                self.dirty.remove(&key);
                self.edit_epochs.insert(key, self.epoch);
            }
        }
        true
    }

    fn persist(&mut self, chunks: Vec<(ChunkKey, String)>) {
        let bounds = self.world.bounds();
        if let Some(persistence) = self.persistence.as_mut() {
            if let Err(err) = persistence.save_chunks(bounds, chunks) {
                log::error!("Failed to save world {:?}: {}", persistence.world_name(), err);
            }
        }
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("chunks", &self.world.chunk_count())
            .field("bounds", &self.world.bounds())
            .field("meshes", &self.meshes.len())
            .field("generation_pending", &self.generation_pending)
            .field("rebuild_pending", &self.rebuild_pending)
            .field("dirty", &self.dirty.len())
            .finish_non_exhaustive()
    }
}
