//! # World Persistence
//!
//! A world is stored as one JSON record per world name. The current layout keeps every
//! chunk packed separately under its `"{cx}_{cz}"` key next to the seed and bounds.
//! Older saves held a single packed volume anchored at the origin; those are cut into
//! chunks on load and written back in the current layout.
//!
//! Storage backends only move record text; encoding and decoding live here.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine_state::voxels::chunk::{chunk_packing, Chunk, CHUNK_HEIGHT, CHUNK_SIZE, CHUNK_VOLUME};
use crate::engine_state::voxels::world::{ChunkKey, ChunkMap, WorldBounds};
use crate::error::{CodecError, PersistenceError};

/// Current on-disk layout of a world.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SavedWorld {
    pub seed: u32,
    pub bounds: WorldBounds,
    /// Packed chunks keyed by [`ChunkKey`]'s text form.
    pub chunks: BTreeMap<String, String>,
}

impl SavedWorld {
    pub fn new(seed: u32, bounds: WorldBounds) -> Self {
        SavedWorld {
            seed,
            bounds,
            chunks: BTreeMap::new(),
        }
    }

    /// Records a packed chunk, replacing any earlier copy.
    pub fn put_chunk(&mut self, key: ChunkKey, packed: String) {
        self.chunks.insert(key.to_string(), packed);
    }

    /// Decodes every chunk in the record.
    pub fn decode_chunks(&self) -> Result<ChunkMap, PersistenceError> {
        let mut chunks = HashMap::with_capacity(self.chunks.len());
        for (name, packed) in &self.chunks {
            let key = name
                .parse::<ChunkKey>()
                .map_err(|reason| PersistenceError::Json(serde::de::Error::custom(reason)))?;
            chunks.insert(key, chunk_packing::unpack(packed)?);
        }
        Ok(chunks)
    }
}

/// Layout written by early versions: one packed volume of `width x height x width`
/// voxels whose minimum corner is the world origin.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LegacyVolume {
    pub data: String,
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub seed: Option<u32>,
}

impl LegacyVolume {
    /// Cuts the volume into chunks.
    ///
    /// The width must be a positive multiple of [`CHUNK_SIZE`] and the height must equal
    /// [`CHUNK_HEIGHT`].
    pub fn split_into_chunks(&self) -> Result<(WorldBounds, ChunkMap), CodecError> {
        let chunk_size = CHUNK_SIZE as usize;
        if self.width == 0 || self.width % chunk_size != 0 || self.height != CHUNK_HEIGHT as usize {
            return Err(CodecError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        let volume = chunk_packing::unpack_volume(&self.data, self.width * self.height * self.width)?;
        let per_side = (self.width / chunk_size) as i32;
        let bounds = WorldBounds {
            min_cx: 0,
            max_cx: per_side - 1,
            min_cz: 0,
            max_cz: per_side - 1,
        };

        let layer = self.width * self.width;
        let mut chunks = HashMap::with_capacity(bounds.area());
        for key in bounds.keys() {
            let (ox, oz) = key.origin();
            let mut blocks = Vec::with_capacity(CHUNK_VOLUME);
            for y in 0..self.height {
                for z in 0..chunk_size {
                    let row = y * layer + (oz as usize + z) * self.width + ox as usize;
                    blocks.extend_from_slice(&volume[row..row + chunk_size]);
                }
            }
            if let Some(chunk) = Chunk::from_raw(blocks) {
                chunks.insert(key, chunk);
            }
        }
        Ok((bounds, chunks))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredRecord {
    Chunked(SavedWorld),
    Legacy(LegacyVolume),
}

/// A world read back from storage.
#[derive(Debug)]
pub struct LoadedWorld {
    /// Seed recorded with the world, if any.
    pub seed: Option<u32>,
    pub bounds: WorldBounds,
    pub chunks: ChunkMap,
    /// Whether the record was in the legacy layout and needs to be written back.
    pub transcoded: bool,
}

/// Parses a stored record in either layout.
pub fn decode_record(text: &str) -> Result<LoadedWorld, PersistenceError> {
    match serde_json::from_str::<StoredRecord>(text)? {
        StoredRecord::Chunked(saved) => Ok(LoadedWorld {
            seed: Some(saved.seed),
            bounds: saved.bounds,
            chunks: saved.decode_chunks()?,
            transcoded: false,
        }),
        StoredRecord::Legacy(legacy) => {
            let (bounds, chunks) = legacy.split_into_chunks()?;
            Ok(LoadedWorld {
                seed: legacy.seed,
                bounds,
                chunks,
                transcoded: true,
            })
        }
    }
}

/// Backend holding world records by name.
pub trait WorldStorage: Send {
    /// Reads a record. A missing record is `Ok(None)`.
    fn load_record(&self, name: &str) -> Result<Option<String>, PersistenceError>;

    /// Writes a record, replacing any previous one.
    fn store_record(&mut self, name: &str, record: &str) -> Result<(), PersistenceError>;
}

/// Records kept in memory for the lifetime of the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    records: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl WorldStorage for MemoryStorage {
    fn load_record(&self, name: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.records.get(name).cloned())
    }

    fn store_record(&mut self, name: &str, record: &str) -> Result<(), PersistenceError> {
        self.records.insert(name.to_string(), record.to_string());
        Ok(())
    }
}

/// Records stored as `<dir>/<name>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for a world name.
    pub fn record_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

impl WorldStorage for FileStorage {
    fn load_record(&self, name: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.record_path(name);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::Io { path, source }),
        }
    }

    fn store_record(&mut self, name: &str, record: &str) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir).map_err(|source| PersistenceError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.record_path(name);
        fs::write(&path, record).map_err(|source| PersistenceError::Io { path, source })
    }
}

/// The record of the open world together with the backend it is written to.
pub struct Persistence {
    storage: Box<dyn WorldStorage>,
    world_name: String,
    record: SavedWorld,
}

impl Persistence {
    pub fn new(storage: Box<dyn WorldStorage>, world_name: impl Into<String>, record: SavedWorld) -> Self {
        Persistence {
            storage,
            world_name: world_name.into(),
            record,
        }
    }

    pub fn world_name(&self) -> &str {
        &self.world_name
    }

    pub fn record(&self) -> &SavedWorld {
        &self.record
    }

    /// Reads and decodes the named world.
    ///
    /// # Returns
    /// `Ok(None)` when no record exists.
    pub fn load(storage: &dyn WorldStorage, world_name: &str) -> Result<Option<LoadedWorld>, PersistenceError> {
        storage
            .load_record(world_name)?
            .map(|text| decode_record(&text))
            .transpose()
    }

    /// Updates the recorded bounds and chunks, then writes the whole record.
    pub fn save_chunks(
        &mut self,
        bounds: WorldBounds,
        chunks: impl IntoIterator<Item = (ChunkKey, String)>,
    ) -> Result<(), PersistenceError> {
        self.record.bounds = bounds;
        for (key, packed) in chunks {
            self.record.put_chunk(key, packed);
        }
        self.flush()
    }

    /// Writes the record as it stands.
    pub fn flush(&mut self) -> Result<(), PersistenceError> {
        let text = serde_json::to_string(&self.record)?;
        self.storage.store_record(&self.world_name, &text)
    }
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("world_name", &self.world_name)
            .field("chunks", &self.record.chunks.len())
            .finish_non_exhaustive()
    }
}
