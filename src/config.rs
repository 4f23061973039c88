//! # Engine Configuration
//!
//! Runtime settings of a session, read from a JSON file. Every field has a default, so
//! a file only needs the values it changes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::engine_state::rendering::meshing::{mesh::VERTICES_PER_QUAD, DEFAULT_VERTEX_CAPACITY};
use crate::engine_state::voxels::{
    block::{block_type::BlockId, BLOCK_CATALOG},
    raycast::DEFAULT_RAYCAST_RANGE,
    terrain::DEFAULT_TERRAIN_SEED,
};
use crate::error::ConfigError;

pub const DEFAULT_WORLD_NAME: &str = "default";
pub const DEFAULT_RENDER_DISTANCE: f32 = 128.0;
/// Distance from a world edge, in blocks, at which the next ring is generated.
pub const DEFAULT_EXTEND_THRESHOLD: f32 = 32.0;
/// Player travel, in blocks, that triggers a mesh rebuild.
pub const DEFAULT_REBUILD_DISTANCE: f32 = 8.0;
pub const DEFAULT_INITIAL_CHUNK_RADIUS: i32 = 1;
pub const DEFAULT_WORKER_COUNT: usize = 2;
/// A frame shorter than this leaves room to dispatch a rebuild.
pub const DEFAULT_IDLE_FRAME_BUDGET_MS: f32 = 12.0;
/// Ticks a rebuild may wait for an idle frame before it is dispatched anyway.
pub const DEFAULT_MAX_REBUILD_DEFERRAL: u32 = 30;
/// Catalog name of the block placed when a session starts.
pub const DEFAULT_SELECTED_BLOCK: &str = "cherry_wood";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Terrain seed for new worlds. A loaded world keeps the seed it was saved with.
    pub seed: u32,
    pub world_name: String,
    pub render_distance: f32,
    pub extend_threshold: f32,
    pub rebuild_distance: f32,
    pub raycast_range: f32,
    /// Chunks generated around the origin when no saved world exists.
    pub initial_chunk_radius: i32,
    pub worker_count: usize,
    /// Vertex limit of a single mesh build.
    pub mesh_vertex_capacity: usize,
    pub idle_frame_budget_ms: f32,
    pub max_rebuild_deferral: u32,
    /// Catalog name of the block placed by the player, e.g. `"birch_wood"`.
    pub selected_block: String,
    /// Directory for world records. Without it the world lives only in memory.
    pub storage_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_TERRAIN_SEED,
            world_name: DEFAULT_WORLD_NAME.to_string(),
            render_distance: DEFAULT_RENDER_DISTANCE,
            extend_threshold: DEFAULT_EXTEND_THRESHOLD,
            rebuild_distance: DEFAULT_REBUILD_DISTANCE,
            raycast_range: DEFAULT_RAYCAST_RANGE,
            initial_chunk_radius: DEFAULT_INITIAL_CHUNK_RADIUS,
            worker_count: DEFAULT_WORKER_COUNT,
            mesh_vertex_capacity: DEFAULT_VERTEX_CAPACITY,
            idle_frame_budget_ms: DEFAULT_IDLE_FRAME_BUDGET_MS,
            max_rebuild_deferral: DEFAULT_MAX_REBUILD_DEFERRAL,
            selected_block: DEFAULT_SELECTED_BLOCK.to_string(),
            storage_dir: None,
        }
    }
}

impl EngineConfig {
    /// Reads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parses and validates a configuration document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the scheduler cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid {
                field,
                reason: reason.into(),
            })
        }

        if self.world_name.is_empty() || self.world_name.contains(['/', '\\']) {
            return invalid("world_name", "must be a non-empty file name");
        }
        if !(self.render_distance.is_finite() && self.render_distance > 0.0) {
            return invalid("render_distance", "must be a positive number");
        }
        for (field, value) in [
            ("extend_threshold", self.extend_threshold),
            ("rebuild_distance", self.rebuild_distance),
            ("idle_frame_budget_ms", self.idle_frame_budget_ms),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return invalid(field, "must not be negative");
            }
        }
        if !(self.raycast_range.is_finite() && self.raycast_range > 0.0) {
            return invalid("raycast_range", "must be a positive number");
        }
        if self.initial_chunk_radius < 0 {
            return invalid("initial_chunk_radius", "must not be negative");
        }
        if self.worker_count == 0 {
            return invalid("worker_count", "at least one worker is required");
        }
        if self.mesh_vertex_capacity < VERTICES_PER_QUAD {
            return invalid(
                "mesh_vertex_capacity",
                format!("must hold at least one quad ({VERTICES_PER_QUAD} vertices)"),
            );
        }
        self.selected_block_id()?;
        Ok(())
    }

    /// Resolves `selected_block` against the block catalog.
    ///
    /// # Returns
    /// The named block, or `ConfigError::Invalid` for unknown names and for air.
    pub fn selected_block_id(&self) -> Result<BlockId, ConfigError> {
        match BLOCK_CATALOG.by_name(&self.selected_block) {
            Some(BlockId::Air) => Err(ConfigError::Invalid {
                field: "selected_block",
                reason: "air cannot be placed".to_string(),
            }),
            Some(block) => Ok(block),
            None => Err(ConfigError::Invalid {
                field: "selected_block",
                reason: format!("unknown block {:?}", self.selected_block),
            }),
        }
    }

    pub fn idle_frame_budget(&self) -> Duration {
        Duration::from_micros((self.idle_frame_budget_ms * 1000.0).round() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.seed, 12345);
        assert_eq!(config.render_distance, 128.0);
        assert_eq!(config.mesh_vertex_capacity, 1_333_333);
    }

    #[test]
    fn partial_documents_override_fields() {
        let config =
            EngineConfig::from_json(r#"{"seed": 7, "world_name": "islands", "storage_dir": "saves"}"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.world_name, "islands");
        assert_eq!(config.storage_dir, Some(PathBuf::from("saves")));
        assert_eq!(config.rebuild_distance, DEFAULT_REBUILD_DISTANCE);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = EngineConfig::from_json(r#"{"worker_count": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "worker_count", .. }));

        let err = EngineConfig::from_json(r#"{"render_distance": -1.0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "render_distance", .. }));

        let err = EngineConfig::from_json(r#"{"world_name": "../up"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "world_name", .. }));
    }

    #[test]
    fn selected_block_resolves_through_the_catalog() {
        let config = EngineConfig::from_json(r#"{"selected_block": "spruce_leaves"}"#).unwrap();
        assert_eq!(config.selected_block_id().unwrap(), BlockId::SpruceLeaves);
        assert_eq!(EngineConfig::default().selected_block_id().unwrap(), BlockId::CherryWood);

        let err = EngineConfig::from_json(r#"{"selected_block": "stone"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "selected_block", .. }));

        let err = EngineConfig::from_json(r#"{"selected_block": "air"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "selected_block", .. }));
    }

    #[test]
    fn malformed_documents_are_parse_errors() {
        assert!(matches!(EngineConfig::from_json("{"), Err(ConfigError::Parse(_))));
        assert!(matches!(
            EngineConfig::load(Path::new("/nonexistent/voxel-sandbox.json")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn idle_budget_converts_to_a_duration() {
        let config = EngineConfig {
            idle_frame_budget_ms: 16.0,
            ..EngineConfig::default()
        };
        assert_eq!(config.idle_frame_budget(), Duration::from_millis(16));
    }
}
