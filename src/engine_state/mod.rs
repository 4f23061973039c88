//! # Engine State Module
//!
//! The core engine module that manages the state of an open world and schedules the
//! work that keeps it around the player.
//!
//! ## Key Components
//!
//! * `EngineState` - The per-frame entry point: streaming, rebuilds, targeting and edits
//! * `SessionState` - World, meshes and scheduling flags mutated on the main tick
//! * `persistence` - Saved world records and storage backends
//! * `rendering` - Mesh building and the resident mesh set
//! * `task_management` - Executors for background work
//! * `voxels` - Block catalog, chunks, terrain generation and raycasting
//!
//! ## Scheduling
//!
//! Each call to [`EngineState::tick`] first applies finished background results, then
//! decides whether new work is needed:
//!
//! * Generation: when the player is within the extend threshold of a world edge, the
//!   missing chunks of the grown rectangle are generated in the background.
//! * Rebuild: after enough travel, or when sub-chunks are dirty, the in-range
//!   sub-chunks that are missing or dirty are meshed in the background. Dispatch waits
//!   for a short frame, but only for a bounded number of ticks.
//!
//! At most one task of each kind is in flight. Requests made while one is pending are
//! dropped, not queued. Block edits bypass the executor and rebuild synchronously.

use std::collections::HashSet;

use cgmath::{InnerSpace, Point3, Vector3};
use web_time::Duration;

use crate::config::EngineConfig;

use persistence::WorldStorage;
use rendering::{
    meshing::{sub_chunks_in_range, MeshStats},
    tasks::MeshRebuildTask,
};
use task_management::{Executor, TaskManager};
use voxels::{
    block::block_type::BlockId,
    chunk::CHUNK_SIZE,
    raycast::{self, RaycastHit},
    tasks::ChunkGenerationTask,
    world::{BlockLookup, ChunkKey},
};

pub mod persistence;
pub mod rendering;
mod session;
pub mod task_management;
pub mod voxels;

pub use session::SessionState;

/// Height above the terrain surface at which the player spawns.
const SPAWN_CLEARANCE: f32 = 2.0;

/// An interaction with the targeted block.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlayerAction {
    /// Remove the targeted block.
    Break,
    /// Put a block on the face of the targeted block that the ray entered through.
    Place(BlockId),
    /// Like `Place`, with the currently selected block.
    PlaceSelected,
}

/// What a tick did, for statistics and tests.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Background results applied at the start of the tick.
    pub applied: usize,
    pub generation_dispatched: bool,
    pub rebuild_dispatched: bool,
}

/// The main state container for a running world.
///
/// # Examples
///
/// ```
/// use voxel_sandbox::config::EngineConfig;
/// use voxel_sandbox::engine_state::{task_management::InlineExecutor, EngineState};
/// use web_time::Duration;
///
/// let config = EngineConfig { initial_chunk_radius: 0, ..EngineConfig::default() };
/// let mut engine = EngineState::with_executor(config, None, InlineExecutor::new());
/// let spawn = engine.player_position();
///
/// engine.tick(spawn, Duration::ZERO);
/// engine.tick(spawn, Duration::ZERO);
/// assert!(engine.mesh_stats().sub_chunks > 0);
/// ```
pub struct EngineState<E: Executor = TaskManager> {
    session: SessionState,
    executor: E,
    config: EngineConfig,
    /// Last position passed to `tick`
    player_position: Point3<f32>,
    /// Path length walked since the last rebuild dispatch
    travelled: f32,
    /// Ticks a wanted rebuild has waited for an idle frame
    deferred_ticks: u32,
    /// Block under the crosshair, refreshed by `update_target`
    target: Option<RaycastHit>,
    /// Block used by `PlayerAction::PlaceSelected`
    selected_block: BlockId,
}

impl EngineState<TaskManager> {
    /// Opens the configured world with a worker pool of `config.worker_count` threads.
    pub fn new(config: EngineConfig, storage: Option<Box<dyn WorldStorage>>) -> Self {
        let executor = TaskManager::new(config.worker_count);
        Self::with_executor(config, storage, executor)
    }
}

impl<E: Executor> EngineState<E> {
    /// Opens the configured world, running background work on `executor`.
    ///
    /// # Arguments
    /// * `config` - session settings
    /// * `storage` - where the world is loaded from and saved to; `None` keeps it in memory
    /// * `executor` - runs generation and rebuild tasks
    pub fn with_executor(config: EngineConfig, storage: Option<Box<dyn WorldStorage>>, executor: E) -> Self {
        let session = SessionState::open(&config, storage);
        let spawn_x = CHUNK_SIZE as f32 * 0.5;
        let spawn_z = CHUNK_SIZE as f32 * 0.5;
        let (column_x, column_z) = (spawn_x as i32, spawn_z as i32);
        let surface = session
            .world()
            .chunk(ChunkKey::containing(column_x, column_z))
            .and_then(|chunk| chunk.surface_height(column_x.rem_euclid(CHUNK_SIZE), column_z.rem_euclid(CHUNK_SIZE)))
            .unwrap_or_else(|| session.generator().column_height(column_x, column_z));
        let player_position = Point3::new(spawn_x, surface as f32 + SPAWN_CLEARANCE, spawn_z);

        let selected_block = config.selected_block_id().unwrap_or_else(|err| {
            log::warn!("{}, placing {} instead", err, BlockId::CherryWood);
            BlockId::CherryWood
        });

        log::info!(
            "World {:?} open: {} chunks, bounds {:?}, seed {}",
            config.world_name,
            session.world().chunk_count(),
            session.world().bounds(),
            session.generator().seed()
        );

        EngineState {
            session,
            executor,
            config,
            player_position,
            travelled: 0.0,
            deferred_ticks: 0,
            target: None,
            selected_block,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Position of the player as of the last tick, or the spawn point before the first.
    pub fn player_position(&self) -> Point3<f32> {
        self.player_position
    }

    pub fn target(&self) -> Option<RaycastHit> {
        self.target
    }

    pub fn selected_block(&self) -> BlockId {
        self.selected_block
    }

    /// Changes the block used by `PlayerAction::PlaceSelected`.
    ///
    /// # Returns
    /// `false` and keeps the current selection if `block` is air.
    pub fn select_block(&mut self, block: BlockId) -> bool {
        if block == BlockId::Air {
            return false;
        }
        self.selected_block = block;
        true
    }

    pub fn mesh_stats(&self) -> MeshStats {
        self.session.meshes().stats()
    }

    /// Applies every finished background result.
    ///
    /// # Returns
    /// The number of results applied.
    pub fn apply_completed(&mut self) -> usize {
        let completed = self.executor.poll_completed();
        let count = completed.len();
        for output in completed {
            log::debug!("Applying task {:?}", output.handle);
            output.result.handle_result(&mut self.session);
        }
        count
    }

    /// Advances the scheduler by one frame.
    ///
    /// # Arguments
    /// * `player` - current player position
    /// * `frame_time` - duration of the previous frame, used to find idle windows
    pub fn tick(&mut self, player: Point3<f32>, frame_time: Duration) -> TickReport {
        let applied = self.apply_completed();

        self.travelled += (player - self.player_position).magnitude();
        self.player_position = player;

        let generation_dispatched = self.request_generation(player);

        let mut rebuild_dispatched = false;
        let wants_rebuild = self.session.rebuild_requested
            || !self.session.dirty().is_empty()
            || self.travelled >= self.config.rebuild_distance;
        if wants_rebuild && !self.session.is_rebuild_pending() {
            let idle = frame_time < self.config.idle_frame_budget();
            if idle || self.deferred_ticks >= self.config.max_rebuild_deferral {
                rebuild_dispatched = self.request_rebuild();
            } else {
                self.deferred_ticks += 1;
            }
        }

        TickReport {
            applied,
            generation_dispatched,
            rebuild_dispatched,
        }
    }

    /// Dispatches generation of the next ring if the player is near a world edge.
    ///
    /// # Returns
    /// `true` if a generation task was submitted. Requests while one is pending are
    /// dropped.
    pub fn request_generation(&mut self, player: Point3<f32>) -> bool {
        if self.session.is_generation_pending() {
            return false;
        }

        let bounds = self.session.world().bounds();
        let Some(expanded) = bounds.expanded_toward(player.x, player.z, self.config.extend_threshold) else {
            return false;
        };

        let missing = self.session.world().missing_in(&expanded);
        if missing.is_empty() {
            self.session.extend_bounds(&expanded);
            return false;
        }

        log::debug!("Generating {} chunks to grow {:?} into {:?}", missing.len(), bounds, expanded);
        let task = ChunkGenerationTask::new(self.session.generator().clone(), missing, expanded);
        self.session.generation_pending = true;
        self.executor.submit(Box::new(task));
        true
    }

    /// Dispatches a rebuild of the meshes around the player.
    ///
    /// # Returns
    /// `true` if a rebuild task was submitted, `false` if one is already pending.
    pub fn request_rebuild(&mut self) -> bool {
        if self.session.is_rebuild_pending() {
            log::debug!("Rebuild already pending, request dropped");
            return false;
        }

        let center = self.player_position;
        let render_distance = self.config.render_distance;
        let reach = (render_distance / CHUNK_SIZE as f32).ceil() as i32 + 1;
        let center_chunk = ChunkKey::containing(center.x.floor() as i32, center.z.floor() as i32);

        let in_reach = self.session.world().iter().map(|(key, _)| *key).filter(|key| {
            (key.cx - center_chunk.cx).abs() <= reach && (key.cz - center_chunk.cz).abs() <= reach
        });
        let desired = sub_chunks_in_range(in_reach, center, render_distance);
        let dirty = self.session.take_dirty();
        let keys = self.session.meshes().plan(&desired, &dirty);

        let needed: HashSet<ChunkKey> = keys
            .iter()
            .flat_map(|key| {
                let chunk = key.chunk();
                std::iter::once(chunk).chain(chunk.edge_neighbors())
            })
            .collect();
        let snapshot = self.session.world().snapshot(needed);

        log::debug!(
            "Rebuilding {} of {} sub-chunks in range ({} dirty)",
            keys.len(),
            desired.len(),
            dirty.len()
        );

        let task = MeshRebuildTask::new(
            snapshot,
            keys,
            desired,
            center,
            render_distance,
            self.config.mesh_vertex_capacity,
            self.session.epoch(),
        );
        self.session.rebuild_pending = true;
        self.session.rebuild_requested = false;
        self.travelled = 0.0;
        self.deferred_ticks = 0;
        self.executor.submit(Box::new(task));
        true
    }

    /// Casts the aim ray and remembers what it hits.
    pub fn update_target(&mut self, origin: Point3<f32>, direction: Vector3<f32>) -> Option<RaycastHit> {
        self.target = raycast::cast(origin, direction, self.config.raycast_range, self.session.world());
        self.target
    }

    /// Executes an action on the current target.
    ///
    /// # Returns
    /// `false` if there is no target or the edit was not possible.
    pub fn apply_action(&mut self, action: PlayerAction) -> bool {
        let Some(hit) = self.target else {
            return false;
        };
        let applied = match action {
            PlayerAction::Break => self.break_block(hit.block),
            PlayerAction::Place(block) => self.place_block(hit.previous, block),
            PlayerAction::PlaceSelected => self.place_block(hit.previous, self.selected_block),
        };
        if applied {
            self.target = None;
        }
        applied
    }

    /// Removes a targetable block.
    pub fn break_block(&mut self, position: Point3<i32>) -> bool {
        let current = self.session.world().block_at(position.x, position.y, position.z);
        if !current.is_targetable() {
            return false;
        }
        log::debug!("Breaking {:?} at {:?}", current, position);
        self.session.edit_block(position, BlockId::Air, self.player_position)
    }

    /// Places a block into an empty voxel. A plant in the way is replaced.
    pub fn place_block(&mut self, position: Point3<i32>, block: BlockId) -> bool {
        if block == BlockId::Air {
            return false;
        }
        let current = self.session.world().block_at(position.x, position.y, position.z);
        if current.is_solid() {
            return false;
        }
        log::debug!("Placing {:?} at {:?}", block, position);
        self.session.edit_block(position, block, self.player_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use task_management::InlineExecutor;

    fn engine(radius: i32) -> EngineState<InlineExecutor> {
        let config = EngineConfig {
            initial_chunk_radius: radius,
            render_distance: 40.0,
            ..EngineConfig::default()
        };
        EngineState::with_executor(config, None, InlineExecutor::new())
    }

    #[test]
    fn first_tick_dispatches_the_initial_rebuild() {
        let mut engine = engine(1);
        let spawn = engine.player_position();
        let report = engine.tick(spawn, Duration::ZERO);
        assert!(report.rebuild_dispatched);
        assert!(!report.generation_dispatched);

        let report = engine.tick(spawn, Duration::ZERO);
        assert_eq!(report.applied, 1);
        assert!(!report.rebuild_dispatched);
        assert!(engine.mesh_stats().terrain_vertices > 0);
    }

    #[test]
    fn busy_frames_defer_rebuilds_up_to_the_limit() {
        let mut engine = engine(0);
        let spawn = engine.player_position();
        let busy = Duration::from_millis(100);
        let limit = engine.config().max_rebuild_deferral;

        for _ in 0..limit {
            assert!(!engine.tick(spawn, busy).rebuild_dispatched);
        }
        assert!(engine.tick(spawn, busy).rebuild_dispatched);
    }

    #[test]
    fn walking_past_the_rebuild_distance_triggers_a_rebuild() {
        let mut engine = engine(1);
        let mut position = engine.player_position();
        engine.tick(position, Duration::ZERO);
        engine.tick(position, Duration::ZERO);

        position.x += 3.0;
        assert!(!engine.tick(position, Duration::ZERO).rebuild_dispatched);
        position.x -= 3.0;
        position.z += 3.0;
        assert!(!engine.tick(position, Duration::ZERO).rebuild_dispatched);
        position.z += 3.0;
        assert!(engine.tick(position, Duration::ZERO).rebuild_dispatched);
    }

    #[test]
    fn approaching_an_edge_generates_the_ring() {
        let mut engine = engine(0);
        let edge = Point3::new(30.0, 20.0, 16.0);
        let report = engine.tick(edge, Duration::ZERO);
        assert!(report.generation_dispatched);
        assert!(!engine.request_generation(edge));

        engine.tick(edge, Duration::ZERO);
        assert!(engine.session().world().contains(ChunkKey::new(1, 0)));
        assert_eq!(engine.session().world().bounds().max_cx, 1);
    }

    #[test]
    fn targeting_and_editing_round_trip() {
        let mut engine = engine(0);
        let spawn = engine.player_position();
        engine.tick(spawn, Duration::ZERO);
        engine.tick(spawn, Duration::ZERO);

        let down = Vector3::new(0.0, -1.0, 0.0);
        let hit = engine.update_target(spawn, down).unwrap();
        assert!(engine.apply_action(PlayerAction::Break));
        assert_eq!(engine.target(), None);
        assert_eq!(
            engine.session().world().block_at(hit.block.x, hit.block.y, hit.block.z),
            BlockId::Air
        );

        let hit = engine.update_target(spawn, down).unwrap();
        assert!(engine.apply_action(PlayerAction::Place(BlockId::Wood)));
        assert_eq!(
            engine.session().world().block_at(hit.previous.x, hit.previous.y, hit.previous.z),
            BlockId::Wood
        );
        assert!(!engine.apply_action(PlayerAction::Break));
    }

    #[test]
    fn spawn_stands_above_the_top_solid_block() {
        let engine = engine(0);
        let spawn = engine.player_position();
        let (x, z) = (spawn.x as i32, spawn.z as i32);
        let feet = spawn.y as i32 - 2;
        assert!(engine.session().world().block_at(x, feet, z).is_solid());
        for y in feet + 1..crate::engine_state::voxels::chunk::CHUNK_HEIGHT {
            assert!(!engine.session().world().block_at(x, y, z).is_solid());
        }
    }

    #[test]
    fn place_selected_uses_the_configured_block() {
        let config = EngineConfig {
            initial_chunk_radius: 0,
            selected_block: "birch_leaves".to_string(),
            ..EngineConfig::default()
        };
        let mut engine = EngineState::with_executor(config, None, InlineExecutor::new());
        assert_eq!(engine.selected_block(), BlockId::BirchLeaves);

        let spawn = engine.player_position();
        let down = Vector3::new(0.0, -1.0, 0.0);
        let hit = engine.update_target(spawn, down).unwrap();
        assert!(engine.apply_action(PlayerAction::PlaceSelected));
        assert_eq!(
            engine.session().world().block_at(hit.previous.x, hit.previous.y, hit.previous.z),
            BlockId::BirchLeaves
        );

        assert!(!engine.select_block(BlockId::Air));
        assert!(engine.select_block(BlockId::Dirt));
        assert_eq!(engine.selected_block(), BlockId::Dirt);
    }

    #[test]
    fn unknown_selected_block_falls_back() {
        let config = EngineConfig {
            initial_chunk_radius: 0,
            selected_block: "stone".to_string(),
            ..EngineConfig::default()
        };
        let engine = EngineState::with_executor(config, None, InlineExecutor::new());
        assert_eq!(engine.selected_block(), BlockId::CherryWood);
    }
}
