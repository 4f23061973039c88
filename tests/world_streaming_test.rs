//! # World Streaming Integration Tests
//!
//! Drives an engine on the inline executor through walks, edits and reloads and checks
//! what the scheduler and the session make of them.

use cgmath::{Point3, Vector3};
use voxel_sandbox::engine_state::persistence::{LegacyVolume, MemoryStorage, WorldStorage};
use voxel_sandbox::engine_state::rendering::meshing::{build_mesh, MeshRegion, SubChunkKey};
use voxel_sandbox::engine_state::task_management::InlineExecutor;
use voxel_sandbox::engine_state::voxels::{
    block::{block_type::BlockId, BlockTypeSize},
    chunk::{chunk_packing, CHUNK_HEIGHT, CHUNK_SIZE},
    world::{BlockLookup, ChunkKey, WorldBounds},
};
use voxel_sandbox::{EngineConfig, EngineState, PlayerAction};
use web_time::Duration;

const IDLE: Duration = Duration::ZERO;

fn config() -> EngineConfig {
    EngineConfig {
        world_name: "streaming".to_string(),
        render_distance: 40.0,
        ..EngineConfig::default()
    }
}

fn engine_with(storage: Option<MemoryStorage>) -> EngineState<InlineExecutor> {
    let storage = storage.map(|storage| Box::new(storage) as Box<dyn WorldStorage>);
    EngineState::with_executor(config(), storage, InlineExecutor::new())
}

fn drain(engine: &mut EngineState<InlineExecutor>) {
    let position = engine.player_position();
    for _ in 0..8 {
        engine.tick(position, IDLE);
        let session = engine.session();
        if !session.is_generation_pending() && !session.is_rebuild_pending() {
            return;
        }
    }
}

/// Test: a second rebuild request while one is in flight is dropped, not queued.
#[test]
fn test_duplicate_rebuild_requests_are_dropped() {
    let mut engine = engine_with(None);
    let spawn = engine.player_position();

    assert!(engine.tick(spawn, IDLE).rebuild_dispatched);
    assert!(engine.session().is_rebuild_pending());
    assert!(!engine.request_rebuild());
    assert_eq!(engine.executor().submitted_count(), 1);
    assert_eq!(engine.executor().pending_count(), 1);

    engine.tick(spawn, IDLE);
    assert!(!engine.session().is_rebuild_pending());
    assert!(engine.request_rebuild());
    assert_eq!(engine.executor().submitted_count(), 2);
}

/// Test: walking east only ever grows the world and keeps chunks under the player.
#[test]
fn test_walking_east_grows_bounds_monotonically() {
    let mut engine = engine_with(None);
    let mut position = engine.player_position();
    let mut previous = engine.session().world().bounds();

    for _ in 0..120 {
        position.x += 2.0;
        engine.tick(position, IDLE);

        let bounds = engine.session().world().bounds();
        assert!(bounds.covers(&previous), "{bounds:?} shrank from {previous:?}");
        previous = bounds;
    }
    drain(&mut engine);

    let world = engine.session().world();
    let under = ChunkKey::containing(position.x.floor() as i32, position.z.floor() as i32);
    assert!(world.contains(under), "no chunk under the player at {position:?}");
    assert!(world.bounds().max_cx > under.cx);
    assert!(world.bounds().keys().all(|key| world.contains(key)));
    assert!(engine.session().dirty().is_empty());
    assert!(engine
        .session()
        .meshes()
        .iter()
        .all(|(key, _)| world.contains(key.chunk())));
}

/// Test: an edit made while a rebuild is in flight is not undone by that rebuild.
#[test]
fn test_stale_rebuild_keeps_the_edited_mesh() {
    let mut engine = engine_with(None);
    let spawn = engine.player_position();
    assert!(engine.tick(spawn, IDLE).rebuild_dispatched);

    let hit = engine.update_target(spawn, Vector3::new(0.0, -1.0, 0.0)).unwrap();
    assert!(engine.apply_action(PlayerAction::Break));
    engine.tick(spawn, IDLE);

    let key = SubChunkKey::containing(hit.block.x, hit.block.y, hit.block.z).unwrap();
    let session = engine.session();
    let expected = build_mesh(
        session.world(),
        MeshRegion::SubChunk(key),
        spawn,
        engine.config().render_distance,
        engine.config().mesh_vertex_capacity,
    );
    assert_eq!(session.meshes().get(key), Some(&expected));
}

/// Test: edits survive saving the record and opening it again.
#[test]
fn test_edits_survive_a_reload() {
    let mut engine = engine_with(Some(MemoryStorage::new()));
    let spawn = engine.player_position();
    let hit = engine.update_target(spawn, Vector3::new(0.0, -1.0, 0.0)).unwrap();
    assert!(engine.apply_action(PlayerAction::Break));

    let record = engine.session().persistence().unwrap().record().clone();
    assert_eq!(record.bounds, engine.session().world().bounds());
    let mut storage = MemoryStorage::new();
    storage
        .store_record("streaming", &serde_json::to_string(&record).unwrap())
        .unwrap();

    let reopened = engine_with(Some(storage));
    let world = reopened.session().world();
    assert_eq!(world.block_at(hit.block.x, hit.block.y, hit.block.z), BlockId::Air);
    assert_eq!(world.bounds(), engine.session().world().bounds());
    assert_eq!(reopened.session().generator().seed(), engine.session().generator().seed());
}

/// Test: a single-volume save is cut into chunks and written back chunked.
#[test]
fn test_legacy_volume_is_transcoded_on_open() {
    let width = CHUNK_SIZE as usize;
    let height = CHUNK_HEIGHT as usize;
    let mut blocks: Vec<BlockTypeSize> = vec![BlockId::Air.raw(); width * width * height];
    blocks[3 + 5 * width + 4 * width * width] = BlockId::Dirt.raw();
    let legacy = LegacyVolume {
        data: chunk_packing::pack_volume(&blocks),
        width,
        height,
        seed: Some(77),
    };
    let mut storage = MemoryStorage::new();
    storage
        .store_record("streaming", &serde_json::to_string(&legacy).unwrap())
        .unwrap();

    let engine = engine_with(Some(storage));
    let session = engine.session();
    assert_eq!(session.generator().seed(), 77);
    assert_eq!(
        session.world().bounds(),
        WorldBounds {
            min_cx: 0,
            max_cx: 0,
            min_cz: 0,
            max_cz: 0
        }
    );
    assert_eq!(session.world().block_at(3, 4, 5), BlockId::Dirt);
    assert_eq!(session.world().block_at(4, 4, 5), BlockId::Air);

    let record = session.persistence().unwrap().record();
    assert_eq!(record.seed, 77);
    assert_eq!(record.chunks.len(), 1);
    let chunk = chunk_packing::unpack(&record.chunks["0_0"]).unwrap();
    assert_eq!(chunk.get(3, 4, 5), BlockId::Dirt);
}

/// Test: an unreadable record is replaced by a freshly generated world.
#[test]
fn test_corrupt_record_starts_a_fresh_world() {
    let mut storage = MemoryStorage::new();
    storage.store_record("streaming", "{\"seed\": \"nope\"}").unwrap();

    let engine = engine_with(Some(storage));
    let session = engine.session();
    assert_eq!(session.world().bounds(), WorldBounds::around_origin(config().initial_chunk_radius));
    assert_eq!(session.world().chunk_count(), session.world().bounds().area());
    assert_eq!(
        session.persistence().unwrap().record().chunks.len(),
        session.world().chunk_count()
    );
}

/// Test: placing needs an empty voxel and a real block.
#[test]
fn test_placement_rules() {
    let mut engine = engine_with(None);
    let surface = engine.session().generator().column_height(16, 16);
    let ground = Point3::new(16, surface, 16);

    assert!(!engine.place_block(ground, BlockId::Dirt));
    assert!(engine.break_block(ground));
    assert!(!engine.break_block(ground));
    assert!(!engine.place_block(ground, BlockId::Air));
    assert!(engine.place_block(ground, BlockId::CherryLeaves));
    assert_eq!(
        engine.session().world().block_at(ground.x, ground.y, ground.z),
        BlockId::CherryLeaves
    );
    assert!(!engine.place_block(Point3::new(5000, 10, 5000), BlockId::Dirt));
}
