//! # Voxel Sandbox Headless Demo
//!
//! Opens a world, walks a player east across it for a fixed number of frames while
//! streaming terrain and rebuilding meshes, digs and builds along the way, and logs
//! what the engine did.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- [config.json]
//! ```

use std::path::Path;
use std::process::ExitCode;

use cgmath::{Point3, Vector3};
use voxel_sandbox::engine_state::persistence::{FileStorage, WorldStorage};
use voxel_sandbox::{EngineConfig, EngineState, PlayerAction};
use web_time::{Duration, Instant};

const DEMO_FRAMES: u32 = 900;
const FRAME_INTERVAL: Duration = Duration::from_millis(16);
/// Blocks walked per frame.
const WALK_SPEED: f32 = 0.4;
/// Frames between two edits.
const EDIT_INTERVAL: u32 = 60;
/// Frames allowed for in-flight tasks to finish after the walk.
const DRAIN_FRAMES: u32 = 300;

fn main() -> ExitCode {
    voxel_sandbox::init_logging();

    let config = match std::env::args_os().nth(1) {
        Some(path) => match EngineConfig::load(Path::new(&path)) {
            Ok(config) => config,
            Err(err) => {
                log::error!("{}", err);
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::default(),
    };

    let storage = config
        .storage_dir
        .clone()
        .map(|dir| Box::new(FileStorage::new(dir)) as Box<dyn WorldStorage>);
    let mut engine = EngineState::new(config, storage);

    let started = Instant::now();
    let mut frame_time = Duration::ZERO;
    let mut position = engine.player_position();
    let mut edits = 0;
    let mut generations = 0;
    let mut rebuilds = 0;

    for frame in 0..DEMO_FRAMES {
        let frame_start = Instant::now();

        position.x += WALK_SPEED;
        let surface = engine
            .session()
            .generator()
            .column_height(position.x.floor() as i32, position.z.floor() as i32);
        position.y = surface as f32 + 2.0;

        let report = engine.tick(position, frame_time);
        generations += report.generation_dispatched as u32;
        rebuilds += report.rebuild_dispatched as u32;

        if frame % EDIT_INTERVAL == 0 {
            let look = Vector3::new(1.0, -1.0, 0.0);
            if engine.update_target(position, look).is_some() {
                let action = if frame % (EDIT_INTERVAL * 2) == 0 {
                    PlayerAction::Break
                } else {
                    PlayerAction::PlaceSelected
                };
                edits += engine.apply_action(action) as u32;
            }
        }

        frame_time = frame_start.elapsed();
        if frame_time < FRAME_INTERVAL {
            std::thread::sleep(FRAME_INTERVAL - frame_time);
        }
    }

    for _ in 0..DRAIN_FRAMES {
        let session = engine.session();
        if !session.is_generation_pending() && !session.is_rebuild_pending() {
            break;
        }
        engine.apply_completed();
        std::thread::sleep(FRAME_INTERVAL);
    }

    let session = engine.session();
    let stats = engine.mesh_stats();
    log::info!(
        "Walked to {:?} in {:.1?}: {} generation and {} rebuild tasks, {} edits",
        Point3::new(position.x.round(), position.y.round(), position.z.round()),
        started.elapsed(),
        generations,
        rebuilds,
        edits
    );
    log::info!(
        "World holds {} chunks within {:?}; {} sub-chunk meshes resident ({} terrain, {} plant vertices)",
        session.world().chunk_count(),
        session.world().bounds(),
        stats.sub_chunks,
        stats.terrain_vertices,
        stats.grass_vertices
    );
    ExitCode::SUCCESS
}
