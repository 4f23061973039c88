#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Sandbox
//!
//! The world core of a block-building sandbox: procedural terrain streamed in chunks
//! around the player, face-culled meshes ready for upload, block targeting and editing,
//! and persistence of the edited world.
//!
//! The crate has no graphics or windowing dependencies. A presentation layer drives an
//! [`EngineState`] once per frame and uploads the buffers of the resident meshes.
//!
//! ## Key Modules
//!
//! * `config` - Session settings loaded from JSON
//! * `engine_state` - Scheduler, world data, meshing, persistence and task execution
//! * `error` - Recoverable error types
//!
//! ## Usage
//!
//! ```no_run
//! use voxel_sandbox::{config::EngineConfig, engine_state::EngineState};
//! use web_time::Duration;
//!
//! voxel_sandbox::init_logging();
//! let mut engine = EngineState::new(EngineConfig::default(), None);
//! let player = engine.player_position();
//! engine.tick(player, Duration::from_millis(16));
//! ```
//!
//! ## Platform Support
//!
//! Native targets run background work on `std::thread` workers. On WebAssembly the
//! same task manager spawns web workers through `wasm_thread`, and logging goes to
//! the browser console.

pub mod config;
pub mod engine_state;
pub mod error;

pub use config::EngineConfig;
pub use engine_state::{EngineState, PlayerAction};

/// Installs the logger.
///
/// Native builds log to stdout through `env_logger`, filtered by `RUST_LOG`. Web
/// builds log to the browser console and install a panic hook that reports there.
/// Calling it more than once is harmless.
#[cfg(not(target_family = "wasm"))]
pub fn init_logging() {
    let mut log_builder = env_logger::Builder::new();
    let _ = log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .try_init();
}

/// Installs the logger.
///
/// Native builds log to stdout through `env_logger`, filtered by `RUST_LOG`. Web
/// builds log to the browser console and install a panic hook that reports there.
/// Calling it more than once is harmless.
#[cfg(target_family = "wasm")]
pub fn init_logging() {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    let _ = console_log::init_with_level(log::Level::Info);
}
