//! # Voxel World Core
//!
//! This module contains the data side of the world: what blocks exist, how they are
//! stored, generated and addressed.
//!
//! ## Architecture
//!
//! The voxel system is organized into several key components:
//!
//! * **Block**: The immutable block catalog and per-face properties
//! * **Chunk**: Fixed 32x32x32 voxel columns and their packed text form
//! * **World**: Chunk store keyed by chunk coordinate, with its bounding rectangle
//! * **Terrain**: Deterministic height-field terrain, grass and trees
//! * **Raycast**: Voxel traversal for aiming at blocks
//! * **Tasks**: Background chunk generation
//!
//! ## Data Flow
//!
//! 1. The scheduler asks for chunks along the edge the player approaches
//! 2. A generation task builds and packs them on a worker
//! 3. The main tick merges them into the world and persists them
//! 4. Touched sub-chunks are marked for meshing
//!
//! ## Thread Safety
//!
//! The world is only mutated on the main tick. Workers receive owned copies of the
//! chunks they need and return owned results.

pub mod block;
pub mod chunk;
pub mod raycast;
pub mod tasks;
pub mod terrain;
pub mod world;
