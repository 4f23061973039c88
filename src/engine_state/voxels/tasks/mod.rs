//! # Voxel Task System
//!
//! This module contains tasks related to voxel world generation. These tasks are
//! processed away from the main tick to keep frame times stable while the world grows.

pub mod chunk_generation_task;

pub use chunk_generation_task::{ChunkGenerationTask, GeneratedChunk};
