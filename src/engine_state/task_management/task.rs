//! # Task System Core Traits
//!
//! This module defines the fundamental building blocks of the task system,
//! which provides a framework for executing work away from the main tick.
//!
//! ## Core Components
//! - `Task`: Represents a unit of work that can be executed asynchronously
//! - `TaskResult`: Represents the result of a completed task
//! - `TaskHandle`: Identifies a submitted task and the kind of work it does
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and submitted through an [`super::Executor`]
//! 2. The task's `process()` method is called on a worker (or inline)
//! 3. The task returns a boxed `TaskResult`
//! 4. The executor hands the result back as a [`TaskOutput`] on the next poll
//! 5. The session applies it with `handle_result()` on the main tick
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred between threads
//! - `TaskResult` must be `Send` to be transferred back to the main thread
//! - Tasks own copies of the data they read; nothing is shared with the live world

use crate::engine_state::SessionState;

/// The kind of background work a task performs.
///
/// The scheduler allows one task of each category in flight at a time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TaskCategory {
    /// Terrain generation for the boundary ring around the world.
    Generation,
    /// Meshing of the sub-chunks in render range.
    Rebuild,
}

/// A trait representing a unit of work that can be executed asynchronously.
///
/// Tasks are the primary mechanism for offloading work from the main thread to
/// background workers. They must own all the data they need to perform their work.
///
/// # Implementation Guidelines
/// - Must be `Send` to be transferred between threads
/// - Should be relatively coarse-grained to amortize task scheduling overhead
/// - Should be `'static` (no non-static references)
pub trait Task: Send {
    /// The category reported back with the result.
    fn category(&self) -> TaskCategory;

    /// Processes the task and returns a result.
    ///
    /// This method contains the actual work to be performed asynchronously.
    /// It runs on a background thread and should avoid blocking operations
    /// that could starve other tasks.
    ///
    /// # Returns
    /// A boxed `TaskResult` that will be applied on the main thread.
    fn process(&self) -> Box<dyn TaskResult + Send>;
}

/// A trait representing the result of processing a `Task`.
///
/// Results are applied on the main tick and are the only way background work reaches
/// the chunk store or the mesh manager.
pub trait TaskResult: Send {
    /// Applies the result to the session.
    ///
    /// # Arguments
    /// * `session` - world, meshes and scheduling flags of the running session
    ///
    /// # Implementation Notes
    /// - Runs on the main thread; keep it proportional to the size of the result
    /// - Must clear the pending flag of its category
    fn handle_result(self: Box<Self>, session: &mut SessionState);
}

/// Identifies a submitted task.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    pub id: u64,
    pub category: TaskCategory,
}

/// A finished task waiting to be applied.
pub struct TaskOutput {
    pub handle: TaskHandle,
    pub result: Box<dyn TaskResult + Send>,
}

impl std::fmt::Debug for TaskOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskOutput").field("handle", &self.handle).finish_non_exhaustive()
    }
}
