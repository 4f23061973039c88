//! # Task Management System
//!
//! This module provides a cross-platform task management system for executing work
//! off the main tick across multiple threads (native) or web workers (WASM).
//!
//! ## Architecture Overview
//!
//! The task management system consists of several key components:
//! - `Executor`: The seam the scheduler talks to (`submit` / `poll_completed`)
//! - `TaskManager`: Worker pool coordinator for task distribution
//! - `InlineExecutor`: Runs tasks on the calling thread when polled
//! - `Task` / `TaskResult`: A unit of work and the owned result it produces
//! - `TaskChannel`: Communication channel between the main thread and one worker
//!
//! ## Platform-Specific Behavior
//!
//! ### Native (Desktop) Implementation
//! - Uses Rust's standard library `std::thread` for true multi-threading
//! - Each worker has a dedicated channel for task distribution
//!
//! ### Web (WASM) Implementation
//! - Uses `wasm_thread` crate to spawn Web Workers with the same API
//! - Tasks are processed asynchronously but may not run in parallel
//!
//! ## Task Lifecycle
//! 1. Tasks are submitted via `Executor::submit()` and receive a `TaskHandle`
//! 2. The manager distributes tasks to available worker channels using round-robin,
//!    queueing them when every worker is busy
//! 3. Workers process tasks and send back owned results
//! 4. `Executor::poll_completed()` drains finished results on the main tick
//! 5. The session applies each result through `TaskResult::handle_result()`
//!
//! ## Example Usage
//! ```
//! use voxel_sandbox::engine_state::task_management::{Executor, InlineExecutor};
//!
//! let mut executor = InlineExecutor::new();
//! assert!(executor.poll_completed().is_empty());
//! ```

pub mod task;

use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};
use task::{Task, TaskHandle, TaskOutput};

#[cfg(target_family = "wasm")]
mod wasm_imports {
    pub use wasm_thread as thread;
    pub use wasm_thread::JoinHandle;
}

#[cfg(target_family = "wasm")]
use self::wasm_imports::*;

#[cfg(not(target_family = "wasm"))]
use std::thread::{self, JoinHandle};

/// Something that runs tasks and hands their results back on request.
///
/// The scheduler is written against this trait so that it runs unchanged on a worker
/// pool or inline in tests.
pub trait Executor {
    /// Accepts a task for execution. Never blocks.
    fn submit(&mut self, task: Box<dyn Task + Send>) -> TaskHandle;

    /// Returns every task that finished since the last poll.
    fn poll_completed(&mut self) -> Vec<TaskOutput>;
}

type Job = (TaskHandle, Box<dyn Task + Send>);

/// A communication channel between the main thread and a worker thread.
///
/// # Fields
/// - `task_sender`: Sends tasks from main thread to worker
/// - `result_receiver`: Receives task results from worker
/// - `num_tasks_in_flight`: Tracks number of tasks currently being processed
/// - `_worker`: Handle to the worker thread (kept alive by this struct)
#[derive(Debug)]
pub struct TaskChannel {
    task_sender: Sender<Job>,
    result_receiver: Receiver<TaskOutput>,
    num_tasks_in_flight: usize,
    _worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// # Fields
/// - `channels`: Set of active worker channels
/// - `queued_tasks`: Tasks waiting for an available worker
/// - `current_channel`: Index for round-robin scheduling
/// - `next_id`: Id assigned to the next submitted task
///
/// Dropping the manager closes every task channel, which ends the worker loops.
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    queued_tasks: VecDeque<Job>,
    current_channel: usize,
    next_id: u64,
}

/// Maximum number of tasks that can be in flight per worker channel.
///
/// This is set to 1 to ensure tasks are processed in order within each channel.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

impl TaskManager {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to create. On web targets, this is
    ///   typically 1-2 due to browser limitations.
    ///
    /// # Platform Notes
    /// - **Native**: Creates actual OS threads
    /// - **Web**: Creates Web Workers
    pub fn new(num_workers: usize) -> Self {
        let mut channels = Vec::with_capacity(num_workers);

        log::info!(
            "Starting {} task workers (available parallelism: {:?})",
            num_workers,
            thread::available_parallelism()
        );

        for _ in 0..num_workers {
            let (task_tx, task_rx) = channel::<Job>();
            let (result_tx, result_rx) = channel::<TaskOutput>();

            let task_closure = move || {
                while let Ok((handle, task)) = task_rx.recv() {
                    let result = task.process();
                    if result_tx.send(TaskOutput { handle, result }).is_err() {
                        break;
                    }
                }
            };

            let worker = thread::spawn(task_closure);

            channels.push(TaskChannel {
                task_sender: task_tx,
                result_receiver: result_rx,
                num_tasks_in_flight: 0,
                _worker: worker,
            });
        }

        TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
            next_id: 0,
        }
    }

    /// Number of worker channels.
    pub fn worker_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of tasks waiting for a free worker.
    pub fn queued_count(&self) -> usize {
        self.queued_tasks.len()
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the task was successfully sent to the worker
    /// - `Err(job)` if the send failed (worker disconnected), so it can be requeued
    fn try_send_task(&mut self, job: Job, channel_idx: usize) -> Result<(), Job> {
        match self.channels[channel_idx].task_sender.send(job) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(job) => Err(job.0),
        }
    }

    /// Finds an available worker channel that can accept a new task.
    ///
    /// This implements a round-robin scheduling strategy starting from the last
    /// used channel. Channels that have reached `MAX_TASKS_IN_FLIGHT` are skipped.
    ///
    /// # Returns
    /// - `Some(usize)` index of an available channel
    /// - `None` if all channels are busy or there are no channels
    fn find_available_channel(&self) -> Option<usize> {
        let len = self.channels.len();
        (0..len)
            .map(|offset| (self.current_channel + offset) % len)
            .find(|&idx| self.channels[idx].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT)
    }

    /// Publishes a job for execution.
    ///
    /// # Returns
    /// - `true` if the job was immediately scheduled on an available worker
    /// - `false` if the job was queued because all workers are busy
    fn publish_job(&mut self, job: Job) -> bool {
        let Some(channel_idx) = self.find_available_channel() else {
            self.queued_tasks.push_back(job);
            return false;
        };

        match self.try_send_task(job, channel_idx) {
            Ok(_) => {
                self.current_channel = (channel_idx + 1) % self.channels.len();
                true
            }
            Err(job) => {
                log::error!("Task worker {} disconnected, requeueing task", channel_idx);
                self.queued_tasks.push_back(job);
                false
            }
        }
    }

    /// Moves queued tasks onto workers that have become available.
    ///
    /// Processes tasks in FIFO order and stops at the first task that can't be
    /// scheduled.
    pub fn process_queued_tasks(&mut self) {
        while let Some(channel_idx) = self.find_available_channel() {
            let Some(job) = self.queued_tasks.pop_front() else {
                return;
            };
            if let Err(job) = self.try_send_task(job, channel_idx) {
                // Channel is disconnected, put task back and stop processing
                self.queued_tasks.push_front(job);
                return;
            }
            self.current_channel = (channel_idx + 1) % self.channels.len();
        }
    }
}

impl Executor for TaskManager {
    fn submit(&mut self, task: Box<dyn Task + Send>) -> TaskHandle {
        let handle = TaskHandle {
            id: self.next_id,
            category: task.category(),
        };
        self.next_id += 1;

        if !self.publish_job((handle, task)) {
            log::debug!("Task {:?} queued, all workers busy", handle);
        }
        handle
    }

    fn poll_completed(&mut self) -> Vec<TaskOutput> {
        let mut completed = Vec::new();
        for channel in &mut self.channels {
            while let Ok(output) = channel.result_receiver.try_recv() {
                channel.num_tasks_in_flight -= 1;
                completed.push(output);
            }
        }

        self.process_queued_tasks();
        completed
    }
}

/// Runs every submitted task on the calling thread the next time it is polled.
///
/// Used by tests and by hosts without threads; results are returned in submission
/// order.
#[derive(Default)]
pub struct InlineExecutor {
    pending: VecDeque<Job>,
    next_id: u64,
}

impl InlineExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of tasks ever submitted.
    pub fn submitted_count(&self) -> u64 {
        self.next_id
    }

    /// Number of tasks waiting for the next poll.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Executor for InlineExecutor {
    fn submit(&mut self, task: Box<dyn Task + Send>) -> TaskHandle {
        let handle = TaskHandle {
            id: self.next_id,
            category: task.category(),
        };
        self.next_id += 1;
        self.pending.push_back((handle, task));
        handle
    }

    fn poll_completed(&mut self) -> Vec<TaskOutput> {
        self.pending
            .drain(..)
            .map(|(handle, task)| TaskOutput {
                handle,
                result: task.process(),
            })
            .collect()
    }
}

#[cfg(all(test, not(target_family = "wasm")))]
mod tests {
    use super::task::{TaskCategory, TaskResult};
    use super::*;
    use crate::engine_state::SessionState;
    use std::time::{Duration, Instant};

    struct Echo(TaskCategory);

    struct Done;

    impl TaskResult for Done {
        fn handle_result(self: Box<Self>, _session: &mut SessionState) {}
    }

    impl Task for Echo {
        fn category(&self) -> TaskCategory {
            self.0
        }

        fn process(&self) -> Box<dyn TaskResult + Send> {
            Box::new(Done)
        }
    }

    fn drain(manager: &mut TaskManager, expected: usize) -> Vec<TaskOutput> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut outputs = Vec::new();
        while outputs.len() < expected && Instant::now() < deadline {
            outputs.extend(manager.poll_completed());
            thread::sleep(Duration::from_millis(1));
        }
        outputs
    }

    #[test]
    fn tasks_beyond_worker_capacity_are_queued_then_run() {
        let mut manager = TaskManager::new(1);
        let handles: Vec<_> = (0..3)
            .map(|_| manager.submit(Box::new(Echo(TaskCategory::Rebuild))))
            .collect();
        assert_eq!(manager.queued_count(), 2);

        let mut ids: Vec<_> = drain(&mut manager, 3).iter().map(|output| output.handle.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, handles.iter().map(|handle| handle.id).collect::<Vec<_>>());
        assert_eq!(manager.queued_count(), 0);
    }

    #[test]
    fn handles_carry_the_task_category() {
        let mut manager = TaskManager::new(2);
        let generation = manager.submit(Box::new(Echo(TaskCategory::Generation)));
        let rebuild = manager.submit(Box::new(Echo(TaskCategory::Rebuild)));
        assert_eq!(generation.category, TaskCategory::Generation);
        assert_eq!(rebuild.category, TaskCategory::Rebuild);
        assert_ne!(generation.id, rebuild.id);

        let outputs = drain(&mut manager, 2);
        assert_eq!(outputs.len(), 2);
    }

    #[test]
    fn inline_executor_runs_on_poll() {
        let mut executor = InlineExecutor::new();
        executor.submit(Box::new(Echo(TaskCategory::Generation)));
        executor.submit(Box::new(Echo(TaskCategory::Rebuild)));
        assert_eq!(executor.pending_count(), 2);

        let outputs = executor.poll_completed();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].handle.category, TaskCategory::Generation);
        assert_eq!(executor.pending_count(), 0);
        assert_eq!(executor.submitted_count(), 2);
    }
}
