// src/engine/mod.rs

//! Task execution engine.
//!
//! A task run is decomposed into discrete steps (actions against the
//! container runtime) and the events they produce:
//!
//! - [`task`] holds the engine-facing task and container model.
//! - [`step`] and [`event`] are the closed step/event vocabularies.
//! - [`state`] folds the ordered event sequence into derived run state.
//! - [`catalog`] is the pure function that proposes runnable steps from the
//!   current state, in forward or cleanup mode.
//! - [`executor`] is the async shell that drives the
//!   propose → dispatch → fold loop with bounded parallelism.

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Canonical container name type used throughout the engine.
pub type ContainerName = String;

/// Exit code reported when a task fails before its main container ran.
pub const TASK_DID_NOT_RUN_EXIT_CODE: i32 = -1;

/// What to do with already-created resources when a task fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviourAfterFailure {
    /// Tear everything down in reverse creation order (the default).
    Cleanup,
    /// Leave created containers and networks running so the failure can be
    /// investigated; only the failure message is displayed.
    DontCleanup,
}

/// Immutable per-invocation options, passed by value to every task execution.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Maximum number of steps dispatched concurrently. Must be >= 1.
    pub level_of_parallelism: usize,
    pub behaviour_after_failure: BehaviourAfterFailure,
    /// Whether `http_proxy` and friends are propagated from the process
    /// environment into containers.
    pub propagate_proxy_environment_variables: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            level_of_parallelism: 2,
            behaviour_after_failure: BehaviourAfterFailure::Cleanup,
            propagate_proxy_environment_variables: true,
        }
    }
}

pub mod catalog;
pub mod event;
pub mod executor;
pub mod state;
pub mod step;
pub mod task;

pub use catalog::propose_runnable_steps;
pub use event::TaskEvent;
pub use executor::TaskExecutor;
pub use state::{ContainerLifecycle, NetworkLifecycle, TaskStateTracker};
pub use step::Step;
pub use task::{ContainerSpec, Task};
