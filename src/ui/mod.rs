// src/ui/mod.rs

//! Progress observation.
//!
//! The engine reports every starting step and every folded event to an
//! [`EventLogger`]. The dependency is strictly one-directional: observers
//! are presentation only and cannot influence engine decisions.

use tracing::{debug, info};

use crate::engine::event::TaskEvent;
use crate::engine::step::Step;

/// Read-only observer of one task run's progress.
pub trait EventLogger: Send + Sync {
    /// Called just before a step is dispatched.
    fn on_step_starting(&self, step: &Step);

    /// Called for every event, in the order it is folded into the tracker.
    fn on_event(&self, event: &TaskEvent);

    /// Called when the engine displays a task failure (at most once per run).
    fn on_task_failure(&self, message: &str);
}

/// Prints step progress to stdout and failures to stderr; events are only
/// logged at debug level.
pub struct ConsoleEventLogger;

impl EventLogger for ConsoleEventLogger {
    fn on_step_starting(&self, step: &Step) {
        match step {
            // The failure message itself is printed via `on_task_failure`.
            Step::DisplayTaskFailure { .. } => {}
            step => println!("{step}"),
        }
    }

    fn on_event(&self, event: &TaskEvent) {
        debug!(event = %event, "event posted");
    }

    fn on_task_failure(&self, message: &str) {
        eprintln!();
        eprintln!("{message}");
    }
}

/// Observer that reports nothing to the user, only to the log.
pub struct QuietEventLogger;

impl EventLogger for QuietEventLogger {
    fn on_step_starting(&self, step: &Step) {
        info!(step = %step, "step starting");
    }

    fn on_event(&self, event: &TaskEvent) {
        debug!(event = %event, "event posted");
    }

    fn on_task_failure(&self, message: &str) {
        info!(message, "task failure");
    }
}
