//! Test observers for engine progress.

use std::sync::{Arc, Mutex};

use dockrun::engine::{Step, TaskEvent};
use dockrun::ui::EventLogger;

/// Records every step, event and failure message for later assertions.
#[derive(Default)]
pub struct RecordingEventLogger {
    steps: Arc<Mutex<Vec<Step>>>,
    events: Arc<Mutex<Vec<TaskEvent>>>,
    failures: Arc<Mutex<Vec<String>>>,
}

impl RecordingEventLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps in the order they started.
    pub fn steps(&self) -> Vec<Step> {
        self.steps.lock().unwrap().clone()
    }

    /// Events in the order they were folded into the tracker.
    pub fn events(&self) -> Vec<TaskEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Failure messages shown to the user.
    pub fn failure_messages(&self) -> Vec<String> {
        self.failures.lock().unwrap().clone()
    }
}

impl EventLogger for RecordingEventLogger {
    fn on_step_starting(&self, step: &Step) {
        self.steps.lock().unwrap().push(step.clone());
    }

    fn on_event(&self, event: &TaskEvent) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn on_task_failure(&self, message: &str) {
        self.failures.lock().unwrap().push(message.to_string());
    }
}
