// src/engine/state.rs

//! Per-run event sequence and derived state.
//!
//! The tracker is the single source of truth for "what has happened so far"
//! in one task run. Steps produce events; [`TaskStateTracker::append`] folds
//! each event into derived state that the step catalog consults. Derived
//! state is a pure function of the event sequence, so replaying the same
//! events always yields the same state.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::engine::event::TaskEvent;
use crate::engine::task::Task;
use crate::engine::ContainerName;
use crate::errors::{DockrunError, Result};
use crate::exec::{ContainerId, NetworkId};

/// Lifecycle phase of one container. Transitions are monotonic; the tracker
/// rejects any event that would move a container backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerLifecycle {
    NotCreated,
    Created,
    Started,
    Healthy,
    /// The main container ran to completion with this exit code.
    Exited(i32),
    Stopped,
    Removed,
    /// A cleanup step for this container failed; it will not be retried.
    CleanupFailed,
}

/// Lifecycle phase of the task network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkLifecycle {
    NotCreated,
    Created(NetworkId),
    Deleted,
    /// Deleting the network failed; it will not be retried.
    DeletionFailed,
}

#[derive(Debug, Clone)]
struct ContainerState {
    id: Option<ContainerId>,
    lifecycle: ContainerLifecycle,
}

/// Folds the ordered event sequence of one task run into derived state.
///
/// Scoped to a single task run: created at task start by the executor and
/// dropped when the run ends, whether it succeeded or failed.
#[derive(Debug)]
pub struct TaskStateTracker {
    task: Arc<Task>,
    events: Vec<TaskEvent>,
    network: NetworkLifecycle,
    containers: BTreeMap<ContainerName, ContainerState>,
    /// Container names in the order their `ContainerCreated` events arrived.
    creation_order: Vec<ContainerName>,
    /// First recorded failure message; later failures are kept in `events`
    /// but do not replace it.
    failure: Option<String>,
    failure_displayed: bool,
}

impl TaskStateTracker {
    pub fn new(task: Arc<Task>) -> Self {
        let containers = task
            .containers
            .keys()
            .map(|name| {
                (
                    name.clone(),
                    ContainerState {
                        id: None,
                        lifecycle: ContainerLifecycle::NotCreated,
                    },
                )
            })
            .collect();

        Self {
            task,
            events: Vec::new(),
            network: NetworkLifecycle::NotCreated,
            containers,
            creation_order: Vec::new(),
            failure: None,
            failure_displayed: false,
        }
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    /// The ordered event sequence observed so far.
    pub fn events(&self) -> &[TaskEvent] {
        &self.events
    }

    pub fn network(&self) -> &NetworkLifecycle {
        &self.network
    }

    pub fn lifecycle_of(&self, container: &str) -> Option<ContainerLifecycle> {
        self.containers.get(container).map(|c| c.lifecycle)
    }

    pub fn id_of(&self, container: &str) -> Option<&ContainerId> {
        self.containers.get(container).and_then(|c| c.id.as_ref())
    }

    /// Container names in creation order.
    pub fn creation_order(&self) -> &[ContainerName] {
        &self.creation_order
    }

    /// Whether a failure has been recorded; once true, the catalog proposes
    /// only cleanup steps. One-directional for the lifetime of the run.
    pub fn cleanup_mode(&self) -> bool {
        self.failure.is_some()
    }

    /// The first recorded failure message, if any.
    pub fn first_failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn failure_displayed(&self) -> bool {
        self.failure_displayed
    }

    /// Exit code of the main container, if it has run to completion.
    pub fn main_exit_code(&self) -> Option<i32> {
        match self.lifecycle_of(&self.task.main_container) {
            Some(ContainerLifecycle::Exited(code)) => Some(code),
            _ => None,
        }
    }

    /// Record an event and fold it into derived state.
    ///
    /// Out-of-order events (e.g. a container observed started before it was
    /// created) are a defect in the engine and yield an
    /// [`DockrunError::InternalInconsistency`].
    pub fn append(&mut self, event: TaskEvent) -> Result<()> {
        debug!(task = %self.task.name, event = %event, "folding event");
        self.fold(&event)?;
        self.events.push(event);
        Ok(())
    }

    fn fold(&mut self, event: &TaskEvent) -> Result<()> {
        match event {
            TaskEvent::TaskNetworkCreated { network } => {
                if self.network != NetworkLifecycle::NotCreated {
                    return Err(self.out_of_order(event));
                }
                self.network = NetworkLifecycle::Created(network.clone());
                Ok(())
            }

            TaskEvent::ContainerCreated { container, id } => {
                self.transition(container, event, |from| {
                    matches!(from, ContainerLifecycle::NotCreated)
                }, ContainerLifecycle::Created)?;
                self.set_id(container, id.clone());
                self.creation_order.push(container.clone());
                Ok(())
            }

            TaskEvent::ContainerStarted { container } => self.transition(
                container,
                event,
                |from| matches!(from, ContainerLifecycle::Created),
                ContainerLifecycle::Started,
            ),

            TaskEvent::ContainerBecameHealthy { container } => self.transition(
                container,
                event,
                |from| matches!(from, ContainerLifecycle::Started),
                ContainerLifecycle::Healthy,
            ),

            TaskEvent::ContainerBecameUnhealthy { container, message } => {
                // The container stays in Started so that cleanup still stops it.
                match self.lifecycle_of(container) {
                    Some(ContainerLifecycle::Started) => {}
                    _ => return Err(self.out_of_order(event)),
                }
                self.record_failure(format!(
                    "Container '{container}' did not become healthy: {message}"
                ));
                Ok(())
            }

            TaskEvent::RunningContainerExited {
                container,
                exit_code,
            } => {
                self.transition(
                    container,
                    event,
                    |from| matches!(from, ContainerLifecycle::Created),
                    ContainerLifecycle::Exited(*exit_code),
                )?;
                if *exit_code != 0 {
                    self.record_failure(format!(
                        "The main container '{container}' exited with code {exit_code}."
                    ));
                }
                Ok(())
            }

            TaskEvent::ContainerStopped { container } => self.transition(
                container,
                event,
                |from| {
                    matches!(
                        from,
                        ContainerLifecycle::Started | ContainerLifecycle::Healthy
                    )
                },
                ContainerLifecycle::Stopped,
            ),

            TaskEvent::ContainerRemoved { container } => self.transition(
                container,
                event,
                |from| {
                    matches!(
                        from,
                        ContainerLifecycle::Created
                            | ContainerLifecycle::Stopped
                            | ContainerLifecycle::Exited(_)
                    )
                },
                ContainerLifecycle::Removed,
            ),

            TaskEvent::TaskNetworkDeleted => {
                if !matches!(self.network, NetworkLifecycle::Created(_)) {
                    return Err(self.out_of_order(event));
                }
                self.network = NetworkLifecycle::Deleted;
                Ok(())
            }

            TaskEvent::TaskFailed { message } => {
                self.record_failure(message.clone());
                Ok(())
            }

            TaskEvent::TaskFailureDisplayed => {
                if self.failure.is_none() || self.failure_displayed {
                    return Err(self.out_of_order(event));
                }
                self.failure_displayed = true;
                Ok(())
            }

            TaskEvent::ContainerStopFailed { container, .. } => self.transition(
                container,
                event,
                |from| {
                    matches!(
                        from,
                        ContainerLifecycle::Started | ContainerLifecycle::Healthy
                    )
                },
                ContainerLifecycle::CleanupFailed,
            ),

            TaskEvent::ContainerRemovalFailed { container, .. } => self.transition(
                container,
                event,
                |from| {
                    matches!(
                        from,
                        ContainerLifecycle::Created
                            | ContainerLifecycle::Stopped
                            | ContainerLifecycle::Exited(_)
                    )
                },
                ContainerLifecycle::CleanupFailed,
            ),

            TaskEvent::TaskNetworkDeletionFailed { .. } => {
                if !matches!(self.network, NetworkLifecycle::Created(_)) {
                    return Err(self.out_of_order(event));
                }
                self.network = NetworkLifecycle::DeletionFailed;
                Ok(())
            }
        }
    }

    fn transition(
        &mut self,
        container: &str,
        event: &TaskEvent,
        allowed_from: impl Fn(ContainerLifecycle) -> bool,
        to: ContainerLifecycle,
    ) -> Result<()> {
        let current = match self.lifecycle_of(container) {
            Some(current) => current,
            None => {
                return Err(DockrunError::InternalInconsistency(format!(
                    "event '{event}' refers to container '{container}', which is not part of task '{}'",
                    self.task.name
                )));
            }
        };

        if !allowed_from(current) {
            return Err(self.out_of_order(event));
        }

        if let Some(state) = self.containers.get_mut(container) {
            state.lifecycle = to;
        }

        Ok(())
    }

    fn set_id(&mut self, container: &str, id: ContainerId) {
        if let Some(state) = self.containers.get_mut(container) {
            state.id = Some(id);
        }
    }

    fn record_failure(&mut self, message: String) {
        // First failure wins; concurrent failures are kept in the event
        // sequence but never separately displayed.
        if self.failure.is_none() {
            self.failure = Some(message);
        } else {
            debug!(task = %self.task.name, "additional failure recorded after the first");
        }
    }

    fn out_of_order(&self, event: &TaskEvent) -> DockrunError {
        DockrunError::InternalInconsistency(format!(
            "out-of-order event for task '{}': {event}",
            self.task.name
        ))
    }
}
