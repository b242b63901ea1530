// src/engine/catalog.rs

//! Pure step proposal.
//!
//! Given the current tracked state, propose the set of steps that are
//! runnable right now. Same state always yields the same proposal, in the
//! same order. Two modes:
//!
//! - **forward** (default): bring resources up in container dependency
//!   order, run the main container once its dependencies are healthy, and
//!   propose nothing once it has exited successfully.
//! - **cleanup** (entered when any failure has been recorded, never left):
//!   propose the failure display once, then teardown steps in reverse
//!   creation order, unless the run options say not to clean up.

use crate::engine::state::{ContainerLifecycle, NetworkLifecycle, TaskStateTracker};
use crate::engine::step::Step;
use crate::engine::task::Task;
use crate::engine::{BehaviourAfterFailure, RunOptions};
use crate::exec::NetworkId;

/// Propose the steps that are runnable against the given state.
///
/// An empty proposal means the run is over: the executor derives the final
/// outcome (or flags a deadlock) from the state.
pub fn propose_runnable_steps(state: &TaskStateTracker, options: &RunOptions) -> Vec<Step> {
    if state.cleanup_mode() {
        propose_cleanup_steps(state, options)
    } else {
        propose_forward_steps(state)
    }
}

fn propose_forward_steps(state: &TaskStateTracker) -> Vec<Step> {
    let task = state.task();

    let network = match state.network() {
        NetworkLifecycle::NotCreated => return vec![Step::CreateTaskNetwork],
        NetworkLifecycle::Created(network) => network.clone(),
        // Unreachable in forward mode; teardown only happens after a failure.
        NetworkLifecycle::Deleted | NetworkLifecycle::DeletionFailed => return Vec::new(),
    };

    let mut steps = Vec::new();

    for name in task.containers.keys() {
        match state.lifecycle_of(name) {
            Some(ContainerLifecycle::NotCreated) => steps.push(Step::CreateContainer {
                container: name.clone(),
                network: network.clone(),
            }),

            Some(ContainerLifecycle::Created) => {
                if !dependencies_healthy(state, task, name) {
                    continue;
                }

                if let Some(id) = state.id_of(name) {
                    if task.is_main(name) {
                        steps.push(Step::RunContainer {
                            container: name.clone(),
                            id: id.clone(),
                        });
                    } else {
                        steps.push(Step::StartContainer {
                            container: name.clone(),
                            id: id.clone(),
                        });
                    }
                }
            }

            Some(ContainerLifecycle::Started) if !task.is_main(name) => {
                if let Some(id) = state.id_of(name) {
                    steps.push(Step::WaitForContainerToBecomeHealthy {
                        container: name.clone(),
                        id: id.clone(),
                    });
                }
            }

            _ => {}
        }
    }

    steps
}

fn propose_cleanup_steps(state: &TaskStateTracker, options: &RunOptions) -> Vec<Step> {
    let mut steps = Vec::new();

    if !state.failure_displayed() {
        if let Some(message) = state.first_failure() {
            steps.push(Step::DisplayTaskFailure {
                message: message.to_string(),
            });
        }
    }

    if options.behaviour_after_failure == BehaviourAfterFailure::DontCleanup {
        return steps;
    }

    // Teardown in strict reverse of creation order: stop before remove, and
    // the network only once every created container is gone.
    for name in state.creation_order().iter().rev() {
        match state.lifecycle_of(name) {
            Some(ContainerLifecycle::Started) | Some(ContainerLifecycle::Healthy) => {
                if let Some(id) = state.id_of(name) {
                    steps.push(Step::StopContainer {
                        container: name.clone(),
                        id: id.clone(),
                    });
                }
            }

            Some(ContainerLifecycle::Created)
            | Some(ContainerLifecycle::Stopped)
            | Some(ContainerLifecycle::Exited(_)) => {
                if let Some(id) = state.id_of(name) {
                    steps.push(Step::RemoveContainer {
                        container: name.clone(),
                        id: id.clone(),
                    });
                }
            }

            _ => {}
        }
    }

    if all_containers_settled(state) {
        if let Some(network) = network_awaiting_deletion(state) {
            steps.push(Step::DeleteTaskNetwork { network });
        }
    }

    steps
}

fn dependencies_healthy(state: &TaskStateTracker, task: &Task, container: &str) -> bool {
    let Some(spec) = task.containers.get(container) else {
        return false;
    };

    spec.depends_on.iter().all(|dep| {
        matches!(
            state.lifecycle_of(dep),
            Some(ContainerLifecycle::Healthy)
        )
    })
}

/// True once no container needs further teardown: never created, removed,
/// or given up on after a failed cleanup step.
fn all_containers_settled(state: &TaskStateTracker) -> bool {
    state.task().containers.keys().all(|name| {
        matches!(
            state.lifecycle_of(name),
            Some(ContainerLifecycle::NotCreated)
                | Some(ContainerLifecycle::Removed)
                | Some(ContainerLifecycle::CleanupFailed)
        )
    })
}

fn network_awaiting_deletion(state: &TaskStateTracker) -> Option<NetworkId> {
    match state.network() {
        NetworkLifecycle::Created(network) => Some(network.clone()),
        _ => None,
    }
}
