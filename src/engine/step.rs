// src/engine/step.rs

//! The closed set of actions the engine can take against the container
//! runtime. A step is pure data; all execution state lives in the tracker.

use std::fmt;

use crate::engine::ContainerName;
use crate::exec::{ContainerId, NetworkId};

/// One idempotent-intent action against the container runtime.
///
/// Steps carry the resolved identifiers they need so that dispatch does not
/// have to consult the tracker concurrently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    CreateTaskNetwork,
    CreateContainer {
        container: ContainerName,
        network: NetworkId,
    },
    StartContainer {
        container: ContainerName,
        id: ContainerId,
    },
    WaitForContainerToBecomeHealthy {
        container: ContainerName,
        id: ContainerId,
    },
    /// Run the main container attached and wait for it to exit.
    RunContainer {
        container: ContainerName,
        id: ContainerId,
    },
    StopContainer {
        container: ContainerName,
        id: ContainerId,
    },
    RemoveContainer {
        container: ContainerName,
        id: ContainerId,
    },
    DeleteTaskNetwork {
        network: NetworkId,
    },
    /// Report the task's (first) failure to the user, exactly once per run.
    DisplayTaskFailure {
        message: String,
    },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::CreateTaskNetwork => write!(f, "Creating task network..."),
            Step::CreateContainer { container, .. } => {
                write!(f, "Creating container '{container}'...")
            }
            Step::StartContainer { container, .. } => {
                write!(f, "Starting container '{container}'...")
            }
            Step::WaitForContainerToBecomeHealthy { container, .. } => {
                write!(f, "Waiting for container '{container}' to become healthy...")
            }
            Step::RunContainer { container, .. } => write!(f, "Running '{container}'..."),
            Step::StopContainer { container, .. } => {
                write!(f, "Stopping container '{container}'...")
            }
            Step::RemoveContainer { container, .. } => {
                write!(f, "Removing container '{container}'...")
            }
            Step::DeleteTaskNetwork { .. } => write!(f, "Deleting task network..."),
            Step::DisplayTaskFailure { .. } => write!(f, "Displaying task failure..."),
        }
    }
}
