// src/engine/event.rs

//! The closed set of observed step outcomes. Events are immutable and
//! accumulate, in emission order, in the tracker for one task run.

use std::fmt;

use crate::engine::ContainerName;
use crate::exec::{ContainerId, NetworkId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    TaskNetworkCreated {
        network: NetworkId,
    },
    ContainerCreated {
        container: ContainerName,
        id: ContainerId,
    },
    ContainerStarted {
        container: ContainerName,
    },
    ContainerBecameHealthy {
        container: ContainerName,
    },
    ContainerBecameUnhealthy {
        container: ContainerName,
        message: String,
    },
    RunningContainerExited {
        container: ContainerName,
        exit_code: i32,
    },
    ContainerStopped {
        container: ContainerName,
    },
    ContainerRemoved {
        container: ContainerName,
    },
    TaskNetworkDeleted,
    /// A step failed, or a dependency never became ready. The first recorded
    /// failure determines the message shown to the user.
    TaskFailed {
        message: String,
    },
    /// The failure message has been shown; suppresses further display steps.
    TaskFailureDisplayed,
    /// Cleanup-step failures. The affected resource is marked un-cleanable so
    /// that cleanup still terminates.
    ContainerStopFailed {
        container: ContainerName,
        message: String,
    },
    ContainerRemovalFailed {
        container: ContainerName,
        message: String,
    },
    TaskNetworkDeletionFailed {
        message: String,
    },
}

impl fmt::Display for TaskEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskEvent::TaskNetworkCreated { network } => {
                write!(f, "task network '{network}' created")
            }
            TaskEvent::ContainerCreated { container, id } => {
                write!(f, "container '{container}' created with id '{id}'")
            }
            TaskEvent::ContainerStarted { container } => {
                write!(f, "container '{container}' started")
            }
            TaskEvent::ContainerBecameHealthy { container } => {
                write!(f, "container '{container}' became healthy")
            }
            TaskEvent::ContainerBecameUnhealthy { container, message } => {
                write!(f, "container '{container}' became unhealthy: {message}")
            }
            TaskEvent::RunningContainerExited {
                container,
                exit_code,
            } => write!(f, "container '{container}' exited with code {exit_code}"),
            TaskEvent::ContainerStopped { container } => {
                write!(f, "container '{container}' stopped")
            }
            TaskEvent::ContainerRemoved { container } => {
                write!(f, "container '{container}' removed")
            }
            TaskEvent::TaskNetworkDeleted => write!(f, "task network deleted"),
            TaskEvent::TaskFailed { message } => write!(f, "task failed: {message}"),
            TaskEvent::TaskFailureDisplayed => write!(f, "task failure displayed"),
            TaskEvent::ContainerStopFailed { container, message } => {
                write!(f, "could not stop container '{container}': {message}")
            }
            TaskEvent::ContainerRemovalFailed { container, message } => {
                write!(f, "could not remove container '{container}': {message}")
            }
            TaskEvent::TaskNetworkDeletionFailed { message } => {
                write!(f, "could not delete task network: {message}")
            }
        }
    }
}
