// src/engine/task.rs

//! Engine-facing task and container model, derived from config.

use std::collections::BTreeMap;

use crate::config::model::TaskConfig;
use crate::engine::{ContainerName, TaskName};

/// A named, user-invokable unit of work composed of one or more containers.
///
/// Immutable once built; identity is the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub name: TaskName,
    /// Tasks that must run before this one, in declared order.
    pub prerequisites: Vec<TaskName>,
    /// Name of the container whose exit code determines the task's outcome.
    pub main_container: ContainerName,
    pub containers: BTreeMap<ContainerName, ContainerSpec>,
}

impl Task {
    /// Build an engine task from a validated [`TaskConfig`].
    pub fn from_config(name: &str, cfg: &TaskConfig) -> Self {
        let containers = cfg
            .container
            .iter()
            .map(|(cname, c)| {
                let spec = ContainerSpec {
                    name: cname.clone(),
                    image: c.image.clone(),
                    command: c.command.clone(),
                    working_directory: c.working_directory.clone(),
                    environment: c.environment.clone(),
                    volumes: c.volumes.clone(),
                    ports: c.ports.clone(),
                    depends_on: c.depends_on.clone(),
                };
                (cname.clone(), spec)
            })
            .collect();

        Self {
            name: name.to_string(),
            prerequisites: cfg.prerequisites.clone(),
            main_container: cfg.main.clone(),
            containers,
        }
    }

    /// Whether the given container is this task's main container.
    pub fn is_main(&self, container: &str) -> bool {
        self.main_container == container
    }
}

/// Everything the container runtime needs to create one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: ContainerName,
    pub image: String,
    pub command: Option<String>,
    pub working_directory: Option<String>,
    pub environment: BTreeMap<String, String>,
    pub volumes: Vec<String>,
    pub ports: Vec<String>,
    pub depends_on: Vec<ContainerName>,
}
