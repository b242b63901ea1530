#![allow(dead_code)]

use std::collections::BTreeMap;
use dockrun::config::{ConfigFile, ConfigSection, ContainerConfig, RawConfigFile, TaskConfig};
use dockrun::engine::Task;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_level_of_parallelism(mut self, n: usize) -> Self {
        self.config.config.level_of_parallelism = n;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    /// For validation tests: build without the validity expectation.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    /// `main` is the name of the task's main container; add it (and any
    /// dependency containers) via [`TaskConfigBuilder::with_container`].
    pub fn new(main: &str) -> Self {
        Self {
            task: TaskConfig {
                prerequisites: vec![],
                main: main.to_string(),
                container: BTreeMap::new(),
            },
        }
    }

    pub fn prerequisite(mut self, name: &str) -> Self {
        self.task.prerequisites.push(name.to_string());
        self
    }

    pub fn with_container(mut self, name: &str, container: ContainerConfig) -> Self {
        self.task.container.insert(name.to_string(), container);
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// Builder for `ContainerConfig`.
pub struct ContainerConfigBuilder {
    container: ContainerConfig,
}

impl ContainerConfigBuilder {
    pub fn new(image: &str) -> Self {
        Self {
            container: ContainerConfig {
                image: image.to_string(),
                command: None,
                working_directory: None,
                environment: BTreeMap::new(),
                volumes: vec![],
                ports: vec![],
                depends_on: vec![],
            },
        }
    }

    pub fn command(mut self, cmd: &str) -> Self {
        self.container.command = Some(cmd.to_string());
        self
    }

    pub fn working_directory(mut self, dir: &str) -> Self {
        self.container.working_directory = Some(dir.to_string());
        self
    }

    pub fn environment(mut self, name: &str, value: &str) -> Self {
        self.container
            .environment
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn depends_on(mut self, name: &str) -> Self {
        self.container.depends_on.push(name.to_string());
        self
    }

    pub fn build(self) -> ContainerConfig {
        self.container
    }
}

/// Convenience: a task with a single main container running `image`.
pub fn single_container_task(name: &str, image: &str) -> Task {
    let cfg = TaskConfigBuilder::new("main")
        .with_container("main", ContainerConfigBuilder::new(image).build())
        .build();

    Task::from_config(name, &cfg)
}

/// Convenience: build an engine [`Task`] directly from a `TaskConfig`.
pub fn engine_task(name: &str, cfg: &TaskConfig) -> Task {
    Task::from_config(name, cfg)
}
