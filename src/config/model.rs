// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// level_of_parallelism = 2
///
/// [task.build]
/// prerequisites = ["deps"]
/// main = "app"
///
/// [task.build.container.app]
/// image = "golang:1.24"
/// command = "go build ./..."
/// depends_on = ["db"]
///
/// [task.build.container.db]
/// image = "postgres:17"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<name>]`.
    ///
    /// Keys are the task names (e.g. `"build"`, `"test"`).
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// A configuration file that has passed semantic validation.
///
/// Construct via `ConfigFile::try_from(raw)` (see `config::validate`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    /// Construct without validation. Only `config::validate` should call this.
    pub(crate) fn new_unchecked(config: ConfigSection, task: BTreeMap<String, TaskConfig>) -> Self {
        Self { config, task }
    }

    /// Look up a task by name.
    pub fn task(&self, name: &str) -> Option<&TaskConfig> {
        self.task.get(name)
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Maximum number of engine steps to run in parallel when the
    /// `--level-of-parallelism` flag is not given. Must be >= 1.
    #[serde(default = "default_level_of_parallelism")]
    pub level_of_parallelism: usize,
}

fn default_level_of_parallelism() -> usize {
    2
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            level_of_parallelism: default_level_of_parallelism(),
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Tasks that must run (successfully) before this one, in declared order.
    #[serde(default)]
    pub prerequisites: Vec<String>,

    /// Name of the main container; its exit code becomes the task's exit code.
    pub main: String,

    /// All containers from `[task.<name>.container.<cname>]`.
    #[serde(default)]
    pub container: BTreeMap<String, ContainerConfig>,
}

/// `[task.<name>.container.<cname>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerConfig {
    /// Image reference, e.g. `postgres:17`.
    pub image: String,

    /// Optional command override, run via `sh -c`.
    #[serde(default)]
    pub command: Option<String>,

    /// Optional working directory inside the container.
    #[serde(default)]
    pub working_directory: Option<String>,

    /// Environment variables set inside the container.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    /// Volume mounts in `host:container` form.
    #[serde(default)]
    pub volumes: Vec<String>,

    /// Port mappings in `host:container` form.
    #[serde(default)]
    pub ports: Vec<String>,

    /// Containers of the same task that must be started and healthy before
    /// this one starts.
    #[serde(default)]
    pub depends_on: Vec<String>,
}
