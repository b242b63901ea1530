// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile, TaskConfig};
use crate::errors::{DockrunError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DockrunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.task))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;

    for (name, task) in cfg.task.iter() {
        validate_task(name, task)?;
    }

    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(DockrunError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.level_of_parallelism == 0 {
        return Err(DockrunError::ConfigError(
            "[config].level_of_parallelism must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_task(name: &str, task: &TaskConfig) -> Result<()> {
    if task.container.is_empty() {
        return Err(DockrunError::ConfigError(format!(
            "task '{}' must define at least one [task.{}.container.<name>] section",
            name, name
        )));
    }

    if !task.container.contains_key(&task.main) {
        return Err(DockrunError::ConfigError(format!(
            "task '{}' names '{}' as its main container, but no such container is defined",
            name, task.main
        )));
    }

    if task.prerequisites.iter().any(|p| p == name) {
        return Err(DockrunError::ConfigError(format!(
            "task '{}' cannot list itself in `prerequisites`",
            name
        )));
    }

    validate_container_dependencies(name, task)?;
    validate_container_graph(name, task)?;

    Ok(())
}

fn validate_container_dependencies(name: &str, task: &TaskConfig) -> Result<()> {
    for (cname, container) in task.container.iter() {
        for dep in container.depends_on.iter() {
            if !task.container.contains_key(dep) {
                return Err(DockrunError::ConfigError(format!(
                    "container '{}' in task '{}' has unknown dependency '{}' in `depends_on`",
                    cname, name, dep
                )));
            }
            if dep == cname {
                return Err(DockrunError::ConfigError(format!(
                    "container '{}' in task '{}' cannot depend on itself in `depends_on`",
                    cname, name
                )));
            }
        }
    }
    Ok(())
}

fn validate_container_graph(name: &str, task: &TaskConfig) -> Result<()> {
    // Build a petgraph graph of the task's containers.
    //
    // Edge direction: dependency -> dependent. For:
    //   [task.T.container.app]
    //   depends_on = ["db"]
    // we add edge db -> app.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for cname in task.container.keys() {
        graph.add_node(cname.as_str());
    }

    for (cname, container) in task.container.iter() {
        for dep in container.depends_on.iter() {
            graph.add_edge(dep.as_str(), cname.as_str(), ());
        }
    }

    // A topological sort will fail if there is a cycle.
    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(DockrunError::ConfigError(format!(
                "cycle detected between containers of task '{}' involving container '{}'",
                name, node
            )))
        }
    }
}
