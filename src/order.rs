// src/order.rs

//! Task execution order resolution.
//!
//! Turns a requested task name into the dependency-respecting sequence of
//! tasks to run: a depth-first post-order walk over `prerequisites`, with a
//! "currently visiting" path for cycle detection and memoization so each
//! task appears exactly once. Runs before any container operation; no side
//! effects.

use std::collections::HashSet;

use tracing::debug;

use crate::config::model::ConfigFile;
use crate::engine::task::Task;
use crate::engine::TaskName;
use crate::errors::{DockrunError, Result};

/// Resolve the ordered list of tasks to execute for the requested task.
///
/// Every task precedes all tasks that (directly or transitively) depend on
/// it, each required task appears exactly once, and sibling prerequisites
/// keep their declared order, so the output is deterministic for a given
/// configuration.
pub fn resolve_execution_order(config: &ConfigFile, requested: &str) -> Result<Vec<Task>> {
    let mut resolved = Vec::new();
    let mut done: HashSet<TaskName> = HashSet::new();
    let mut visiting: Vec<TaskName> = Vec::new();

    visit(config, requested, &mut visiting, &mut done, &mut resolved)?;

    debug!(
        requested,
        order = ?resolved.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
        "resolved task execution order"
    );

    Ok(resolved)
}

fn visit(
    config: &ConfigFile,
    name: &str,
    visiting: &mut Vec<TaskName>,
    done: &mut HashSet<TaskName>,
    resolved: &mut Vec<Task>,
) -> Result<()> {
    if done.contains(name) {
        return Ok(());
    }

    if let Some(position) = visiting.iter().position(|n| n == name) {
        let mut cycle: Vec<&str> = visiting[position..].iter().map(|n| n.as_str()).collect();
        cycle.push(name);
        return Err(DockrunError::DependencyCycle(cycle.join(" -> ")));
    }

    let spec = config
        .task(name)
        .ok_or_else(|| DockrunError::TaskNotFound(name.to_string()))?;

    visiting.push(name.to_string());

    for prerequisite in spec.prerequisites.iter() {
        visit(config, prerequisite, visiting, done, resolved)?;
    }

    visiting.pop();
    done.insert(name.to_string());
    resolved.push(Task::from_config(name, spec));

    Ok(())
}
