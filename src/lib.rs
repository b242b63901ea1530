// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod order;
pub mod ui;

use std::sync::Arc;

use tracing::info;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::engine::{
    BehaviourAfterFailure, RunOptions, Task, TaskExecutor,
};
use crate::errors::{DockrunError, Result};
use crate::exec::DockerCliRuntime;
use crate::ui::ConsoleEventLogger;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - execution order resolution
/// - the task executor backed by the docker CLI
///
/// Returns the process exit code: 0 when every task succeeded, otherwise the
/// first failing task's exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = load_and_validate(&args.config)?;

    let tasks = order::resolve_execution_order(&cfg, &args.task)?;

    if args.dry_run {
        print_dry_run(&tasks);
        return Ok(0);
    }

    let level_of_parallelism = args
        .level_of_parallelism
        .unwrap_or(cfg.config.level_of_parallelism);

    if level_of_parallelism == 0 {
        return Err(DockrunError::ConfigError(
            "--level-of-parallelism must be >= 1 (got 0)".to_string(),
        ));
    }

    let options = RunOptions {
        level_of_parallelism,
        behaviour_after_failure: if args.no_cleanup_after_failure {
            BehaviourAfterFailure::DontCleanup
        } else {
            BehaviourAfterFailure::Cleanup
        },
        propagate_proxy_environment_variables: !args.no_proxy_vars,
    };

    let runtime = Arc::new(DockerCliRuntime::new());
    let logger = Arc::new(ConsoleEventLogger);
    let executor = TaskExecutor::new(runtime, logger);

    run_tasks(&executor, tasks, options).await
}

/// Run tasks sequentially in resolver order, stopping at the first task
/// whose exit code is non-zero; that code becomes the overall result.
pub async fn run_tasks(
    executor: &TaskExecutor,
    tasks: Vec<Task>,
    options: RunOptions,
) -> Result<i32> {
    let total = tasks.len();

    for (index, task) in tasks.into_iter().enumerate() {
        info!(task = %task.name, "running task {} of {}", index + 1, total);

        let exit_code = executor.execute(task, options.clone()).await?;

        if exit_code != 0 {
            return Ok(exit_code);
        }

        if index + 1 < total {
            println!();
        }
    }

    Ok(0)
}

/// Simple dry-run output: print the execution order and each task's
/// containers.
fn print_dry_run(tasks: &[Task]) {
    println!("dockrun dry-run");
    println!();

    println!("execution order ({} task(s)):", tasks.len());
    for task in tasks {
        println!("  - {}", task.name);
        println!("      main: {}", task.main_container);
        if !task.prerequisites.is_empty() {
            println!("      prerequisites: {:?}", task.prerequisites);
        }
        for (name, container) in task.containers.iter() {
            println!("      container {name}: image {}", container.image);
            if let Some(command) = &container.command {
                println!("        command: {command}");
            }
            if !container.depends_on.is_empty() {
                println!("        depends_on: {:?}", container.depends_on);
            }
        }
    }
}
