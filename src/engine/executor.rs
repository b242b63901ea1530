// src/engine/executor.rs

//! The scheduler: drives one task run to completion.
//!
//! Loop: propose runnable steps, dispatch up to `level_of_parallelism` of
//! them concurrently, await all of them, fold the resulting events into the
//! tracker in submission order, repeat. The full round barrier means a
//! dispatched step's event is always folded before the next proposal, so the
//! catalog never sees a step it already issued.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::engine::catalog::propose_runnable_steps;
use crate::engine::event::TaskEvent;
use crate::engine::state::TaskStateTracker;
use crate::engine::step::Step;
use crate::engine::task::Task;
use crate::engine::{RunOptions, TASK_DID_NOT_RUN_EXIT_CODE};
use crate::errors::{DockrunError, Result};
use crate::exec::{ContainerRuntime, HealthStatus};
use crate::ui::EventLogger;

/// Executes one task at a time against a container runtime, reporting
/// progress to an observer.
pub struct TaskExecutor {
    runtime: Arc<dyn ContainerRuntime>,
    logger: Arc<dyn EventLogger>,
}

impl TaskExecutor {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, logger: Arc<dyn EventLogger>) -> Self {
        Self { runtime, logger }
    }

    /// Run the given task to its terminal outcome and return its exit code.
    ///
    /// Returns the main container's exit code, or
    /// [`TASK_DID_NOT_RUN_EXIT_CODE`] if the task failed before the main
    /// container ran. Errors only on internal inconsistencies (deadlocked
    /// proposal, out-of-order events); runtime failures are absorbed into
    /// cleanup mode and reflected in the exit code instead.
    pub async fn execute(&self, task: Task, options: RunOptions) -> Result<i32> {
        info!(task = %task.name, "starting task run");

        let task = Arc::new(task);
        // Per-run scope: dropped when this function returns, success or not.
        let mut tracker = TaskStateTracker::new(Arc::clone(&task));

        loop {
            let steps = propose_runnable_steps(&tracker, &options);

            if steps.is_empty() {
                return self.final_outcome(&tracker);
            }

            let batch: Vec<Step> = steps
                .into_iter()
                .take(options.level_of_parallelism)
                .collect();

            debug!(task = %task.name, steps = batch.len(), "dispatching scheduling round");

            let mut handles = Vec::with_capacity(batch.len());

            for step in batch {
                self.logger.on_step_starting(&step);

                handles.push(tokio::spawn(execute_step(
                    Arc::clone(&self.runtime),
                    Arc::clone(&self.logger),
                    Arc::clone(&task),
                    options.propagate_proxy_environment_variables,
                    step,
                )));
            }

            // Fold in submission order, one event at a time: concurrent step
            // completions never interleave from the catalog's perspective.
            for handle in handles {
                let event = handle.await.map_err(|e| {
                    DockrunError::InternalInconsistency(format!(
                        "step execution panicked or was aborted: {e}"
                    ))
                })??;

                self.logger.on_event(&event);
                tracker.append(event)?;
            }
        }
    }

    fn final_outcome(&self, tracker: &TaskStateTracker) -> Result<i32> {
        if let Some(code) = tracker.main_exit_code() {
            if code == 0 && !tracker.cleanup_mode() {
                info!(task = %tracker.task().name, "task succeeded");
                return Ok(0);
            }

            // The main container ran, so its exit code is the task's exit
            // code. If it exited 0 but a concurrent sibling failure triggered
            // cleanup, the task must still report a non-zero code.
            let code = if code == 0 { TASK_DID_NOT_RUN_EXIT_CODE } else { code };
            warn!(task = %tracker.task().name, exit_code = code, "task failed");
            return Ok(code);
        }

        if tracker.cleanup_mode() {
            warn!(
                task = %tracker.task().name,
                "task failed before the main container ran"
            );
            return Ok(TASK_DID_NOT_RUN_EXIT_CODE);
        }

        Err(DockrunError::InternalInconsistency(format!(
            "no steps are runnable for task '{}' but its outcome is undetermined",
            tracker.task().name
        )))
    }
}

/// Execute one step against the runtime and translate the result into an
/// event.
///
/// Runtime errors become failure events (forward steps) or gave-up events
/// (cleanup steps) rather than aborting the run; only defects (a step
/// referring to a container the task does not have) surface as errors.
async fn execute_step(
    runtime: Arc<dyn ContainerRuntime>,
    logger: Arc<dyn EventLogger>,
    task: Arc<Task>,
    propagate_proxy_environment_variables: bool,
    step: Step,
) -> Result<TaskEvent> {
    match step {
        Step::CreateTaskNetwork => Ok(match runtime.create_network(task.name.clone()).await {
            Ok(network) => TaskEvent::TaskNetworkCreated { network },
            Err(e) => TaskEvent::TaskFailed {
                message: format!("Could not create task network: {e:#}"),
            },
        }),

        Step::CreateContainer { container, network } => {
            let mut spec = match task.containers.get(&container) {
                Some(spec) => spec.clone(),
                None => return Err(unknown_container(&task, &container)),
            };

            if propagate_proxy_environment_variables {
                merge_proxy_environment(&mut spec.environment);
            }

            Ok(match runtime.create_container(spec, network).await {
                Ok(id) => TaskEvent::ContainerCreated { container, id },
                Err(e) => TaskEvent::TaskFailed {
                    message: format!("Could not create container '{container}': {e:#}"),
                },
            })
        }

        Step::StartContainer { container, id } => {
            Ok(match runtime.start_container(id).await {
                Ok(()) => TaskEvent::ContainerStarted { container },
                Err(e) => TaskEvent::TaskFailed {
                    message: format!("Could not start container '{container}': {e:#}"),
                },
            })
        }

        Step::WaitForContainerToBecomeHealthy { container, id } => {
            Ok(match runtime.wait_for_healthy(id).await {
                Ok(HealthStatus::Healthy) => TaskEvent::ContainerBecameHealthy { container },
                Ok(HealthStatus::Unhealthy(message)) => {
                    TaskEvent::ContainerBecameUnhealthy { container, message }
                }
                Err(e) => TaskEvent::TaskFailed {
                    message: format!(
                        "Could not determine the health of container '{container}': {e:#}"
                    ),
                },
            })
        }

        Step::RunContainer { container, id } => Ok(match runtime.run_container(id).await {
            Ok(exit_code) => TaskEvent::RunningContainerExited {
                container,
                exit_code,
            },
            Err(e) => TaskEvent::TaskFailed {
                message: format!("Could not run container '{container}': {e:#}"),
            },
        }),

        Step::StopContainer { container, id } => Ok(match runtime.stop_container(id).await {
            Ok(()) => TaskEvent::ContainerStopped { container },
            Err(e) => TaskEvent::ContainerStopFailed {
                container,
                message: format!("{e:#}"),
            },
        }),

        Step::RemoveContainer { container, id } => {
            Ok(match runtime.remove_container(id).await {
                Ok(()) => TaskEvent::ContainerRemoved { container },
                Err(e) => TaskEvent::ContainerRemovalFailed {
                    container,
                    message: format!("{e:#}"),
                },
            })
        }

        Step::DeleteTaskNetwork { network } => Ok(match runtime.delete_network(network).await {
            Ok(()) => TaskEvent::TaskNetworkDeleted,
            Err(e) => TaskEvent::TaskNetworkDeletionFailed {
                message: format!("{e:#}"),
            },
        }),

        Step::DisplayTaskFailure { message } => {
            logger.on_task_failure(&message);
            Ok(TaskEvent::TaskFailureDisplayed)
        }
    }
}

fn unknown_container(task: &Task, container: &str) -> DockrunError {
    DockrunError::InternalInconsistency(format!(
        "step refers to container '{container}', which is not part of task '{}'",
        task.name
    ))
}

const PROXY_VARIABLES: [&str; 4] = ["http_proxy", "https_proxy", "ftp_proxy", "no_proxy"];

/// Copy proxy-related variables from the process environment into a
/// container's environment, without overriding explicit settings. An
/// explicitly configured variable suppresses both casings, so the process
/// environment cannot shadow it for tools that prefer the other form.
fn merge_proxy_environment(environment: &mut BTreeMap<String, String>) {
    for name in PROXY_VARIABLES {
        let upper = name.to_uppercase();

        if environment.contains_key(name) || environment.contains_key(&upper) {
            continue;
        }

        for candidate in [name.to_string(), upper] {
            if let Ok(value) = std::env::var(&candidate) {
                environment.entry(candidate).or_insert(value);
            }
        }
    }
}
