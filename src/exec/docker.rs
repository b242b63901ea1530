// src/exec/docker.rs

//! Container runtime implementation backed by the `docker` CLI.
//!
//! Every operation shells out via `tokio::process::Command`. The main
//! container is run with `docker start --attach` and inherited stdio so that
//! task output goes straight to the user's terminal.

use std::process::Stdio;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tracing::debug;

use crate::engine::task::ContainerSpec;
use crate::engine::TaskName;
use crate::exec::backend::{
    ContainerId, ContainerRuntime, HealthStatus, NetworkId, RuntimeFuture,
};

const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Default)]
pub struct DockerCliRuntime;

impl DockerCliRuntime {
    pub fn new() -> Self {
        Self
    }
}

impl ContainerRuntime for DockerCliRuntime {
    fn create_network(&self, task: TaskName) -> RuntimeFuture<'_, NetworkId> {
        Box::pin(async move {
            let name = network_name(&task);
            let id = docker_output(vec!["network".into(), "create".into(), name]).await?;
            Ok(NetworkId(id))
        })
    }

    fn create_container(
        &self,
        spec: ContainerSpec,
        network: NetworkId,
    ) -> RuntimeFuture<'_, ContainerId> {
        Box::pin(async move {
            let mut args: Vec<String> = vec![
                "create".into(),
                "--network".into(),
                network.0,
                "--network-alias".into(),
                spec.name.clone(),
            ];

            if let Some(dir) = &spec.working_directory {
                args.push("--workdir".into());
                args.push(dir.clone());
            }

            for (name, value) in spec.environment.iter() {
                args.push("--env".into());
                args.push(format!("{name}={value}"));
            }

            for volume in spec.volumes.iter() {
                args.push("--volume".into());
                args.push(volume.clone());
            }

            for port in spec.ports.iter() {
                args.push("--publish".into());
                args.push(port.clone());
            }

            args.push(spec.image.clone());

            if let Some(command) = &spec.command {
                args.push("sh".into());
                args.push("-c".into());
                args.push(command.clone());
            }

            let id = docker_output(args).await?;
            Ok(ContainerId(id))
        })
    }

    fn start_container(&self, id: ContainerId) -> RuntimeFuture<'_, ()> {
        Box::pin(async move {
            docker_output(vec!["start".into(), id.0]).await?;
            Ok(())
        })
    }

    fn wait_for_healthy(&self, id: ContainerId) -> RuntimeFuture<'_, HealthStatus> {
        Box::pin(async move {
            loop {
                let status = docker_output(vec![
                    "inspect".into(),
                    "--format".into(),
                    "{{if .State.Health}}{{.State.Health.Status}}{{else}}none{{end}}".into(),
                    id.0.clone(),
                ])
                .await?;

                match status.as_str() {
                    // No health check defined: treat the container as ready.
                    "none" | "healthy" => return Ok(HealthStatus::Healthy),
                    "unhealthy" => {
                        return Ok(HealthStatus::Unhealthy(
                            "the container's health check reported unhealthy".to_string(),
                        ));
                    }
                    "starting" => {
                        debug!(container = %id.0, "health check still starting");
                        tokio::time::sleep(HEALTH_POLL_INTERVAL).await;
                    }
                    other => bail!("unexpected health status '{other}' for container '{}'", id.0),
                }
            }
        })
    }

    fn run_container(&self, id: ContainerId) -> RuntimeFuture<'_, i32> {
        Box::pin(async move {
            // Attach so that the task's output and exit code flow through.
            let status = Command::new("docker")
                .args(["start", "--attach", "--interactive", &id.0])
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .await
                .with_context(|| format!("running container '{}'", id.0))?;

            Ok(status.code().unwrap_or(-1))
        })
    }

    fn stop_container(&self, id: ContainerId) -> RuntimeFuture<'_, ()> {
        Box::pin(async move {
            docker_output(vec!["stop".into(), id.0]).await?;
            Ok(())
        })
    }

    fn remove_container(&self, id: ContainerId) -> RuntimeFuture<'_, ()> {
        Box::pin(async move {
            docker_output(vec!["rm".into(), "--volumes".into(), id.0]).await?;
            Ok(())
        })
    }

    fn delete_network(&self, id: NetworkId) -> RuntimeFuture<'_, ()> {
        Box::pin(async move {
            docker_output(vec!["network".into(), "rm".into(), id.0]).await?;
            Ok(())
        })
    }
}

/// Per-run unique network name so concurrent invocations don't collide.
fn network_name(task: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    format!("dockrun-{task}-{nanos}")
}

/// Run a `docker` command, returning trimmed stdout or a contextual error
/// including the CLI's stderr.
async fn docker_output(args: Vec<String>) -> Result<String> {
    debug!(?args, "running docker command");

    let output = Command::new("docker")
        .args(&args)
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("spawning 'docker {}'", args.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "'docker {}' failed with {}: {}",
            args.join(" "),
            output.status,
            stderr.trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
