// src/exec/backend.rs

//! Pluggable container runtime abstraction.
//!
//! Production code uses [`crate::exec::DockerCliRuntime`]; tests provide
//! their own implementation that records operations and completes them
//! without touching a real container runtime. The engine treats this trait
//! as the only source of truth about runtime outcomes.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::engine::task::ContainerSpec;
use crate::engine::TaskName;

/// Boxed future type returned by all runtime operations.
pub type RuntimeFuture<'a, T> =
    Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>;

/// Identifier of a created network, as reported by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NetworkId(pub String);

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a created container, as reported by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(pub String);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Outcome of waiting for a container's health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// The container reported healthy, or its image defines no health check.
    Healthy,
    /// The container reported unhealthy and will not recover.
    Unhealthy(String),
}

/// Trait abstracting the container runtime operations each step performs.
///
/// All methods take owned arguments so that implementations can move them
/// into the returned future without borrowing engine state across awaits.
pub trait ContainerRuntime: Send + Sync {
    /// Create a network for the given task's containers to share.
    fn create_network(&self, task: TaskName) -> RuntimeFuture<'_, NetworkId>;

    /// Create a container attached to the given network, without starting it.
    fn create_container(
        &self,
        spec: ContainerSpec,
        network: NetworkId,
    ) -> RuntimeFuture<'_, ContainerId>;

    /// Start a previously created container, detached.
    fn start_container(&self, id: ContainerId) -> RuntimeFuture<'_, ()>;

    /// Wait until the container's health check settles.
    fn wait_for_healthy(&self, id: ContainerId) -> RuntimeFuture<'_, HealthStatus>;

    /// Start a previously created container attached, wait for it to exit
    /// and return its exit code.
    fn run_container(&self, id: ContainerId) -> RuntimeFuture<'_, i32>;

    /// Stop a running container.
    fn stop_container(&self, id: ContainerId) -> RuntimeFuture<'_, ()>;

    /// Remove a stopped (or never started) container.
    fn remove_container(&self, id: ContainerId) -> RuntimeFuture<'_, ()>;

    /// Delete a task network. All of its containers must be removed first.
    fn delete_network(&self, id: NetworkId) -> RuntimeFuture<'_, ()>;
}
