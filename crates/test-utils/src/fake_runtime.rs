//! A controllable in-memory container runtime for tests.
//!
//! Records every operation it is asked to perform, tracks how many
//! operations are in flight at once (for parallelism-bound assertions), and
//! can be configured to fail specific operations, report containers as
//! unhealthy, or return non-zero exit codes for the main container.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::bail;

use dockrun::engine::task::ContainerSpec;
use dockrun::engine::TaskName;
use dockrun::exec::{ContainerId, ContainerRuntime, HealthStatus, NetworkId, RuntimeFuture};

#[derive(Debug, Default)]
struct Gauge {
    in_flight: usize,
    max_in_flight: usize,
}

#[derive(Debug, Default)]
struct Inner {
    calls: Vec<String>,
    /// Full specs passed to `create_container`, in completion order.
    created: Vec<ContainerSpec>,
    gauge: Gauge,
}

/// Fake [`ContainerRuntime`] that completes every operation in memory.
#[derive(Debug, Default)]
pub struct FakeRuntime {
    inner: Arc<Mutex<Inner>>,
    /// Exit codes for `run_container`, keyed by container name; missing
    /// entries exit 0.
    exit_codes: HashMap<String, i32>,
    /// Containers whose health check reports unhealthy.
    unhealthy: HashSet<String>,
    /// Operations that fail, keyed like the recorded calls
    /// (e.g. `"create-container db"`, `"create-network"`).
    failing_operations: HashSet<String>,
    /// Optional artificial latency per operation, to make concurrency
    /// observable.
    operation_delay: Option<Duration>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exit_code(mut self, container: &str, code: i32) -> Self {
        self.exit_codes.insert(container.to_string(), code);
        self
    }

    pub fn with_unhealthy_container(mut self, container: &str) -> Self {
        self.unhealthy.insert(container.to_string());
        self
    }

    pub fn with_failing_operation(mut self, operation: &str) -> Self {
        self.failing_operations.insert(operation.to_string());
        self
    }

    pub fn with_operation_delay(mut self, delay: Duration) -> Self {
        self.operation_delay = Some(delay);
        self
    }

    /// All operations performed so far, in completion order.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Highest number of operations that were ever in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.inner.lock().unwrap().gauge.max_in_flight
    }

    /// The container specs handed to `create_container`, in completion order.
    /// Includes everything the engine resolved into the spec, such as merged
    /// environment variables.
    pub fn created_containers(&self) -> Vec<ContainerSpec> {
        self.inner.lock().unwrap().created.clone()
    }

    fn operation(
        &self,
        key: String,
    ) -> (Arc<Mutex<Inner>>, Option<Duration>, bool) {
        let fails = self.failing_operations.contains(&key);
        (Arc::clone(&self.inner), self.operation_delay, fails)
    }
}

/// RAII-ish concurrency tracking around one fake operation.
async fn perform(
    inner: Arc<Mutex<Inner>>,
    delay: Option<Duration>,
    key: String,
    fails: bool,
) -> anyhow::Result<()> {
    {
        let mut guard = inner.lock().unwrap();
        guard.gauge.in_flight += 1;
        guard.gauge.max_in_flight = guard.gauge.max_in_flight.max(guard.gauge.in_flight);
    }

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    {
        let mut guard = inner.lock().unwrap();
        guard.gauge.in_flight -= 1;
        guard.calls.push(key.clone());
    }

    if fails {
        bail!("simulated failure of '{key}'");
    }

    Ok(())
}

impl ContainerRuntime for FakeRuntime {
    fn create_network(&self, _task: TaskName) -> RuntimeFuture<'_, NetworkId> {
        let (inner, delay, fails) = self.operation("create-network".to_string());

        Box::pin(async move {
            perform(inner, delay, "create-network".to_string(), fails).await?;
            Ok(NetworkId("fake-network".to_string()))
        })
    }

    fn create_container(
        &self,
        spec: ContainerSpec,
        _network: NetworkId,
    ) -> RuntimeFuture<'_, ContainerId> {
        let key = format!("create-container {}", spec.name);
        let (inner, delay, fails) = self.operation(key.clone());

        Box::pin(async move {
            perform(inner.clone(), delay, key, fails).await?;

            let id = ContainerId(format!("{}-id", spec.name));
            inner.lock().unwrap().created.push(spec);
            Ok(id)
        })
    }

    fn start_container(&self, id: ContainerId) -> RuntimeFuture<'_, ()> {
        let key = format!("start-container {}", container_of(&id));
        let (inner, delay, fails) = self.operation(key.clone());

        Box::pin(async move { perform(inner, delay, key, fails).await })
    }

    fn wait_for_healthy(&self, id: ContainerId) -> RuntimeFuture<'_, HealthStatus> {
        let container = container_of(&id);
        let key = format!("wait-for-healthy {container}");
        let (inner, delay, fails) = self.operation(key.clone());
        let unhealthy = self.unhealthy.contains(&container);

        Box::pin(async move {
            perform(inner, delay, key, fails).await?;

            if unhealthy {
                Ok(HealthStatus::Unhealthy(
                    "simulated unhealthy container".to_string(),
                ))
            } else {
                Ok(HealthStatus::Healthy)
            }
        })
    }

    fn run_container(&self, id: ContainerId) -> RuntimeFuture<'_, i32> {
        let container = container_of(&id);
        let key = format!("run-container {container}");
        let (inner, delay, fails) = self.operation(key.clone());
        let exit_code = self.exit_codes.get(&container).copied().unwrap_or(0);

        Box::pin(async move {
            perform(inner, delay, key, fails).await?;
            Ok(exit_code)
        })
    }

    fn stop_container(&self, id: ContainerId) -> RuntimeFuture<'_, ()> {
        let key = format!("stop-container {}", container_of(&id));
        let (inner, delay, fails) = self.operation(key.clone());

        Box::pin(async move { perform(inner, delay, key, fails).await })
    }

    fn remove_container(&self, id: ContainerId) -> RuntimeFuture<'_, ()> {
        let key = format!("remove-container {}", container_of(&id));
        let (inner, delay, fails) = self.operation(key.clone());

        Box::pin(async move { perform(inner, delay, key, fails).await })
    }

    fn delete_network(&self, _id: NetworkId) -> RuntimeFuture<'_, ()> {
        let (inner, delay, fails) = self.operation("delete-network".to_string());

        Box::pin(async move { perform(inner, delay, "delete-network".to_string(), fails).await })
    }
}

/// Container ids issued by the fake are always `<name>-id`.
fn container_of(id: &ContainerId) -> String {
    id.0.strip_suffix("-id").unwrap_or(&id.0).to_string()
}
