// tests/proxy_environment.rs

//! Propagation of proxy environment variables into containers.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use dockrun::config::ContainerConfig;
use dockrun::engine::{RunOptions, TaskExecutor};
use dockrun::ui::QuietEventLogger;
use dockrun_test_utils::builders::{engine_task, ContainerConfigBuilder, TaskConfigBuilder};
use dockrun_test_utils::fake_runtime::FakeRuntime;
use dockrun_test_utils::{init_tracing, with_timeout};

const PROXY_VARIABLES: [&str; 4] = ["http_proxy", "https_proxy", "ftp_proxy", "no_proxy"];

// The process environment is shared between the tests in this binary, so all
// access goes through one lock, and each test starts from a clean slate.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_guard() -> MutexGuard<'static, ()> {
    let guard = ENV_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    for name in PROXY_VARIABLES {
        remove_env(name);
        remove_env(&name.to_uppercase());
    }

    guard
}

fn set_env(name: &str, value: &str) {
    // SAFETY: every test in this binary that touches the environment holds
    // ENV_LOCK, so no other thread accesses it concurrently.
    unsafe { std::env::set_var(name, value) };
}

fn remove_env(name: &str) {
    // SAFETY: see `set_env`.
    unsafe { std::env::remove_var(name) };
}

/// Run a single-container task and return the environment of the spec the
/// runtime was asked to create.
async fn created_environment(
    container: ContainerConfig,
    options: RunOptions,
) -> BTreeMap<String, String> {
    init_tracing();

    let cfg = TaskConfigBuilder::new("main")
        .with_container("main", container)
        .build();
    let task = engine_task("test", &cfg);

    let runtime = Arc::new(FakeRuntime::new());
    let executor = TaskExecutor::new(runtime.clone(), Arc::new(QuietEventLogger));

    let code = with_timeout(executor.execute(task, options)).await.unwrap();
    assert_eq!(code, 0);

    runtime
        .created_containers()
        .into_iter()
        .find(|spec| spec.name == "main")
        .expect("the main container was created")
        .environment
}

#[tokio::test]
async fn proxy_variables_are_propagated_into_containers() {
    let _guard = env_guard();
    set_env("http_proxy", "http://proxy.local:3128");
    set_env("HTTPS_PROXY", "http://proxy.local:3129");

    let environment = created_environment(
        ContainerConfigBuilder::new("alpine:3").build(),
        RunOptions::default(),
    )
    .await;

    assert_eq!(
        environment.get("http_proxy").map(String::as_str),
        Some("http://proxy.local:3128")
    );
    assert_eq!(
        environment.get("HTTPS_PROXY").map(String::as_str),
        Some("http://proxy.local:3129")
    );
    assert!(
        !environment.contains_key("ftp_proxy"),
        "unset variables must not appear: {environment:?}"
    );
}

#[tokio::test]
async fn explicit_container_settings_are_not_overridden() {
    let _guard = env_guard();
    set_env("HTTP_PROXY", "http://proxy.local:3128");

    let environment = created_environment(
        ContainerConfigBuilder::new("alpine:3")
            .environment("http_proxy", "http://internal:3128")
            .build(),
        RunOptions::default(),
    )
    .await;

    assert_eq!(
        environment.get("http_proxy").map(String::as_str),
        Some("http://internal:3128")
    );
    assert!(
        !environment.contains_key("HTTP_PROXY"),
        "an explicit setting suppresses both casings: {environment:?}"
    );
}

#[tokio::test]
async fn propagation_can_be_disabled() {
    let _guard = env_guard();
    set_env("http_proxy", "http://proxy.local:3128");
    set_env("no_proxy", "localhost");

    let options = RunOptions {
        propagate_proxy_environment_variables: false,
        ..RunOptions::default()
    };

    let environment =
        created_environment(ContainerConfigBuilder::new("alpine:3").build(), options).await;

    assert!(
        environment.is_empty(),
        "nothing is merged when propagation is off: {environment:?}"
    );
}
