// tests/parallelism.rs

//! The parallelism bound on concurrently dispatched steps.

use std::sync::Arc;
use std::time::Duration;

use dockrun::engine::{RunOptions, Task, TaskExecutor};
use dockrun::ui::QuietEventLogger;
use dockrun_test_utils::builders::{ContainerConfigBuilder, TaskConfigBuilder, engine_task};
use dockrun_test_utils::fake_runtime::FakeRuntime;
use dockrun_test_utils::{init_tracing, with_timeout};

/// `main` depends on five independent dependency containers, so many steps
/// are runnable at once in most rounds.
fn wide_task() -> Task {
    let mut builder = TaskConfigBuilder::new("main");
    let mut main = ContainerConfigBuilder::new("alpine:3");

    for i in 1..=5 {
        let name = format!("c{i}");
        builder = builder.with_container(&name, ContainerConfigBuilder::new("alpine:3").build());
        main = main.depends_on(&name);
    }

    engine_task("wide", &builder.with_container("main", main.build()).build())
}

async fn run_with_parallelism(runtime: Arc<FakeRuntime>, level_of_parallelism: usize) -> i32 {
    init_tracing();

    let executor = TaskExecutor::new(runtime, Arc::new(QuietEventLogger));
    let options = RunOptions {
        level_of_parallelism,
        ..RunOptions::default()
    };

    with_timeout(executor.execute(wide_task(), options))
        .await
        .unwrap()
}

#[tokio::test]
async fn concurrent_steps_never_exceed_the_parallelism_bound() {
    let runtime = Arc::new(FakeRuntime::new().with_operation_delay(Duration::from_millis(20)));

    let code = run_with_parallelism(runtime.clone(), 2).await;

    assert_eq!(code, 0);
    assert!(
        runtime.max_in_flight() <= 2,
        "saw {} operations in flight with a bound of 2",
        runtime.max_in_flight()
    );
}

#[tokio::test]
async fn independent_steps_actually_run_concurrently() {
    let runtime = Arc::new(FakeRuntime::new().with_operation_delay(Duration::from_millis(20)));

    let code = run_with_parallelism(runtime.clone(), 4).await;

    assert_eq!(code, 0);
    assert!(
        runtime.max_in_flight() >= 2,
        "expected concurrent dispatch, max in flight was {}",
        runtime.max_in_flight()
    );
}

#[tokio::test]
async fn parallelism_of_one_serialises_every_step() {
    let runtime = Arc::new(FakeRuntime::new().with_operation_delay(Duration::from_millis(5)));

    let code = run_with_parallelism(runtime.clone(), 1).await;

    assert_eq!(code, 0);
    assert_eq!(runtime.max_in_flight(), 1);
}
