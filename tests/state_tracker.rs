// tests/state_tracker.rs

//! Folding event sequences into derived run state.

use std::sync::Arc;

use dockrun::engine::task::Task;
use dockrun::engine::{ContainerLifecycle, NetworkLifecycle, TaskEvent, TaskStateTracker};
use dockrun::errors::DockrunError;
use dockrun::exec::{ContainerId, NetworkId};
use dockrun_test_utils::builders::{
    engine_task, single_container_task, ContainerConfigBuilder, TaskConfigBuilder,
};

fn network_id() -> NetworkId {
    NetworkId("net-1".to_string())
}

fn container_id(name: &str) -> ContainerId {
    ContainerId(format!("{name}-id"))
}

/// A task with a `db` dependency container and a `main` container.
fn two_container_task() -> Task {
    let cfg = TaskConfigBuilder::new("main")
        .with_container("db", ContainerConfigBuilder::new("postgres:15").build())
        .with_container(
            "main",
            ContainerConfigBuilder::new("alpine:3").depends_on("db").build(),
        )
        .build();

    engine_task("test", &cfg)
}

fn tracker(task: Task) -> TaskStateTracker {
    TaskStateTracker::new(Arc::new(task))
}

fn created(container: &str) -> TaskEvent {
    TaskEvent::ContainerCreated {
        container: container.to_string(),
        id: container_id(container),
    }
}

#[test]
fn fresh_tracker_has_nothing_created() {
    let tracker = tracker(single_container_task("test", "alpine:3"));

    assert_eq!(*tracker.network(), NetworkLifecycle::NotCreated);
    assert_eq!(
        tracker.lifecycle_of("main"),
        Some(ContainerLifecycle::NotCreated)
    );
    assert!(!tracker.cleanup_mode());
    assert!(tracker.events().is_empty());
    assert_eq!(tracker.main_exit_code(), None);
}

#[test]
fn container_lifecycle_progresses_through_events() {
    let mut tracker = tracker(two_container_task());

    tracker
        .append(TaskEvent::TaskNetworkCreated {
            network: network_id(),
        })
        .unwrap();
    assert_eq!(*tracker.network(), NetworkLifecycle::Created(network_id()));

    tracker.append(created("db")).unwrap();
    assert_eq!(tracker.lifecycle_of("db"), Some(ContainerLifecycle::Created));
    assert_eq!(tracker.id_of("db"), Some(&container_id("db")));

    tracker
        .append(TaskEvent::ContainerStarted {
            container: "db".to_string(),
        })
        .unwrap();
    assert_eq!(tracker.lifecycle_of("db"), Some(ContainerLifecycle::Started));

    tracker
        .append(TaskEvent::ContainerBecameHealthy {
            container: "db".to_string(),
        })
        .unwrap();
    assert_eq!(tracker.lifecycle_of("db"), Some(ContainerLifecycle::Healthy));

    assert!(!tracker.cleanup_mode());
}

#[test]
fn successful_main_exit_does_not_enter_cleanup_mode() {
    let mut tracker = tracker(single_container_task("test", "alpine:3"));

    tracker
        .append(TaskEvent::TaskNetworkCreated {
            network: network_id(),
        })
        .unwrap();
    tracker.append(created("main")).unwrap();
    tracker
        .append(TaskEvent::RunningContainerExited {
            container: "main".to_string(),
            exit_code: 0,
        })
        .unwrap();

    assert_eq!(tracker.main_exit_code(), Some(0));
    assert!(!tracker.cleanup_mode());
    assert_eq!(tracker.first_failure(), None);
}

#[test]
fn non_zero_main_exit_records_a_failure() {
    let mut tracker = tracker(single_container_task("test", "alpine:3"));

    tracker
        .append(TaskEvent::TaskNetworkCreated {
            network: network_id(),
        })
        .unwrap();
    tracker.append(created("main")).unwrap();
    tracker
        .append(TaskEvent::RunningContainerExited {
            container: "main".to_string(),
            exit_code: 3,
        })
        .unwrap();

    assert_eq!(tracker.main_exit_code(), Some(3));
    assert!(tracker.cleanup_mode());
    assert_eq!(
        tracker.first_failure(),
        Some("The main container 'main' exited with code 3.")
    );
}

#[test]
fn first_failure_wins() {
    let mut tracker = tracker(two_container_task());

    tracker
        .append(TaskEvent::TaskFailed {
            message: "first".to_string(),
        })
        .unwrap();
    tracker
        .append(TaskEvent::TaskFailed {
            message: "second".to_string(),
        })
        .unwrap();

    assert_eq!(tracker.first_failure(), Some("first"));
    assert_eq!(tracker.events().len(), 2, "both failures stay in the log");
}

#[test]
fn unhealthy_container_stays_started_and_records_a_failure() {
    let mut tracker = tracker(two_container_task());

    tracker
        .append(TaskEvent::TaskNetworkCreated {
            network: network_id(),
        })
        .unwrap();
    tracker.append(created("db")).unwrap();
    tracker
        .append(TaskEvent::ContainerStarted {
            container: "db".to_string(),
        })
        .unwrap();
    tracker
        .append(TaskEvent::ContainerBecameUnhealthy {
            container: "db".to_string(),
            message: "health check failed".to_string(),
        })
        .unwrap();

    // Still Started so that cleanup proposes a stop for it.
    assert_eq!(tracker.lifecycle_of("db"), Some(ContainerLifecycle::Started));
    assert!(tracker.cleanup_mode());
    assert_eq!(
        tracker.first_failure(),
        Some("Container 'db' did not become healthy: health check failed")
    );
}

#[test]
fn creation_order_is_recorded() {
    let mut tracker = tracker(two_container_task());

    tracker
        .append(TaskEvent::TaskNetworkCreated {
            network: network_id(),
        })
        .unwrap();
    tracker.append(created("main")).unwrap();
    tracker.append(created("db")).unwrap();

    assert_eq!(tracker.creation_order(), &["main", "db"]);
}

#[test]
fn out_of_order_start_is_rejected() {
    let mut tracker = tracker(single_container_task("test", "alpine:3"));

    let err = tracker
        .append(TaskEvent::ContainerStarted {
            container: "main".to_string(),
        })
        .unwrap_err();

    assert!(matches!(err, DockrunError::InternalInconsistency(_)));
    assert!(
        tracker.events().is_empty(),
        "a rejected event must not be recorded"
    );
}

#[test]
fn duplicate_network_creation_is_rejected() {
    let mut tracker = tracker(single_container_task("test", "alpine:3"));

    tracker
        .append(TaskEvent::TaskNetworkCreated {
            network: network_id(),
        })
        .unwrap();

    let err = tracker
        .append(TaskEvent::TaskNetworkCreated {
            network: network_id(),
        })
        .unwrap_err();

    assert!(matches!(err, DockrunError::InternalInconsistency(_)));
}

#[test]
fn event_for_unknown_container_is_rejected() {
    let mut tracker = tracker(single_container_task("test", "alpine:3"));

    let err = tracker.append(created("nonexistent")).unwrap_err();

    assert!(matches!(err, DockrunError::InternalInconsistency(_)));
}

#[test]
fn failure_display_requires_a_recorded_failure() {
    let mut tracker = tracker(single_container_task("test", "alpine:3"));

    let err = tracker.append(TaskEvent::TaskFailureDisplayed).unwrap_err();
    assert!(matches!(err, DockrunError::InternalInconsistency(_)));

    tracker
        .append(TaskEvent::TaskFailed {
            message: "boom".to_string(),
        })
        .unwrap();
    tracker.append(TaskEvent::TaskFailureDisplayed).unwrap();
    assert!(tracker.failure_displayed());

    // Displaying twice is a defect.
    let err = tracker.append(TaskEvent::TaskFailureDisplayed).unwrap_err();
    assert!(matches!(err, DockrunError::InternalInconsistency(_)));
}

#[test]
fn failed_cleanup_steps_mark_resources_as_given_up() {
    let mut tracker = tracker(two_container_task());

    tracker
        .append(TaskEvent::TaskNetworkCreated {
            network: network_id(),
        })
        .unwrap();
    tracker.append(created("db")).unwrap();
    tracker
        .append(TaskEvent::ContainerStarted {
            container: "db".to_string(),
        })
        .unwrap();
    tracker
        .append(TaskEvent::TaskFailed {
            message: "boom".to_string(),
        })
        .unwrap();

    tracker
        .append(TaskEvent::ContainerStopFailed {
            container: "db".to_string(),
            message: "daemon unreachable".to_string(),
        })
        .unwrap();
    assert_eq!(
        tracker.lifecycle_of("db"),
        Some(ContainerLifecycle::CleanupFailed)
    );

    tracker
        .append(TaskEvent::TaskNetworkDeletionFailed {
            message: "network busy".to_string(),
        })
        .unwrap();
    assert_eq!(*tracker.network(), NetworkLifecycle::DeletionFailed);
}

#[test]
fn replaying_the_same_events_yields_the_same_state() {
    let events = vec![
        TaskEvent::TaskNetworkCreated {
            network: network_id(),
        },
        created("db"),
        created("main"),
        TaskEvent::ContainerStarted {
            container: "db".to_string(),
        },
        TaskEvent::ContainerBecameHealthy {
            container: "db".to_string(),
        },
        TaskEvent::RunningContainerExited {
            container: "main".to_string(),
            exit_code: 0,
        },
    ];

    let mut first = tracker(two_container_task());
    let mut second = tracker(two_container_task());

    for event in &events {
        first.append(event.clone()).unwrap();
        second.append(event.clone()).unwrap();
    }

    assert_eq!(first.events(), second.events());
    assert_eq!(first.network(), second.network());
    assert_eq!(first.lifecycle_of("db"), second.lifecycle_of("db"));
    assert_eq!(first.lifecycle_of("main"), second.lifecycle_of("main"));
    assert_eq!(first.main_exit_code(), second.main_exit_code());
}
