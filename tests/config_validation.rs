// tests/config_validation.rs

//! Loading and validating `dockrun.toml` files from disk.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use dockrun::config::loader::{load_and_validate, load_from_path};
use dockrun::errors::DockrunError;

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("dockrun.toml");
    fs::write(&path, contents).expect("writing test config");
    path
}

fn config_error(err: DockrunError) -> String {
    match err {
        DockrunError::ConfigError(message) => message,
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn minimal_config_loads_with_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[task.build]
main = "app"

[task.build.container.app]
image = "golang:1.24"
command = "go build ./..."
"#,
    );

    let cfg = load_and_validate(&path).unwrap();

    assert_eq!(cfg.config.level_of_parallelism, 2);

    let task = cfg.task("build").unwrap();
    assert_eq!(task.main, "app");
    assert!(task.prerequisites.is_empty());

    let app = task.container.get("app").unwrap();
    assert_eq!(app.image, "golang:1.24");
    assert_eq!(app.command.as_deref(), Some("go build ./..."));
    assert!(app.depends_on.is_empty());
}

#[test]
fn full_config_round_trips_every_field() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[config]
level_of_parallelism = 4

[task.test]
prerequisites = ["build"]
main = "app"

[task.test.container.app]
image = "golang:1.24"
command = "go test ./..."
working_directory = "/src"
environment = { CGO_ENABLED = "0" }
volumes = [".:/src"]
ports = ["8080:8080"]
depends_on = ["db"]

[task.test.container.db]
image = "postgres:17"

[task.build]
main = "app"

[task.build.container.app]
image = "golang:1.24"
"#,
    );

    let cfg = load_and_validate(&path).unwrap();

    assert_eq!(cfg.config.level_of_parallelism, 4);

    let task = cfg.task("test").unwrap();
    assert_eq!(task.prerequisites, vec!["build"]);

    let app = task.container.get("app").unwrap();
    assert_eq!(app.working_directory.as_deref(), Some("/src"));
    assert_eq!(app.environment.get("CGO_ENABLED").map(String::as_str), Some("0"));
    assert_eq!(app.volumes, vec![".:/src"]);
    assert_eq!(app.ports, vec!["8080:8080"]);
    assert_eq!(app.depends_on, vec!["db"]);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("does-not-exist.toml");

    let err = load_and_validate(&path).unwrap_err();

    assert!(matches!(err, DockrunError::IoError(_)), "got {err:?}");
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[task.build\nmain =");

    let err = load_from_path(&path).unwrap_err();

    assert!(matches!(err, DockrunError::TomlError(_)), "got {err:?}");
}

#[test]
fn empty_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    let message = config_error(load_and_validate(&path).unwrap_err());
    assert!(message.contains("at least one"), "got: {message}");
}

#[test]
fn task_without_containers_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[task.build]
main = "app"
"#,
    );

    let message = config_error(load_and_validate(&path).unwrap_err());
    assert!(message.contains("task 'build'"), "got: {message}");
}

#[test]
fn unknown_main_container_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[task.build]
main = "app"

[task.build.container.db]
image = "postgres:17"
"#,
    );

    let message = config_error(load_and_validate(&path).unwrap_err());
    assert!(
        message.contains("'app'") && message.contains("main container"),
        "got: {message}"
    );
}

#[test]
fn unknown_depends_on_reference_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[task.build]
main = "app"

[task.build.container.app]
image = "golang:1.24"
depends_on = ["db"]
"#,
    );

    let message = config_error(load_and_validate(&path).unwrap_err());
    assert!(
        message.contains("unknown dependency 'db'"),
        "got: {message}"
    );
}

#[test]
fn container_depending_on_itself_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[task.build]
main = "app"

[task.build.container.app]
image = "golang:1.24"
depends_on = ["app"]
"#,
    );

    let message = config_error(load_and_validate(&path).unwrap_err());
    assert!(message.contains("cannot depend on itself"), "got: {message}");
}

#[test]
fn container_dependency_cycles_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[task.build]
main = "app"

[task.build.container.app]
image = "golang:1.24"
depends_on = ["db"]

[task.build.container.db]
image = "postgres:17"
depends_on = ["cache"]

[task.build.container.cache]
image = "redis:7"
depends_on = ["app"]
"#,
    );

    let message = config_error(load_and_validate(&path).unwrap_err());
    assert!(
        message.contains("cycle") && message.contains("task 'build'"),
        "got: {message}"
    );
}

#[test]
fn task_listing_itself_as_prerequisite_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[task.build]
prerequisites = ["build"]
main = "app"

[task.build.container.app]
image = "golang:1.24"
"#,
    );

    let message = config_error(load_and_validate(&path).unwrap_err());
    assert!(message.contains("itself"), "got: {message}");
}

#[test]
fn zero_parallelism_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[config]
level_of_parallelism = 0

[task.build]
main = "app"

[task.build.container.app]
image = "golang:1.24"
"#,
    );

    let message = config_error(load_and_validate(&path).unwrap_err());
    assert!(message.contains("level_of_parallelism"), "got: {message}");
}

#[test]
fn unknown_task_prerequisites_are_not_a_load_error() {
    // Prerequisite resolution is scoped to the requested task at run time;
    // loading must accept references to tasks that are never run.
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[task.build]
prerequisites = ["deps"]
main = "app"

[task.build.container.app]
image = "golang:1.24"
"#,
    );

    assert!(load_and_validate(&path).is_ok());
}
