// src/exec/mod.rs

//! Container runtime layer.
//!
//! The engine talks to a [`ContainerRuntime`] instead of the `docker` CLI
//! directly. This makes it easy to swap in a fake runtime in tests while
//! keeping the production implementation in [`docker`].
//!
//! - [`backend`] provides the `ContainerRuntime` trait, resource id newtypes
//!   and the health status type.
//! - [`docker`] provides `DockerCliRuntime`, which shells out to the
//!   `docker` CLI via `tokio::process::Command`.

pub mod backend;
pub mod docker;

pub use backend::{ContainerId, ContainerRuntime, HealthStatus, NetworkId, RuntimeFuture};
pub use docker::DockerCliRuntime;
