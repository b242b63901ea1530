// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DockrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("The task '{0}' does not exist")]
    TaskNotFound(String),

    #[error("There is a dependency cycle between tasks: {0}")]
    DependencyCycle(String),

    /// A defect in the engine rather than an environment problem: the step
    /// catalog proposed nothing while the task outcome was undetermined, or
    /// the state tracker observed an out-of-order event.
    #[error("Internal error: {0}")]
    InternalInconsistency(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DockrunError>;
