// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - [`model`] holds the serde model for the TOML file.
//! - [`loader`] reads and deserializes a config file from disk.
//! - [`validate`] performs semantic validation (container references,
//!   container dependency cycles, global config sanity).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, ConfigSection, ContainerConfig, RawConfigFile, TaskConfig};
