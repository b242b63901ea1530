// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::config::loader::default_config_path;

/// Command-line arguments for `dockrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dockrun",
    version,
    about = "Run declarative containerised tasks.",
    long_about = None
)]
pub struct CliArgs {
    /// The name of the task to run.
    #[arg(value_name = "TASK")]
    pub task: String,

    /// Path to the config file (TOML).
    #[arg(
        long,
        short = 'f',
        value_name = "PATH",
        default_value_t = default_config_path().display().to_string()
    )]
    pub config: String,

    /// Maximum number of operations to run in parallel.
    ///
    /// If omitted, `[config].level_of_parallelism` from the config file is
    /// used.
    #[arg(long, short = 'p', value_name = "N")]
    pub level_of_parallelism: Option<usize>,

    /// If an error occurs, leave created containers and networks running so
    /// that the issue can be investigated.
    #[arg(long)]
    pub no_cleanup_after_failure: bool,

    /// Don't propagate proxy-related environment variables such as
    /// http_proxy and no_proxy to containers.
    #[arg(long)]
    pub no_proxy_vars: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DOCKRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the execution order, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
