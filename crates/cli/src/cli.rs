//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// thunkctl - drive a middleware dispatch pipeline from a script
#[derive(Parser, Debug)]
#[command(
    name = "thunkctl",
    author,
    version,
    about = "Middleware dispatch pipeline demo driver",
    long_about = "Builds a counter/todo store with the middleware chain described in a \n\
                  pipeline configuration, then runs a JSON script of plain actions and \n\
                  thunks through it and reports the final state and dispatch metrics."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "THUNKCTL_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "THUNKCTL_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a script through the configured pipeline
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "pipeline.toml",
        env = "THUNKCTL_CONFIG"
    )]
    pub config: PathBuf,

    /// Path to the JSON step script
    #[arg(short, long, env = "THUNKCTL_SCRIPT")]
    pub script: PathBuf,

    /// Override the Prometheus exporter port from configuration
    #[arg(long, env = "THUNKCTL_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Stop at the first failing step
    #[arg(long)]
    pub fail_fast: bool,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "THUNKCTL_TIMEOUT")]
    pub timeout: u64,

    /// Load configuration and script, print the plan and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "pipeline.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "pipeline.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show todo service settings
    #[arg(long)]
    pub extra: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
