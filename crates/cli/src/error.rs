//! Error types for CLI operations.

use contracts::StoreError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Script file not found
    #[error("Script file not found: {path}")]
    ScriptNotFound { path: String },

    /// Script parsing error
    #[error("Failed to parse script: {message}")]
    ScriptParse { message: String },

    /// A script step failed and the run was stopped
    #[error("Step {index} ({step}) failed: {source}")]
    StepFailed {
        index: usize,
        step: String,
        #[source]
        source: StoreError,
    },

    /// The run did not finish in time
    #[error("Script did not finish within {secs}s")]
    Timeout { secs: u64 },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn script_not_found(path: impl Into<String>) -> Self {
        Self::ScriptNotFound { path: path.into() }
    }

    pub fn script_parse(message: impl Into<String>) -> Self {
        Self::ScriptParse {
            message: message.into(),
        }
    }

    pub fn step_failed(index: usize, step: impl Into<String>, source: StoreError) -> Self {
        Self::StepFailed {
            index,
            step: step.into(),
            source,
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
