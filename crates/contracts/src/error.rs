//! Layered error definitions
//!
//! Categorized by source: config / dispatch / thunk

use thiserror::Error;

/// Boxed error raised from inside a thunk body
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Unified error type
#[derive(Debug, Error)]
pub enum StoreError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Dispatch Errors =====
    /// The reducer refused a plain action
    #[error("action '{action_type}' rejected: {message}")]
    Rejected {
        action_type: String,
        message: String,
    },

    /// Dispatch attempted from inside a running reducer
    #[error("reducers may not dispatch actions (while reducing '{action_type}')")]
    ReducerDispatch { action_type: String },

    /// A thunk reached the base sink without being intercepted
    #[error("thunk '{name}' reached the base sink; add the thunk middleware to the pipeline")]
    UnhandledThunk { name: String },

    // ===== Thunk Errors =====
    /// Failure raised by a thunk body
    #[error("thunk '{name}' failed: {source}")]
    Thunk {
        name: String,
        #[source]
        source: BoxError,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create rejected-action error
    pub fn rejected(action_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            action_type: action_type.into(),
            message: message.into(),
        }
    }

    /// Wrap a failure raised inside a thunk
    pub fn thunk(name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Thunk {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Whether this error came from a thunk body rather than the store
    pub fn is_thunk_failure(&self) -> bool {
        matches!(self, Self::Thunk { .. })
    }
}
