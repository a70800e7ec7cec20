//! PipelineConfig - Config Loader output
//!
//! Describes a complete store setup: store identity, middleware chain (outermost
//! first), the services injected as the thunk extra argument, and observability.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PipelineConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Store settings
    #[validate(nested)]
    pub store: StoreConfig,

    /// Middleware chain, outermost first
    #[serde(default)]
    #[validate(nested)]
    pub middleware: Vec<MiddlewareConfig>,

    /// Services handed to every thunk as its extra argument
    #[serde(default)]
    pub extra: ExtraConfig,

    /// Metrics exporter settings
    #[serde(default)]
    pub observability: ObservabilitySettings,
}

impl PipelineConfig {
    /// Whether the chain contains a thunk interceptor
    pub fn has_thunk_middleware(&self) -> bool {
        self.middleware
            .iter()
            .any(|m| m.kind == MiddlewareKind::Thunk)
    }
}

/// Store settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StoreConfig {
    /// Store name (used in logs)
    #[validate(length(min = 1, message = "store name cannot be empty"))]
    pub name: String,

    /// Starting value of the counter slice
    #[serde(default)]
    pub initial_counter: i64,
}

/// One link of the middleware chain
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MiddlewareConfig {
    /// Built-in middleware kind
    pub kind: MiddlewareKind,

    /// Optional display name (defaults to the kind)
    #[serde(default)]
    #[validate(length(min = 1, message = "middleware name cannot be empty"))]
    pub name: Option<String>,

    /// Log level, only meaningful for `logger`
    #[serde(default)]
    pub level: LogLevel,
}

impl MiddlewareConfig {
    /// Name used in logs and reports
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.kind.as_str())
    }
}

/// Built-in middleware kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiddlewareKind {
    /// Intercepts thunks and invokes them
    Thunk,
    /// Logs every dispatched value
    Logger,
}

impl MiddlewareKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thunk => "thunk",
            Self::Logger => "logger",
        }
    }
}

/// Log level for the logger middleware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Settings of the simulated todo service injected as the extra argument
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtraConfig {
    /// Artificial latency per request (ms)
    #[serde(default)]
    pub api_latency_ms: u64,

    /// Make every request fail at the network level
    #[serde(default)]
    pub fail_requests: bool,

    /// Todos the service returns on fetch
    #[serde(default)]
    pub seed_todos: Vec<String>,
}

/// Observability settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilitySettings {
    /// Prometheus exporter port (None = disabled)
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_json_defaults() {
        let json = r#"{
            "store": { "name": "counter" },
            "middleware": [{ "kind": "logger", "level": "debug" }, { "kind": "thunk" }]
        }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.version, ConfigVersion::V1);
        assert_eq!(config.store.initial_counter, 0);
        assert_eq!(config.middleware.len(), 2);
        assert_eq!(config.middleware[0].level, LogLevel::Debug);
        assert_eq!(config.middleware[1].display_name(), "thunk");
        assert!(config.has_thunk_middleware());
        assert!(config.extra.seed_todos.is_empty());
        assert_eq!(config.observability.metrics_port, None);
    }

    #[test]
    fn test_empty_store_name_fails_validation() {
        let json = r#"{ "store": { "name": "" } }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }
}
