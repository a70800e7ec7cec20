//! Configuration validation
//!
//! Rules:
//! - field-level constraints declared on the config types (`validator` derive)
//! - at most one thunk interceptor in the chain
//! - middleware names unique
//! - todo service settings require a thunk interceptor to reach them
//! - metrics port non-zero

use std::collections::HashSet;

use contracts::{MiddlewareKind, PipelineConfig, StoreError};
use ::validator::Validate;

/// Validate a `PipelineConfig`
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &PipelineConfig) -> Result<(), StoreError> {
    validate_fields(config)?;
    validate_thunk_count(config)?;
    validate_middleware_names(config)?;
    validate_extra(config)?;
    validate_observability(config)?;
    Ok(())
}

/// Declarative constraints from the derive
fn validate_fields(config: &PipelineConfig) -> Result<(), StoreError> {
    config
        .validate()
        .map_err(|errors| StoreError::config_validation("pipeline", errors.to_string()))
}

/// A second interceptor would never see a thunk
fn validate_thunk_count(config: &PipelineConfig) -> Result<(), StoreError> {
    let positions: Vec<usize> = config
        .middleware
        .iter()
        .enumerate()
        .filter(|(_, m)| m.kind == MiddlewareKind::Thunk)
        .map(|(idx, _)| idx)
        .collect();

    if let [_, second, ..] = positions.as_slice() {
        return Err(StoreError::config_validation(
            format!("middleware[{second}].kind"),
            "duplicate thunk middleware",
        ));
    }
    Ok(())
}

fn validate_middleware_names(config: &PipelineConfig) -> Result<(), StoreError> {
    let mut seen = HashSet::new();
    for (idx, middleware) in config.middleware.iter().enumerate() {
        let name = middleware.display_name();
        if !seen.insert(name) {
            return Err(StoreError::config_validation(
                format!("middleware[{idx}].name"),
                format!("duplicate middleware name '{name}'"),
            ));
        }
    }
    Ok(())
}

/// Only thunks receive the extra argument
fn validate_extra(config: &PipelineConfig) -> Result<(), StoreError> {
    let extra = &config.extra;
    let configured = !extra.seed_todos.is_empty() || extra.fail_requests;

    if configured && !config.has_thunk_middleware() {
        return Err(StoreError::config_validation(
            "extra",
            "todo service configured but no thunk middleware in the chain",
        ));
    }
    Ok(())
}

fn validate_observability(config: &PipelineConfig) -> Result<(), StoreError> {
    if config.observability.metrics_port == Some(0) {
        return Err(StoreError::config_validation(
            "observability.metrics_port",
            "metrics_port must be > 0",
        ));
    }
    Ok(())
}
