//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{MiddlewareKind, PipelineConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    store: String,
    middleware: Vec<String>,
    thunk_enabled: bool,
    seed_todos: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    store: config.store.name.clone(),
                    middleware: config
                        .middleware
                        .iter()
                        .map(|m| m.display_name().to_string())
                        .collect(),
                    thunk_enabled: config.has_thunk_middleware(),
                    seed_todos: config.extra.seed_todos.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &PipelineConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.middleware.is_empty() {
        warnings.push("Empty middleware chain - every thunk will be rejected".to_string());
        return warnings;
    }

    if !config.has_thunk_middleware() {
        warnings.push("No thunk middleware - only plain actions can be dispatched".to_string());
    }

    // Middleware after the interceptor never sees thunks
    if let Some(thunk_pos) = config
        .middleware
        .iter()
        .position(|m| m.kind == MiddlewareKind::Thunk)
    {
        for middleware in &config.middleware[thunk_pos + 1..] {
            if middleware.kind == MiddlewareKind::Logger {
                warnings.push(format!(
                    "Logger '{}' sits after the thunk middleware and will not see thunks",
                    middleware.display_name()
                ));
            }
        }
    }

    if config.has_thunk_middleware() && config.extra.seed_todos.is_empty() {
        warnings.push("extra.seed_todos is empty - fetch_todos will load nothing".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Store: {}", summary.store);
            println!("  Middleware: {}", summary.middleware.join(" -> "));
            println!("  Thunks enabled: {}", summary.thunk_enabled);
            println!("  Seed todos: {}", summary.seed_todos);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
