//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::PipelineConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    store: StoreInfo,
    middleware: Vec<MiddlewareInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    extra: Option<ExtraInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics_port: Option<u16>,
}

#[derive(Serialize)]
struct StoreInfo {
    name: String,
    initial_counter: i64,
}

#[derive(Serialize)]
struct MiddlewareInfo {
    position: usize,
    name: String,
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<String>,
}

#[derive(Serialize)]
struct ExtraInfo {
    api_latency_ms: u64,
    fail_requests: bool,
    seed_todos: Vec<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&config, args.extra);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(config: &PipelineConfig, with_extra: bool) -> ConfigInfo {
    let middleware = config
        .middleware
        .iter()
        .enumerate()
        .map(|(position, m)| MiddlewareInfo {
            position,
            name: m.display_name().to_string(),
            kind: m.kind.as_str().to_string(),
            level: (m.kind == contracts::MiddlewareKind::Logger)
                .then(|| format!("{:?}", m.level).to_lowercase()),
        })
        .collect();

    let extra = with_extra.then(|| ExtraInfo {
        api_latency_ms: config.extra.api_latency_ms,
        fail_requests: config.extra.fail_requests,
        seed_todos: config.extra.seed_todos.clone(),
    });

    ConfigInfo {
        version: format!("{:?}", config.version),
        store: StoreInfo {
            name: config.store.name.clone(),
            initial_counter: config.store.initial_counter,
        },
        middleware,
        extra,
        metrics_port: config.observability.metrics_port,
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("\n=== Pipeline Configuration ===\n");
    println!("Version: {}", info.version);
    println!("\nStore:");
    println!("  Name: {}", info.store.name);
    println!("  Initial counter: {}", info.store.initial_counter);

    println!("\nMiddleware ({}, outermost first):", info.middleware.len());
    for m in &info.middleware {
        match m.level {
            Some(ref level) => println!("  {}. {} ({}, {})", m.position, m.name, m.kind, level),
            None => println!("  {}. {} ({})", m.position, m.name, m.kind),
        }
    }

    if let Some(ref extra) = info.extra {
        println!("\nTodo service:");
        println!("  Latency: {}ms", extra.api_latency_ms);
        println!("  Fail requests: {}", extra.fail_requests);
        println!("  Seed todos ({}):", extra.seed_todos.len());
        for title in &extra.seed_todos {
            println!("    - {}", title);
        }
    }

    match info.metrics_port {
        Some(port) => println!("\nMetrics: http://0.0.0.0:{}/metrics", port),
        None => println!("\nMetrics: disabled"),
    }

    println!();
}
