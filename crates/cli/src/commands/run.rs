//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, RunConfig};
use crate::script::{Script, Step};

/// Execute the `run` command
pub async fn run_script(args: &RunArgs) -> Result<()> {
    info!(
        config = %args.config.display(),
        script = %args.script.display(),
        "Loading configuration"
    );

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if let Some(port) = args.metrics_port {
        info!(port, "Overriding metrics port from CLI");
        config.observability.metrics_port = Some(port);
    }

    let mut script = Script::load_from_path(&args.script)
        .with_context(|| format!("Failed to load script from {}", args.script.display()))?;
    if script.name.is_none() {
        script.name = args
            .script
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
    }

    info!(
        store = %config.store.name,
        middleware = config.middleware.len(),
        steps = script.steps.len(),
        "Configuration loaded"
    );

    // Dry run - just print the plan and exit
    if args.dry_run {
        info!("Dry run mode - configuration and script are valid, exiting");
        print_plan(&config, &script);
        return Ok(());
    }

    if let Some(port) = config.observability.metrics_port {
        observability::init_metrics_only(port)?;
        info!("Metrics endpoint available on port {}", port);
    }

    let pipeline = Pipeline::new(RunConfig {
        pipeline: config,
        script,
        fail_fast: args.fail_fast,
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
    });

    let shutdown_signal = setup_shutdown_signal();

    tokio::select! {
        result = pipeline.run() => {
            let stats = result.context("Script execution failed")?;
            info!(
                steps = stats.steps_run,
                failed = stats.steps_failed,
                dispatched = stats.metrics.dispatched_count,
                duration_ms = stats.duration.as_millis() as u64,
                "Script completed"
            );

            if args.json {
                let json = serde_json::to_string_pretty(&stats.to_report())
                    .context("Failed to serialize run report")?;
                println!("{}", json);
            } else {
                stats.print_summary();
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, abandoning script");
        }
    }

    info!("thunkctl finished");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print the run plan for dry-run mode
fn print_plan(config: &contracts::PipelineConfig, script: &Script) {
    println!("\n=== Run Plan ===\n");
    println!("Store:");
    println!("  Name: {}", config.store.name);
    println!("  Initial counter: {}", config.store.initial_counter);

    println!("\nMiddleware ({}, outermost first):", config.middleware.len());
    for middleware in &config.middleware {
        println!(
            "  - {} ({})",
            middleware.display_name(),
            middleware.kind.as_str()
        );
    }

    println!(
        "\nScript: {} ({} steps, {} dispatches)",
        script.name.as_deref().unwrap_or("script"),
        script.steps.len(),
        script.dispatch_count()
    );
    for (index, step) in script.steps.iter().enumerate() {
        match step {
            Step::Action(action) => println!("  {index}. action {action:?}"),
            Step::Thunk(thunk) => println!("  {index}. thunk {}", thunk.name()),
            Step::Parallel(thunks) => {
                let names: Vec<&str> = thunks.iter().map(|t| t.name()).collect();
                println!("  {index}. parallel [{}]", names.join(", "));
            }
        }
    }

    println!();
}
