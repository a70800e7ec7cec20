//! Script orchestrator - runs a script against the configured pipeline.

use std::time::{Duration, Instant};

use contracts::{Action, PipelineConfig, StoreError};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use super::{build_dispatch, RunStats};
use crate::app::{AppDispatch, AppState, ThunkReport, TodoApi};
use crate::error::{CliError, Result};
use crate::script::{Script, Step, ThunkStep};

/// Run configuration
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Validated pipeline configuration
    pub pipeline: PipelineConfig,

    /// Steps to run
    pub script: Script,

    /// Stop at the first failing step
    pub fail_fast: bool,

    /// Overall timeout (None = no timeout)
    pub timeout: Option<Duration>,
}

/// Main script orchestrator
pub struct Pipeline {
    config: RunConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Run the script to completion
    pub async fn run(self) -> Result<RunStats> {
        match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, self.execute())
                .await
                .map_err(|_| CliError::Timeout {
                    secs: limit.as_secs(),
                })?,
            None => self.execute().await,
        }
    }

    async fn execute(&self) -> Result<RunStats> {
        let started = Instant::now();
        let script = &self.config.script;
        let dispatch = build_dispatch(&self.config.pipeline);

        let subscriber = dispatch.store().subscribe(|state: &AppState| {
            debug!(
                counter = state.counter,
                todos = state.todos.len(),
                status = ?state.status,
                "State changed"
            );
        });

        let mut stats = RunStats::new(script.name.as_deref().unwrap_or("script"));
        info!(
            script = %stats.script,
            steps = script.steps.len(),
            dispatches = script.dispatch_count(),
            "Running script"
        );

        let mut outcome = Ok(());
        for (index, step) in script.steps.iter().enumerate() {
            stats.steps_run += 1;
            if let Err(e) = run_step(&dispatch, step, &mut stats).await {
                stats.steps_failed += 1;
                warn!(step = index, kind = step_label(step), error = %e, "Step failed");
                if self.config.fail_fast {
                    outcome = Err(CliError::step_failed(index, step_label(step), e));
                    break;
                }
            }
        }

        dispatch.store().unsubscribe(subscriber);
        outcome?;

        stats.duration = started.elapsed();
        stats.metrics = dispatch.metrics_snapshot();
        stats.api_requests = dispatch.extra_argument().request_count();
        stats.final_state = dispatch.get_state();

        info!(
            steps = stats.steps_run,
            failed = stats.steps_failed,
            dispatched = stats.metrics.dispatched_count,
            duration_ms = stats.duration.as_millis() as u64,
            "Script finished"
        );

        Ok(stats)
    }
}

#[instrument(name = "script_step", skip_all, fields(kind = step_label(step)))]
async fn run_step(
    dispatch: &AppDispatch,
    step: &Step,
    stats: &mut RunStats,
) -> std::result::Result<(), StoreError> {
    match step {
        Step::Action(action) => {
            let started = Instant::now();
            let result = dispatch.dispatch_action(action.clone());
            stats
                .dispatch_stats
                .record_latency_ms(started.elapsed().as_secs_f64() * 1000.0);

            match result {
                Ok(_) => {
                    stats.dispatch_stats.record_applied(action.action_type());
                    Ok(())
                }
                Err(e) => {
                    stats.dispatch_stats.record_rejected(action.action_type());
                    Err(e)
                }
            }
        }
        Step::Thunk(thunk) => {
            let report = run_thunk(dispatch, thunk, stats).await?;
            stats.thunk_results.push((thunk.name().to_string(), report));
            Ok(())
        }
        Step::Parallel(thunks) => run_parallel(dispatch, thunks, stats).await,
    }
}

/// Dispatch one thunk and await its future
async fn run_thunk(
    dispatch: &AppDispatch,
    thunk: &ThunkStep,
    stats: &mut RunStats,
) -> std::result::Result<ThunkReport, StoreError> {
    let started = Instant::now();
    let result = match dispatch.dispatch_thunk(thunk.to_thunk()) {
        Ok(dispatched) => match dispatched.output() {
            Some(pending) => pending.await,
            None => Err(StoreError::Other(format!(
                "thunk '{}' was answered with an action",
                thunk.name()
            ))),
        },
        Err(e) => Err(e),
    };

    stats
        .dispatch_stats
        .record_latency_ms(started.elapsed().as_secs_f64() * 1000.0);
    stats.dispatch_stats.record_thunk(thunk.name(), result.is_ok());
    result
}

/// Dispatch every thunk, then drive their futures concurrently
///
/// All thunks run even if one fails; the first failure is returned.
async fn run_parallel(
    dispatch: &AppDispatch,
    thunks: &[ThunkStep],
    stats: &mut RunStats,
) -> std::result::Result<(), StoreError> {
    let mut pending = JoinSet::new();
    let mut first_error = None;

    for thunk in thunks {
        let name = thunk.name();
        match dispatch.dispatch_thunk(thunk.to_thunk()).map(|d| d.output()) {
            Ok(Some(future)) => {
                let started = Instant::now();
                pending.spawn(async move { (name, started, future.await) });
            }
            Ok(None) => {
                stats.dispatch_stats.record_thunk(name, false);
                first_error.get_or_insert(StoreError::Other(format!(
                    "thunk '{name}' was answered with an action"
                )));
            }
            Err(e) => {
                stats.dispatch_stats.record_thunk(name, false);
                first_error.get_or_insert(e);
            }
        }
    }

    while let Some(joined) = pending.join_next().await {
        let (name, started, result) =
            joined.map_err(|e| StoreError::Other(format!("thunk task failed: {e}")))?;
        stats
            .dispatch_stats
            .record_latency_ms(started.elapsed().as_secs_f64() * 1000.0);
        stats.dispatch_stats.record_thunk(name, result.is_ok());

        match result {
            Ok(report) => stats.thunk_results.push((name.to_string(), report)),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    first_error.map_or(Ok(()), Err)
}

fn step_label(step: &Step) -> &'static str {
    match step {
        Step::Action(_) => "action",
        Step::Thunk(thunk) => thunk.name(),
        Step::Parallel(_) => "parallel",
    }
}
