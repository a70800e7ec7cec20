//! Script run statistics.

use std::time::Duration;

use dispatcher::PipelineMetricsSnapshot;
use observability::DispatchStatsAggregator;
use serde::Serialize;

use crate::app::{AppState, LoadStatus, ThunkReport};

/// Statistics from a script run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Script name (or file stem)
    pub script: String,

    /// Steps executed, including failed ones
    pub steps_run: usize,

    pub steps_failed: usize,

    /// Wall time of the whole run
    pub duration: Duration,

    /// Pipeline and store counters at the end of the run
    pub metrics: PipelineMetricsSnapshot,

    /// Per-step outcomes
    pub dispatch_stats: DispatchStatsAggregator,

    /// Resolved thunk results, in completion order
    pub thunk_results: Vec<(String, ThunkReport)>,

    pub final_state: AppState,

    /// Requests served by the todo service
    pub api_requests: u64,
}

/// JSON form of `RunStats`
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    script: &'a str,
    steps_run: usize,
    steps_failed: usize,
    duration_ms: f64,
    metrics: MetricsReport,
    thunk_results: Vec<ThunkResult<'a>>,
    api_requests: u64,
    final_state: &'a AppState,
}

#[derive(Debug, Serialize)]
struct MetricsReport {
    dispatched: u64,
    applied: u64,
    rejected: u64,
    thunks_invoked: u64,
    thunk_failures: u64,
    notifications: u64,
}

#[derive(Debug, Serialize)]
struct ThunkResult<'a> {
    name: &'a str,
    #[serde(flatten)]
    report: &'a ThunkReport,
}

impl RunStats {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            ..Default::default()
        }
    }

    /// Dispatches per second over the whole run
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.metrics.dispatched_count as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn to_report(&self) -> RunReport<'_> {
        RunReport {
            script: &self.script,
            steps_run: self.steps_run,
            steps_failed: self.steps_failed,
            duration_ms: self.duration.as_secs_f64() * 1000.0,
            metrics: MetricsReport {
                dispatched: self.metrics.dispatched_count,
                applied: self.metrics.applied_count,
                rejected: self.metrics.rejected_count,
                thunks_invoked: self.metrics.thunks_invoked,
                thunk_failures: self.metrics.thunk_failures,
                notifications: self.metrics.notify_count,
            },
            thunk_results: self
                .thunk_results
                .iter()
                .map(|(name, report)| ThunkResult { name, report })
                .collect(),
            api_requests: self.api_requests,
            final_state: &self.final_state,
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Script Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("Overview ({})", self.script);
        println!("   ├─ Duration: {:.2}ms", self.duration.as_secs_f64() * 1000.0);
        println!("   ├─ Steps: {} ({} failed)", self.steps_run, self.steps_failed);
        println!("   ├─ Dispatches: {}", self.metrics.dispatched_count);
        println!("   ├─ Throughput: {:.2}/s", self.throughput());
        println!("   └─ Service requests: {}", self.api_requests);

        println!("\nPipeline");
        println!("   ├─ Applied: {}", self.metrics.applied_count);
        println!("   ├─ Rejected: {}", self.metrics.rejected_count);
        println!(
            "   ├─ Thunks: {} ({} failed)",
            self.metrics.thunks_invoked, self.metrics.thunk_failures
        );
        println!("   └─ Notifications: {}", self.metrics.notify_count);

        if !self.thunk_results.is_empty() {
            println!("\nThunk Results");
            for (name, report) in &self.thunk_results {
                println!("   ├─ {}: {:?}", name, report);
            }
        }

        println!("\n{}", self.dispatch_stats.summary());

        println!("Final State");
        println!("   ├─ Counter: {}", self.final_state.counter);
        println!("   ├─ Todos status: {}", status_label(&self.final_state.status));
        println!("   └─ Todos: {}", self.final_state.todos.len());
        for todo in &self.final_state.todos {
            let mark = if todo.done { "x" } else { " " };
            println!("        [{}] #{} {}", mark, todo.id, todo.title);
        }

        println!();
    }
}

fn status_label(status: &LoadStatus) -> String {
    match status {
        LoadStatus::Idle => "idle".to_string(),
        LoadStatus::Loading => "loading".to_string(),
        LoadStatus::Loaded => "loaded".to_string(),
        LoadStatus::Failed(error) => format!("failed ({error})"),
    }
}
