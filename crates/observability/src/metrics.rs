//! Dispatch metrics
//!
//! Recorder functions for the `metrics` facade plus an in-memory aggregator used
//! to print run summaries.

use std::collections::BTreeMap;

use metrics::{counter, histogram};

/// Record an action committed by a store's reducer
pub fn record_action_applied(store: &str, action_type: &str) {
    counter!(
        "thunk_pipeline_actions_applied_total",
        "store" => store.to_string(),
        "action_type" => action_type.to_string()
    )
    .increment(1);
}

/// Record an action refused by a store's reducer
pub fn record_action_rejected(store: &str, action_type: &str) {
    counter!(
        "thunk_pipeline_actions_rejected_total",
        "store" => store.to_string(),
        "action_type" => action_type.to_string()
    )
    .increment(1);
}

/// Record a thunk invocation and its outcome
pub fn record_thunk_invoked(thunk: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "thunk_pipeline_thunks_invoked_total",
        "thunk" => thunk.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record the wall time of one dispatch through the full chain
pub fn record_dispatch_latency_ms(latency_ms: f64) {
    histogram!("thunk_pipeline_dispatch_latency_ms").record(latency_ms);
}

/// In-memory dispatch statistics
///
/// Collected by the CLI while it runs a script.
#[derive(Debug, Clone, Default)]
pub struct DispatchStatsAggregator {
    /// Applied actions per type
    pub applied: BTreeMap<String, u64>,

    /// Rejected actions per type
    pub rejected: BTreeMap<String, u64>,

    /// Thunk invocations per name
    pub thunks: BTreeMap<String, u64>,

    /// Failed thunks
    pub thunk_failures: u64,

    /// Dispatch latency (ms)
    pub latency: RunningStats,
}

impl DispatchStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_applied(&mut self, action_type: &str) {
        *self.applied.entry(action_type.to_string()).or_insert(0) += 1;
    }

    pub fn record_rejected(&mut self, action_type: &str) {
        *self.rejected.entry(action_type.to_string()).or_insert(0) += 1;
    }

    pub fn record_thunk(&mut self, name: &str, success: bool) {
        *self.thunks.entry(name.to_string()).or_insert(0) += 1;
        if !success {
            self.thunk_failures += 1;
        }
    }

    pub fn record_latency_ms(&mut self, latency_ms: f64) {
        self.latency.push(latency_ms);
    }

    /// Generate summary report
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_applied: self.applied.values().sum(),
            total_rejected: self.rejected.values().sum(),
            total_thunks: self.thunks.values().sum(),
            thunk_failures: self.thunk_failures,
            latency_ms: StatsSummary::from(&self.latency),
            applied_by_type: self.applied.clone(),
        }
    }
}

/// Summary of a run
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_applied: u64,
    pub total_rejected: u64,
    pub total_thunks: u64,
    pub thunk_failures: u64,
    pub latency_ms: StatsSummary,
    pub applied_by_type: BTreeMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Summary ===")?;
        writeln!(f, "Actions applied: {}", self.total_applied)?;
        writeln!(f, "Actions rejected: {}", self.total_rejected)?;
        writeln!(
            f,
            "Thunks invoked: {} ({} failed)",
            self.total_thunks, self.thunk_failures
        )?;
        writeln!(f, "Dispatch latency (ms): {}", self.latency_ms)?;

        if !self.applied_by_type.is_empty() {
            writeln!(f, "Applied by type:")?;
            for (action_type, count) in &self.applied_by_type {
                writeln!(f, "  {}: {}", action_type, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3} (n={})",
                self.min, self.max, self.mean, self.count
            )
        }
    }
}

/// Online min/max/mean
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
            self.mean += (value - self.mean) / self.count as f64;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }
}
