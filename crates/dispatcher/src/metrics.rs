//! Pipeline metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

use store::StoreMetricsSnapshot;

/// Counters for one composed dispatch
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Values submitted, including ones dispatched from inside thunks
    dispatched_count: AtomicU64,
    /// Thunks run by the interceptor
    thunks_invoked: AtomicU64,
    /// Thunks whose body returned an error
    thunk_failures: AtomicU64,
}

impl PipelineMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatched_count(&self) -> u64 {
        self.dispatched_count.load(Ordering::Relaxed)
    }

    pub fn inc_dispatched_count(&self) {
        self.dispatched_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn thunks_invoked(&self) -> u64 {
        self.thunks_invoked.load(Ordering::Relaxed)
    }

    pub fn inc_thunks_invoked(&self) {
        self.thunks_invoked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn thunk_failures(&self) -> u64 {
        self.thunk_failures.load(Ordering::Relaxed)
    }

    pub fn inc_thunk_failures(&self) {
        self.thunk_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of the pipeline counters (store counters left at zero)
    pub fn snapshot(&self) -> PipelineMetricsSnapshot {
        PipelineMetricsSnapshot {
            dispatched_count: self.dispatched_count(),
            thunks_invoked: self.thunks_invoked(),
            thunk_failures: self.thunk_failures(),
            ..Default::default()
        }
    }
}

/// Snapshot of pipeline and store metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineMetricsSnapshot {
    pub dispatched_count: u64,
    pub thunks_invoked: u64,
    pub thunk_failures: u64,
    pub applied_count: u64,
    pub rejected_count: u64,
    pub notify_count: u64,
}

impl PipelineMetricsSnapshot {
    /// Fill in the store side
    pub fn with_store(mut self, store: StoreMetricsSnapshot) -> Self {
        self.applied_count = store.applied_count;
        self.rejected_count = store.rejected_count;
        self.notify_count = store.notify_count;
        self
    }
}
