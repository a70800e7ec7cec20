//! Store metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a single store
#[derive(Debug, Default)]
pub struct StoreMetrics {
    /// Actions committed by the reducer
    applied_count: AtomicU64,
    /// Actions refused by the reducer
    rejected_count: AtomicU64,
    /// Listener invocations
    notify_count: AtomicU64,
}

impl StoreMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied_count(&self) -> u64 {
        self.applied_count.load(Ordering::Relaxed)
    }

    pub fn inc_applied_count(&self) {
        self.applied_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rejected_count(&self) -> u64 {
        self.rejected_count.load(Ordering::Relaxed)
    }

    pub fn inc_rejected_count(&self) {
        self.rejected_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn notify_count(&self) -> u64 {
        self.notify_count.load(Ordering::Relaxed)
    }

    pub fn add_notify_count(&self, n: u64) {
        self.notify_count.fetch_add(n, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> StoreMetricsSnapshot {
        StoreMetricsSnapshot {
            applied_count: self.applied_count(),
            rejected_count: self.rejected_count(),
            notify_count: self.notify_count(),
        }
    }
}

/// Snapshot of store metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreMetricsSnapshot {
    pub applied_count: u64,
    pub rejected_count: u64,
    pub notify_count: u64,
}
