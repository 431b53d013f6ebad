//! Request counters
//!
//! Counters only. Monotonic, reset on process start.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Registry of operational counters for one serving process
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    operations_executed: AtomicU64,
    operations_failed: AtomicU64,
    views_read: AtomicU64,
    records_scanned: AtomicU64,
    requests_rejected: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_operations_executed(&self) {
        self.operations_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_operations_failed(&self) {
        self.operations_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_views_read(&self) {
        self.views_read.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds the number of records a query examined
    pub fn add_records_scanned(&self, count: u64) {
        self.records_scanned.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_requests_rejected(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            operations_executed: self.operations_executed.load(Ordering::Relaxed),
            operations_failed: self.operations_failed.load(Ordering::Relaxed),
            views_read: self.views_read.load(Ordering::Relaxed),
            records_scanned: self.records_scanned.load(Ordering::Relaxed),
            requests_rejected: self.requests_rejected.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub operations_executed: u64,
    pub operations_failed: u64,
    pub views_read: u64,
    pub records_scanned: u64,
    pub requests_rejected: u64,
}

impl MetricsSnapshot {
    /// Log fields, values rendered as strings
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("operations_executed", self.operations_executed.to_string()),
            ("operations_failed", self.operations_failed.to_string()),
            ("records_scanned", self.records_scanned.to_string()),
            ("requests_rejected", self.requests_rejected.to_string()),
            ("views_read", self.views_read.to_string()),
        ]
    }
}
