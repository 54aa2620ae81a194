//! Per-sink delivery counters
//!
//! Counted in reports (one finished comparison each) plus the error
//! records those reports carried.

use std::sync::atomic::{AtomicU64, Ordering};

/// Delivery counters for a single sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    queued: AtomicU64,
    written: AtomicU64,
    records_written: AtomicU64,
    write_failures: AtomicU64,
    finish_failures: AtomicU64,
    undelivered: AtomicU64,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report accepted into the sink queue
    pub fn record_queued(&self) {
        self.queued.fetch_add(1, Ordering::Relaxed);
    }

    /// Report written; `records` is the number of error records it held
    pub fn record_written(&self, records: usize) {
        self.written.fetch_add(1, Ordering::Relaxed);
        self.records_written
            .fetch_add(records as u64, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Flush or close failed after the queue drained
    pub fn record_finish_failure(&self) {
        self.finish_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Report could not be queued because the worker was gone
    pub fn record_undelivered(&self) {
        self.undelivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queued: self.queued.load(Ordering::Relaxed),
            written: self.written(),
            records_written: self.records_written.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            finish_failures: self.finish_failures.load(Ordering::Relaxed),
            undelivered: self.undelivered.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`SinkMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queued: u64,
    pub written: u64,
    pub records_written: u64,
    pub write_failures: u64,
    pub finish_failures: u64,
    pub undelivered: u64,
}

impl MetricsSnapshot {
    /// All failures, whatever the stage
    pub fn failures(&self) -> u64 {
        self.write_failures + self.finish_failures + self.undelivered
    }

    /// Queued reports not yet written or failed
    pub fn pending(&self) -> u64 {
        self.queued
            .saturating_sub(self.written + self.write_failures)
    }

    /// Every queued report was written and the sink closed cleanly
    pub fn is_clean(&self) -> bool {
        self.failures() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_counted_per_report() {
        let metrics = SinkMetrics::new();
        metrics.record_queued();
        metrics.record_queued();
        metrics.record_written(40);
        metrics.record_written(2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.written, 2);
        assert_eq!(snapshot.records_written, 42);
        assert_eq!(snapshot.pending(), 0);
        assert!(snapshot.is_clean());
    }

    #[test]
    fn test_pending_and_failures() {
        let metrics = SinkMetrics::new();
        for _ in 0..3 {
            metrics.record_queued();
        }
        metrics.record_written(5);
        metrics.record_write_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.pending(), 1);
        assert_eq!(snapshot.failures(), 1);
        assert!(!snapshot.is_clean());
    }

    #[test]
    fn test_finish_failure_is_not_clean() {
        let metrics = SinkMetrics::new();
        metrics.record_queued();
        metrics.record_written(1);
        metrics.record_finish_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.pending(), 0);
        assert!(!snapshot.is_clean());
    }
}
