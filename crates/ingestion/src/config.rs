//! Ingestion metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Data rows turned into samples
    pub rows_loaded: AtomicU64,

    /// Blank lines skipped
    pub blank_lines_skipped: AtomicU64,

    /// Parse error count
    pub parse_errors: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record loaded rows
    pub fn record_rows(&self, count: u64) {
        self.rows_loaded.fetch_add(count, Ordering::Relaxed);
    }

    /// Record skipped blank lines
    pub fn record_skipped(&self, count: u64) {
        self.blank_lines_skipped.fetch_add(count, Ordering::Relaxed);
    }

    /// Record parse error
    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rows_loaded: self.rows_loaded.load(Ordering::Relaxed),
            blank_lines_skipped: self.blank_lines_skipped.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Data rows turned into samples
    pub rows_loaded: u64,

    /// Blank lines skipped
    pub blank_lines_skipped: u64,

    /// Parse error count
    pub parse_errors: u64,
}
