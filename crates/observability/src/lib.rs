//! # Observability
//!
//! Tracing initialisation and Prometheus metrics.
//!
//! ## Features
//!
//! - Tracing init (JSON / Pretty / Compact)
//! - Prometheus recorder with a text snapshot written after a run
//! - Per-record and per-run deviation metrics with in-memory aggregation
//!
//! ## Example
//!
//! ```ignore
//! use observability::{init_with_config, metrics, ObservabilityConfig};
//!
//! let handle = init_with_config(ObservabilityConfig::default())?;
//!
//! let report = engine.compute(&reference, &test, mode)?;
//! metrics::record_report(&report);
//!
//! if let Some(handle) = handle {
//!     handle.write_to("metrics.prom")?;
//! }
//! ```

pub mod metrics;

use std::path::Path;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-exports
pub use crate::metrics::{
    record_report, record_report_dispatched, record_run_failure, record_run_success,
    DeviationMetricsAggregator, MetricsSummary, RunningStats, StatsSummary,
};

/// Initialise observability with defaults (JSON logs, metrics recorder installed)
pub fn init() -> Result<Option<MetricsHandle>> {
    init_with_config(ObservabilityConfig::default())
}

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log format
    pub log_format: LogFormat,
    /// Install a Prometheus recorder
    pub record_metrics: bool,
    /// Default log level (overridden by `RUST_LOG`)
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            record_metrics: true,
            default_log_level: "info".to_string(),
        }
    }
}

/// Log format
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs
    #[default]
    Json,
    /// Human readable
    Pretty,
    /// Compact single line
    Compact,
}

/// Handle to the installed Prometheus recorder
#[derive(Clone)]
pub struct MetricsHandle {
    inner: PrometheusHandle,
}

impl MetricsHandle {
    /// Prometheus text exposition of everything recorded so far
    pub fn render(&self) -> String {
        self.inner.render()
    }

    /// Write a rendered snapshot to `path`
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, self.render())
            .with_context(|| format!("Failed to write metrics snapshot to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Metrics snapshot written");
        Ok(())
    }
}

impl From<PrometheusHandle> for MetricsHandle {
    fn from(inner: PrometheusHandle) -> Self {
        Self { inner }
    }
}

impl std::fmt::Debug for MetricsHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsHandle").finish_non_exhaustive()
    }
}

/// Initialise with a custom configuration
pub fn init_with_config(config: ObservabilityConfig) -> Result<Option<MetricsHandle>> {
    // 1. Initialize Tracing
    init_tracing(config.log_format, &config.default_log_level)?;

    // 2. Install Prometheus recorder (if enabled)
    let handle = if config.record_metrics {
        Some(install_metrics_recorder()?)
    } else {
        None
    };

    tracing::info!(
        log_format = ?config.log_format,
        record_metrics = config.record_metrics,
        "Observability initialized"
    );

    Ok(handle)
}

/// Initialise the tracing subscriber only
pub fn init_tracing(log_format: LogFormat, default_log_level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_log_level));

    match log_format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer().pretty();

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer().compact();

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
    }
    Ok(())
}

/// Install the Prometheus recorder only (tracing initialised elsewhere)
pub fn install_metrics_recorder() -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    tracing::debug!("Prometheus recorder installed");
    Ok(handle.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert!(config.record_metrics);
        assert_eq!(config.default_log_level, "info");
    }

    #[test]
    fn test_snapshot_written_to_file() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = MetricsHandle::from(recorder.handle());

        ::metrics::with_local_recorder(&recorder, || {
            record_run_success("nearest_neighbor_xy", 12, 0.5);
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("metrics.prom");
        handle.write_to(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("trajdev_runs_total"), "got: {text}");
    }
}
