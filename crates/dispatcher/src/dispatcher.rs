//! Dispatcher - main loop for fan-out to sinks

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use contracts::{ReportBundle, SinkConfig, SinkType};

use crate::error::DispatcherError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::sinks::{CsvReportSink, LogSink, SummarySink};

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Sink configurations
    pub sinks: Vec<SinkConfig>,

    /// Directory file sinks write into unless their `path` param says otherwise
    pub output_dir: PathBuf,
}

impl DispatcherConfig {
    pub fn new(sinks: Vec<SinkConfig>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            sinks,
            output_dir: output_dir.into(),
        }
    }
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    input_rx: mpsc::Receiver<Arc<ReportBundle>>,
}

impl DispatcherBuilder {
    /// Create a new DispatcherBuilder
    pub fn new(config: DispatcherConfig, input_rx: mpsc::Receiver<Arc<ReportBundle>>) -> Self {
        Self { config, input_rx }
    }

    /// Build and start the dispatcher
    #[instrument(name = "dispatcher_builder_build", skip(self))]
    pub async fn build(self) -> Result<Dispatcher, DispatcherError> {
        let handles = Self::initialize_handles(&self.config).await?;

        Ok(Dispatcher {
            handles,
            input_rx: self.input_rx,
        })
    }

    #[instrument(
        name = "dispatcher_initialize_handles",
        skip(config),
        fields(sink_count = config.sinks.len())
    )]
    async fn initialize_handles(
        config: &DispatcherConfig,
    ) -> Result<Vec<SinkHandle>, DispatcherError> {
        let mut handles: Vec<SinkHandle> = Vec::with_capacity(config.sinks.len());
        for sink_config in &config.sinks {
            match create_sink_handle(sink_config, &config.output_dir) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Workers already spawned must not outlive a failed build
                    for handle in handles {
                        handle.shutdown().await;
                    }
                    return Err(e);
                }
            }
        }
        Ok(handles)
    }
}

/// Create a SinkHandle from configuration
#[instrument(
    name = "dispatcher_create_sink_handle",
    skip(config, output_dir),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
fn create_sink_handle(config: &SinkConfig, output_dir: &Path) -> Result<SinkHandle, DispatcherError> {
    match config.sink_type {
        SinkType::Log => {
            let sink = LogSink::new(&config.name);
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        SinkType::Csv => {
            let sink = CsvReportSink::from_params(&config.name, output_dir, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        SinkType::Summary => {
            let sink = SummarySink::from_params(&config.name, output_dir, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
    }
}

/// Per-sink result of a dispatcher run
#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    /// Reports received on the input channel
    pub reports: u64,

    /// Final metrics of every sink, in configuration order
    pub sinks: Vec<(String, MetricsSnapshot)>,
}

impl DispatchOutcome {
    /// Names of sinks that failed or lost at least one report
    pub fn failed_sinks(&self) -> Vec<&str> {
        self.sinks
            .iter()
            .filter(|(_, m)| !m.is_clean())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.sinks.iter().all(|(_, m)| m.is_clean())
    }
}

/// The main Dispatcher that fans out reports to sinks
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
    input_rx: mpsc::Receiver<Arc<ReportBundle>>,
}

impl Dispatcher {
    /// Create a dispatcher with custom sink handles (for testing)
    pub fn with_handles(
        handles: Vec<SinkHandle>,
        input_rx: mpsc::Receiver<Arc<ReportBundle>>,
    ) -> Self {
        Self { handles, input_rx }
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Run the dispatcher main loop
    ///
    /// Consumes reports from input and fans out to all sinks.
    /// Returns when input channel is closed and every sink has shut down.
    #[instrument(name = "dispatcher_run", skip(self))]
    pub async fn run(mut self) -> DispatchOutcome {
        info!(sinks = self.handles.len(), "Dispatcher started");

        let mut report_count: u64 = 0;

        while let Some(bundle) = self.input_rx.recv().await {
            report_count += 1;
            debug!(run_id = %bundle.run_id, "Dispatching report");
            self.dispatch_report(&bundle).await;
        }

        info!(
            reports = report_count,
            "Dispatcher input closed, shutting down"
        );

        let metrics: Vec<_> = self
            .handles
            .iter()
            .map(|h| (h.name().to_string(), Arc::clone(h.metrics())))
            .collect();

        Self::shutdown_handles(self.handles).await;

        let outcome = DispatchOutcome {
            reports: report_count,
            sinks: metrics
                .into_iter()
                .map(|(name, m)| (name, m.snapshot()))
                .collect(),
        };

        info!(clean = outcome.is_clean(), "Dispatcher shutdown complete");
        outcome
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(self) -> JoinHandle<DispatchOutcome> {
        tokio::spawn(async move { self.run().await })
    }

    async fn dispatch_report(&self, bundle: &Arc<ReportBundle>) {
        for handle in &self.handles {
            if let Err(e) = handle.send(Arc::clone(bundle)).await {
                warn!(sink = %handle.name(), error = %e, "Report not delivered");
            }
        }
    }

    async fn shutdown_handles(handles: Vec<SinkHandle>) {
        for handle in handles {
            handle.shutdown().await;
        }
    }
}

/// Convenience function to create a dispatcher from sink configs
#[instrument(name = "dispatcher_create", skip(sink_configs, input_rx, output_dir))]
pub async fn create_dispatcher(
    sink_configs: Vec<SinkConfig>,
    output_dir: impl Into<PathBuf>,
    input_rx: mpsc::Receiver<Arc<ReportBundle>>,
) -> Result<Dispatcher, DispatcherError> {
    let config = DispatcherConfig::new(sink_configs, output_dir);
    DispatcherBuilder::new(config, input_rx).build().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ErrorRecord, ErrorReport, Trajectory};

    fn bundle(run_id: &str) -> Arc<ReportBundle> {
        let test = Trajectory::from_tuples("test", &[(0.0, 1.0, 1.0, 0.5)]);
        let report = ErrorReport::new(
            Default::default(),
            Default::default(),
            vec![ErrorRecord {
                sample_index: 0,
                elapsed_time: 0.0,
                lateral_error: 1.0,
                vertical_error: 0.5,
                error_point: [1.0, 0.0],
                bracket: (1, 0),
            }],
        );
        Arc::new(ReportBundle::new(run_id, report, test))
    }

    #[tokio::test]
    async fn test_dispatcher_fanout() {
        let (input_tx, input_rx) = mpsc::channel(4);

        let handles = vec![
            SinkHandle::spawn(LogSink::new("sink1"), 4),
            SinkHandle::spawn(LogSink::new("sink2"), 4),
        ];

        let dispatcher = Dispatcher::with_handles(handles, input_rx);
        let handle = dispatcher.spawn();

        for i in 0..3 {
            input_tx.send(bundle(&format!("run-{i}"))).await.unwrap();
        }
        drop(input_tx);

        let outcome = handle.await.unwrap();
        assert_eq!(outcome.reports, 3);
        assert_eq!(outcome.sinks.len(), 2);
        for (_, snapshot) in &outcome.sinks {
            assert_eq!(snapshot.written, 3);
        }
        assert!(outcome.is_clean());
    }

    #[tokio::test]
    async fn test_create_dispatcher_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let (input_tx, input_rx) = mpsc::channel(4);

        let configs = vec![
            SinkConfig::new("log", SinkType::Log),
            SinkConfig::new("csv", SinkType::Csv),
            SinkConfig::new("summary", SinkType::Summary),
        ];

        let dispatcher = create_dispatcher(configs, dir.path(), input_rx)
            .await
            .unwrap();
        let handle = dispatcher.spawn();

        input_tx.send(bundle("run-a")).await.unwrap();
        drop(input_tx);

        let outcome = handle.await.unwrap();
        assert!(outcome.is_clean(), "failed: {:?}", outcome.failed_sinks());
        assert!(dir.path().join("run-a_log.csv").exists());
        assert!(dir.path().join("run-a_summary.json").exists());
    }

    #[tokio::test]
    async fn test_failed_sink_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let (input_tx, input_rx) = mpsc::channel(4);
        let configs = vec![
            SinkConfig::new("csv", SinkType::Csv)
                .with_param("path", blocker.join("out.csv").to_string_lossy()),
            SinkConfig::new("log", SinkType::Log),
        ];

        let dispatcher = create_dispatcher(configs, dir.path(), input_rx)
            .await
            .unwrap();
        let handle = dispatcher.spawn();
        input_tx.send(bundle("run-b")).await.unwrap();
        drop(input_tx);

        let outcome = handle.await.unwrap();
        assert_eq!(outcome.failed_sinks(), vec!["csv"]);
    }
}
