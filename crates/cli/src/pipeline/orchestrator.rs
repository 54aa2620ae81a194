//! Pipeline orchestrator - load, compute, dispatch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use contracts::{
    CorrespondenceMode, ErrorReport, InputsConfig, ProgressSink, ReportBundle, RunBlueprint,
};
use deviation_engine::DeviationEngine;
use ingestion::{IngestionMetrics, LoadedTrajectory, TimeSource, TrajectoryLoader};
use observability::{record_report, record_report_dispatched, DeviationMetricsAggregator};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use super::PipelineStats;
use crate::error::{CliError, Result};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated run blueprint
    pub blueprint: RunBlueprint,

    /// Identifier attached to reports and logs
    pub run_id: String,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    ///
    /// `cancel` is polled between samples; once set the run stops with
    /// [`CliError::Cancelled`] and nothing is written.
    #[instrument(name = "pipeline_run", skip(self, cancel), fields(run_id = %self.config.run_id))]
    pub async fn run(self, cancel: Arc<AtomicBool>) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let PipelineConfig { blueprint, run_id } = self.config;
        let mode = blueprint.engine.mode;

        // 1. Load inputs
        let ingestion_metrics = Arc::new(IngestionMetrics::new());
        let loader =
            TrajectoryLoader::new(blueprint.columns.clone()).with_metrics(Arc::clone(&ingestion_metrics));
        let inputs = blueprint.inputs.clone();

        let (reference, test) = tokio::task::spawn_blocking(move || load_inputs(&loader, &inputs))
            .await
            .map_err(|e| CliError::task(e.to_string()))??;
        let load_duration = start_time.elapsed();

        info!(
            reference_samples = reference.trajectory.len(),
            test_samples = test.trajectory.len(),
            load_ms = load_duration.as_millis() as u64,
            "Inputs loaded"
        );

        // 2. Compute deviations off the async runtime
        let engine = DeviationEngine::new(blueprint.to_engine_config());
        let reference_samples = reference.trajectory.len();
        let compute_start = Instant::now();

        let (report, aggregator, test) = tokio::task::spawn_blocking(move || {
            compute_report(&engine, &reference, &test, mode, &cancel)
                .map(|(report, aggregator)| (report, aggregator, test))
        })
        .await
        .map_err(|e| CliError::task(e.to_string()))??;
        let compute_duration = compute_start.elapsed();

        record_report(&report);
        let lateral = report.lateral_statistics();
        let vertical_abs = report.abs_vertical_statistics();
        let records = report.len();

        info!(
            records,
            compute_ms = compute_duration.as_millis() as u64,
            lateral_rmse = lateral.rmse,
            "Deviation computed"
        );

        // 3. Dispatch the report
        let output_dir = blueprint.output_directory();
        let split_time = matches!(test.time_source, TimeSource::Split { .. });
        let mut bundle = ReportBundle::new(run_id.clone(), report, test.trajectory)
            .with_table(test.table)
            .with_test_path(blueprint.inputs.test.clone());
        if split_time {
            bundle = bundle.with_stamp_column(blueprint.columns.timestamp.clone());
        }

        let (report_tx, report_rx) = mpsc::channel::<Arc<ReportBundle>>(1);
        let dispatcher =
            dispatcher::create_dispatcher(blueprint.sinks.clone(), output_dir.clone(), report_rx)
                .await?;
        let dispatcher_handle = dispatcher.spawn();

        if report_tx.send(Arc::new(bundle)).await.is_err() {
            warn!("Dispatcher channel closed before the report was sent");
        }
        drop(report_tx);

        let outcome = dispatcher_handle
            .await
            .map_err(|e| CliError::task(e.to_string()))?;

        for (sink, snapshot) in &outcome.sinks {
            record_report_dispatched(sink, snapshot.is_clean());
        }
        if !outcome.is_clean() {
            return Err(CliError::Dispatch {
                sinks: outcome.failed_sinks().into_iter().map(String::from).collect(),
            });
        }

        let stats = PipelineStats {
            run_id,
            mode,
            projection: blueprint.engine.projection,
            reference_samples,
            records,
            load_duration,
            compute_duration,
            duration: start_time.elapsed(),
            lateral,
            vertical_abs,
            deviation: aggregator.summary(),
            ingestion: ingestion_metrics.snapshot(),
            sinks: outcome.sinks,
            output_dir,
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            samples_per_sec = format!("{:.1}", stats.samples_per_sec()),
            "Pipeline complete"
        );

        Ok(stats)
    }
}

fn load_inputs(
    loader: &TrajectoryLoader,
    inputs: &InputsConfig,
) -> Result<(LoadedTrajectory, LoadedTrajectory)> {
    let reference = loader
        .load_path(&inputs.reference, "reference")
        .map_err(|e| CliError::ingestion("reference", e))?;
    let test = loader
        .load_path(&inputs.test, "test")
        .map_err(|e| CliError::ingestion("test", e))?;
    Ok((reference, test))
}

/// Pull records one at a time so a shutdown request can stop the run
fn compute_report(
    engine: &DeviationEngine,
    reference: &LoadedTrajectory,
    test: &LoadedTrajectory,
    mode: CorrespondenceMode,
    cancel: &AtomicBool,
) -> Result<(ErrorReport, DeviationMetricsAggregator)> {
    let mut steps = engine.steps(&reference.trajectory, &test.trajectory, mode)?;
    let total = steps.total();

    let mut progress = ProgressLogger::new(total);
    let mut aggregator = DeviationMetricsAggregator::new();
    let mut records = Vec::with_capacity(total);

    loop {
        if cancel.load(Ordering::Relaxed) {
            return Err(CliError::Cancelled {
                completed: steps.completed(),
                total,
            });
        }
        let Some(step) = steps.next() else { break };
        let record = step?;
        aggregator.update(&record);
        records.push(record);
        progress.on_progress(records.len(), total);
    }

    Ok((
        ErrorReport::new(mode, engine.config().projection, records),
        aggregator,
    ))
}

/// Logs progress at every tenth of the run
struct ProgressLogger {
    step: usize,
    next_report: usize,
}

impl ProgressLogger {
    fn new(total: usize) -> Self {
        let step = (total / 10).max(1);
        Self {
            step,
            next_report: step,
        }
    }
}

impl ProgressSink for ProgressLogger {
    fn on_progress(&mut self, current: usize, total: usize) {
        if current >= self.next_report || current == total {
            debug!(
                current,
                total,
                percent = format!("{:.0}", current as f64 / total.max(1) as f64 * 100.0),
                "Deviation progress"
            );
            while self.next_report <= current {
                self.next_report += self.step;
            }
        }
    }
}
