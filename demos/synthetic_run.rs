//! Synthetic Run Example
//!
//! Generates a circular reference lap and a wobbling test lap, compares them
//! in every correspondence mode, and writes the reports of the last mode.
//! Runs without recorded data.
//!
//! Run with: cargo run -p demos --bin synthetic_run [output_dir] [run.toml]

use std::path::PathBuf;
use std::sync::Arc;

use config_loader::ConfigLoader;
use contracts::{CorrespondenceMode, ReportBundle, RunBlueprint, SinkConfig, SinkType};
use deviation_engine::DeviationEngine;
use ingestion::{MockTrajectory, TrajectoryLoader};
use observability::{LogFormat, ObservabilityConfig};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let metrics = observability::init_with_config(ObservabilityConfig {
        log_format: LogFormat::Pretty,
        ..Default::default()
    })?;

    tracing::info!("Starting synthetic run demo");

    // ==== Stage 1: Generate inputs ====
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("trajdev-demo"));
    std::fs::create_dir_all(&out_dir)?;

    let reference = MockTrajectory::circle("reference", 600, 20.0, 25.0, 0.25);
    let test = MockTrajectory::circle("test", 500, 20.0, 25.0, 0.25)
        .with_lateral_offset(0.3)
        .with_wobble(0.5)
        .with_height(0.1)
        .with_start_time(1.025);

    let ref_path = out_dir.join("reference.csv");
    let test_path = out_dir.join("test_lap.csv");
    std::fs::write(&ref_path, reference.to_csv())?;
    std::fs::write(&test_path, test.to_csv())?;
    tracing::info!(dir = %out_dir.display(), "Synthetic inputs written");

    // ==== Stage 2: Use a config file or a default blueprint ====
    let mut blueprint = if let Some(path) = std::env::args().nth(2) {
        tracing::info!(path = %path, "Loading run config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        RunBlueprint::new(&ref_path, &test_path)
    };
    blueprint.sinks.push(SinkConfig::new("summary", SinkType::Summary));
    ConfigLoader::validate(&blueprint)?;

    // ==== Stage 3: Load ====
    let loader = TrajectoryLoader::new(blueprint.columns.clone());
    let reference = loader.load_path(&blueprint.inputs.reference, "reference")?;
    let test = loader.load_path(&blueprint.inputs.test, "test")?;

    // ==== Stage 4: Compare in every mode ====
    let engine = DeviationEngine::new(blueprint.to_engine_config());
    let modes = [
        CorrespondenceMode::NearestNeighborXY,
        CorrespondenceMode::TrueNearestXY,
        CorrespondenceMode::TimeSynchronized,
        CorrespondenceMode::TimeBracketed,
    ];

    let mut last_report = None;
    for mode in modes {
        let mut last_percent = 0;
        let mut progress = |current: usize, total: usize| {
            let percent = current * 100 / total.max(1);
            if percent >= last_percent + 25 {
                last_percent = percent;
                tracing::debug!(%mode, percent, "progress");
            }
        };

        match engine.compute_with_progress(&reference.trajectory, &test.trajectory, mode, &mut progress)
        {
            Ok(report) => {
                println!("{:<22} lateral  {}", mode, report.lateral_statistics());
                println!("{:<22} vertical {}", "", report.abs_vertical_statistics());
                observability::record_report(&report);
                last_report = Some(report);
            }
            Err(e) => {
                println!("{:<22} failed: {}", mode, e);
                observability::record_run_failure(mode.as_str(), e.kind());
            }
        }
    }

    // ==== Stage 5: Dispatch ====
    let Some(report) = last_report else {
        return Err("no mode produced a report".into());
    };

    let bundle = ReportBundle::new("synthetic", report, test.trajectory)
        .with_table(test.table)
        .with_test_path(&blueprint.inputs.test);

    let (tx, rx) = mpsc::channel(1);
    let dispatcher =
        dispatcher::create_dispatcher(blueprint.sinks.clone(), blueprint.output_directory(), rx)
            .await?;
    let handle = dispatcher.spawn();
    tx.send(Arc::new(bundle)).await?;
    drop(tx);

    let outcome = handle.await?;
    for (name, snapshot) in &outcome.sinks {
        println!(
            "sink {name}: {} written, {} failed",
            snapshot.written,
            snapshot.failures()
        );
    }

    if let Some(metrics) = metrics {
        metrics.write_to(out_dir.join("metrics.prom"))?;
    }

    tracing::info!("Demo complete");
    Ok(())
}
