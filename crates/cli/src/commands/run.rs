//! `run` command implementation.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use contracts::{RunBlueprint, SinkConfig, SinkType};
use observability::{record_run_failure, record_run_success, MetricsHandle};
use tracing::{error, info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let blueprint = resolve_blueprint(args)?;

    info!(
        reference = %blueprint.inputs.reference.display(),
        test = %blueprint.inputs.test.display(),
        mode = %blueprint.engine.mode,
        projection = %blueprint.engine.projection,
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let metrics_path = args
        .metrics_out
        .clone()
        .or_else(|| blueprint.output.metrics_file.clone());
    let metrics = match metrics_path {
        Some(_) => Some(observability::install_metrics_recorder()?),
        None => None,
    };

    let mode = blueprint.engine.mode;
    let run_id = make_run_id(&blueprint.inputs.test);
    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        run_id,
    });

    // Setup graceful shutdown handler
    let cancel = Arc::new(AtomicBool::new(false));
    let watcher = {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            shutdown_signal().await;
            warn!("Received shutdown signal, stopping after the current sample...");
            cancel.store(true, Ordering::Relaxed);
        })
    };

    info!("Starting pipeline...");
    let result = pipeline.run(cancel).await;
    watcher.abort();

    match &result {
        Ok(stats) => {
            record_run_success(mode.as_str(), stats.records, stats.duration.as_secs_f64());
            stats.print_summary();
        }
        Err(e) => record_run_failure(mode.as_str(), e.kind()),
    }

    if let (Some(handle), Some(path)) = (metrics.as_ref(), metrics_path.as_deref()) {
        write_metrics(handle, path);
    }

    result.context("Pipeline execution failed")?;
    info!("trajdev finished");
    Ok(())
}

/// Build the run blueprint from the config file and CLI overrides, then validate it
pub(crate) fn resolve_blueprint(args: &RunArgs) -> Result<RunBlueprint> {
    let mut blueprint = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => match (&args.reference, &args.test) {
            (Some(reference), Some(test)) => RunBlueprint::new(reference, test),
            _ => {
                return Err(CliError::missing_input(
                    "pass --config, or both --reference and --test",
                )
                .into())
            }
        },
    };

    // Apply CLI overrides
    if let Some(ref reference) = args.reference {
        blueprint.inputs.reference = reference.clone();
    }
    if let Some(ref test) = args.test {
        blueprint.inputs.test = test.clone();
    }
    if let Some(mode) = args.mode {
        blueprint.engine.mode = mode.into();
    }
    if let Some(projection) = args.projection {
        blueprint.engine.projection = projection.into();
    }
    if let Some(epsilon) = args.epsilon {
        blueprint.engine.degenerate_epsilon = epsilon;
    }
    if args.no_order_check {
        blueprint.engine.validate_reference_order = false;
    }
    if let Some(ref output) = args.output {
        blueprint.output.directory = Some(output.clone());
    }
    if args.summary && !blueprint.sinks.iter().any(|s| s.sink_type == SinkType::Summary) {
        blueprint
            .sinks
            .push(SinkConfig::new("summary", SinkType::Summary));
    }

    config_loader::ConfigLoader::validate(&blueprint).context("Invalid run configuration")?;
    Ok(blueprint)
}

/// `<test stem>-<UTC timestamp>`
fn make_run_id(test: &Path) -> String {
    let stem = test
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "run".to_string());
    format!("{stem}-{}", chrono::Utc::now().format("%Y%m%dT%H%M%SZ"))
}

fn write_metrics(handle: &MetricsHandle, path: &Path) {
    if let Err(e) = handle.write_to(path) {
        error!(path = %path.display(), error = %e, "Failed to write metrics snapshot");
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &RunBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Inputs:");
    println!("  Reference: {}", blueprint.inputs.reference.display());
    println!("  Test: {}", blueprint.inputs.test.display());

    let columns = &blueprint.columns;
    println!(
        "  Columns: time={} (or {}+{}), x={}, y={}, z={}",
        columns.timestamp, columns.sec, columns.nanosec, columns.x, columns.y, columns.z
    );

    println!("\nEngine:");
    println!("  Mode: {}", blueprint.engine.mode);
    println!("  Projection: {}", blueprint.engine.projection);
    println!("  Degenerate epsilon: {}", blueprint.engine.degenerate_epsilon);
    println!(
        "  Reference order check: {}",
        blueprint.engine.validate_reference_order
    );

    println!("\nOutput: {}", blueprint.output_directory().display());
    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{ModeArg, ProjectionArg};
    use contracts::{CorrespondenceMode, ProjectionMode};
    use std::path::PathBuf;

    #[test]
    fn test_blueprint_from_flags() {
        let args = RunArgs {
            reference: Some("ref.csv".into()),
            test: Some("data/test.csv".into()),
            mode: Some(ModeArg::TimeBracketed),
            projection: Some(ProjectionArg::Segment),
            epsilon: Some(1e-6),
            summary: true,
            ..Default::default()
        };

        let blueprint = resolve_blueprint(&args).unwrap();
        assert_eq!(blueprint.engine.mode, CorrespondenceMode::TimeBracketed);
        assert_eq!(blueprint.engine.projection, ProjectionMode::Segment);
        assert_eq!(blueprint.engine.degenerate_epsilon, 1e-6);
        assert_eq!(blueprint.output_directory(), PathBuf::from("data"));
        assert!(blueprint.sinks.iter().any(|s| s.sink_type == SinkType::Summary));
    }

    #[test]
    fn test_missing_inputs_rejected() {
        let args = RunArgs {
            reference: Some("ref.csv".into()),
            ..Default::default()
        };
        let err = resolve_blueprint(&args).unwrap_err();
        assert!(err.to_string().contains("--reference and --test"));
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("run.toml");
        std::fs::write(
            &config,
            r#"
[inputs]
reference = "ref.csv"
test = "test.csv"

[engine]
mode = "nearest_neighbor_xy"
"#,
        )
        .unwrap();

        let args = RunArgs {
            config: Some(config),
            mode: Some(ModeArg::TimeSynchronized),
            output: Some("out".into()),
            no_order_check: true,
            ..Default::default()
        };
        let blueprint = resolve_blueprint(&args).unwrap();
        assert_eq!(blueprint.engine.mode, CorrespondenceMode::TimeSynchronized);
        assert!(!blueprint.engine.validate_reference_order);
        assert_eq!(blueprint.output_directory(), PathBuf::from("out"));
        assert_eq!(blueprint.inputs.test, dir.path().join("test.csv"));
    }

    #[test]
    fn test_negative_epsilon_rejected() {
        let args = RunArgs {
            reference: Some("ref.csv".into()),
            test: Some("test.csv".into()),
            epsilon: Some(-1.0),
            ..Default::default()
        };
        assert!(resolve_blueprint(&args).is_err());
    }

    #[test]
    fn test_run_id_uses_test_stem() {
        let id = make_run_id(Path::new("/data/lap_02.csv"));
        assert!(id.starts_with("lap_02-"), "got {id}");
    }
}
