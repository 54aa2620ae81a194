//! `info` command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use contracts::ColumnConfig;
use ingestion::{LoadedTrajectory, TimeSource, TrajectoryLoader};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Trajectory info for JSON output
#[derive(Serialize)]
struct TrajectoryInfo {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<TrajectoryDetails>,
}

#[derive(Serialize)]
struct TrajectoryDetails {
    samples: usize,
    time_source: String,
    start_time: Option<f64>,
    duration: f64,
    mean_rate_hz: f64,
    path_length_xy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    bounds_xy: Option<([f64; 2], [f64; 2])>,
    time_ordered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_time_inversion: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    columns: Vec<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let (columns, files) = collect_inputs(args)?;
    if files.is_empty() {
        anyhow::bail!("No trajectory files given (pass files or --config)");
    }

    info!(files = files.len(), "Describing trajectories");
    let loader = TrajectoryLoader::new(columns);
    let infos: Vec<TrajectoryInfo> = files
        .iter()
        .map(|path| describe(&loader, path, args.columns))
        .collect();

    if args.json {
        let json =
            serde_json::to_string_pretty(&infos).context("Failed to serialize trajectory info")?;
        println!("{}", json);
    } else {
        print_trajectory_info(&infos);
    }

    let failed = infos.iter().filter(|i| i.error.is_some()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} trajectories could not be loaded", failed, infos.len());
    }
    Ok(())
}

/// Column names and files from the optional config plus positional files
fn collect_inputs(args: &InfoArgs) -> Result<(ColumnConfig, Vec<PathBuf>)> {
    let mut files = Vec::new();
    let columns = match &args.config {
        Some(path) => {
            let blueprint = config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            files.push(blueprint.inputs.reference.clone());
            files.push(blueprint.inputs.test.clone());
            blueprint.columns
        }
        None => ColumnConfig::default(),
    };
    files.extend(args.files.iter().cloned());
    Ok((columns, files))
}

fn describe(loader: &TrajectoryLoader, path: &Path, with_columns: bool) -> TrajectoryInfo {
    let role = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    match loader.load_path(path, &role) {
        Ok(loaded) => TrajectoryInfo {
            path: path.display().to_string(),
            error: None,
            details: Some(details(&loaded, with_columns)),
        },
        Err(e) => TrajectoryInfo {
            path: path.display().to_string(),
            error: Some(e.to_string()),
            details: None,
        },
    }
}

fn details(loaded: &LoadedTrajectory, with_columns: bool) -> TrajectoryDetails {
    let traj = &loaded.trajectory;
    let duration = traj.duration();
    let mean_rate_hz = if duration > 0.0 {
        (traj.len() - 1) as f64 / duration
    } else {
        0.0
    };

    TrajectoryDetails {
        samples: traj.len(),
        time_source: match &loaded.time_source {
            TimeSource::Combined(column) => column.clone(),
            TimeSource::Split { sec, nanosec } => format!("{sec} + {nanosec}"),
        },
        start_time: traj.start_time(),
        duration,
        mean_rate_hz,
        path_length_xy: traj.path_length_xy(),
        bounds_xy: traj.bounds_xy(),
        time_ordered: traj.is_time_ordered(),
        first_time_inversion: traj.first_time_inversion(),
        columns: if with_columns {
            loaded.table.headers.clone()
        } else {
            Vec::new()
        },
    }
}

fn print_trajectory_info(infos: &[TrajectoryInfo]) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                     Trajectory Inputs                        ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    for info in infos {
        println!("📍 {}", info.path);
        if let Some(ref error) = info.error {
            println!("   └─ Error: {}\n", error);
            continue;
        }
        let Some(ref d) = info.details else { continue };

        println!("   ├─ Samples: {}", d.samples);
        println!("   ├─ Time: {}", d.time_source);
        if let Some(start) = d.start_time {
            println!(
                "   ├─ Span: {:.3}s from {:.3} ({:.1} Hz)",
                d.duration, start, d.mean_rate_hz
            );
        }
        println!("   ├─ Path length (xy): {:.3}", d.path_length_xy);
        if let Some((lo, hi)) = d.bounds_xy {
            println!(
                "   ├─ Bounds: x [{:.3}, {:.3}], y [{:.3}, {:.3}]",
                lo[0], hi[0], lo[1], hi[1]
            );
        }
        if !d.columns.is_empty() {
            println!("   ├─ Columns: {}", d.columns.join(", "));
        }
        match d.first_time_inversion {
            None => println!("   └─ Time ordered: yes"),
            Some(index) => println!("   └─ Time ordered: no (first inversion at row {})", index),
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingestion::MockTrajectory;

    #[test]
    fn test_describe_mock_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lap.csv");
        std::fs::write(&path, MockTrajectory::straight("lap", 11, 10.0, 2.0).to_csv()).unwrap();

        let info = describe(&TrajectoryLoader::default(), &path, true);
        assert!(info.error.is_none());
        let d = info.details.unwrap();
        assert_eq!(d.samples, 11);
        assert_eq!(d.time_source, "sec + nanosec");
        assert!((d.mean_rate_hz - 10.0).abs() < 1e-6);
        assert!((d.path_length_xy - 2.0).abs() < 1e-6);
        assert!(d.time_ordered);
        assert_eq!(d.columns.len(), 6);
    }

    #[test]
    fn test_describe_missing_file() {
        let info = describe(&TrajectoryLoader::default(), Path::new("/nope/missing.csv"), false);
        assert!(info.error.is_some());
        assert!(info.details.is_none());
    }
}
