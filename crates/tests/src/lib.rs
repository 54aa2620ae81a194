//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Contract snapshots
//! - File -> loader -> engine -> sinks runs on synthetic trajectories
//! - Error propagation from malformed inputs

#[cfg(test)]
mod support {
    use contracts::{Trajectory, TrajectorySample};

    /// CSV text with a combined `timestamp` column
    pub fn trajectory_csv(traj: &Trajectory) -> String {
        let mut out = String::from("timestamp,x,y,z\n");
        for s in traj.iter() {
            let p = s.position;
            out.push_str(&format!("{},{},{},{}\n", s.timestamp, p.x, p.y, p.z));
        }
        out
    }

    /// Drop the first `n` samples
    pub fn skip_samples(traj: &Trajectory, n: usize) -> Trajectory {
        let samples: Vec<TrajectorySample> = traj.iter().skip(n).copied().collect();
        Trajectory::new(traj.name(), samples)
    }
}

#[cfg(test)]
mod contract_tests {
    use contracts::{ContractError, CorrespondenceMode, RunBlueprint};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_blueprint_defaults_snapshot() {
        let blueprint = RunBlueprint::new("ref.csv", "test.csv");
        assert_eq!(blueprint.engine.mode, CorrespondenceMode::NearestNeighborXY);
        assert_eq!(blueprint.columns.timestamp, "msg.header.stamp");
        let names: Vec<_> = blueprint.sinks.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["csv", "log"]);

        let engine = blueprint.to_engine_config();
        assert!(engine.validate_reference_order);
        assert_eq!(engine.degenerate_epsilon, 0.0);
    }

    #[test]
    fn test_ingestion_errors_map_to_schema() {
        let err = ingestion::TrajectoryLoader::default()
            .load_str("timestamp,x,y\n0,1,2\n", "test")
            .unwrap_err();
        let err: ContractError = err.into();
        assert_eq!(err.kind(), "schema");
        assert!(err.to_string().contains("test"));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::Path;
    use std::sync::Arc;

    use contracts::{
        ContractError, CorrespondenceMode, ErrorReport, ProjectionMode, ReportBundle, SinkConfig,
        SinkType,
    };
    use deviation_engine::{DeviationEngine, DeviationEngineConfig};
    use dispatcher::create_dispatcher;
    use ingestion::{LoadedTrajectory, MockTrajectory, TrajectoryLoader};
    use tokio::sync::mpsc;

    use crate::support::{skip_samples, trajectory_csv};

    const MODES: [CorrespondenceMode; 4] = [
        CorrespondenceMode::NearestNeighborXY,
        CorrespondenceMode::TrueNearestXY,
        CorrespondenceMode::TimeSynchronized,
        CorrespondenceMode::TimeBracketed,
    ];

    /// Straight reference along +x; test 0.75 m to the left and 0.3 m up,
    /// starting a few samples in so every mode has a predecessor.
    fn write_straight_pair(dir: &Path) -> (LoadedTrajectory, LoadedTrajectory) {
        let reference = MockTrajectory::straight("reference", 100, 10.0, 1.0);
        let test = MockTrajectory::straight("test", 80, 10.0, 1.0)
            .with_lateral_offset(0.75)
            .with_height(0.3)
            .with_start_time(0.05)
            .generate();

        let ref_path = dir.join("reference.csv");
        let test_path = dir.join("test.csv");
        std::fs::write(&ref_path, reference.to_csv()).unwrap();
        std::fs::write(&test_path, trajectory_csv(&skip_samples(&test, 3))).unwrap();

        let loader = TrajectoryLoader::default();
        (
            loader.load_path(&ref_path, "reference").unwrap(),
            loader.load_path(&test_path, "test").unwrap(),
        )
    }

    fn load_pair(reference_csv: &str, test_csv: &str) -> (LoadedTrajectory, LoadedTrajectory) {
        let loader = TrajectoryLoader::default();
        (
            loader.load_str(reference_csv, "reference").unwrap(),
            loader.load_str(test_csv, "test").unwrap(),
        )
    }

    fn compute(
        reference: &LoadedTrajectory,
        test: &LoadedTrajectory,
        mode: CorrespondenceMode,
    ) -> Result<ErrorReport, ContractError> {
        DeviationEngine::new(DeviationEngineConfig::default()).compute(
            &reference.trajectory,
            &test.trajectory,
            mode,
        )
    }

    /// End-to-end: CSV files -> loader -> engine, every mode
    #[test]
    fn test_e2e_constant_offset_all_modes() {
        let dir = tempfile::tempdir().unwrap();
        let (reference, test) = write_straight_pair(dir.path());
        assert_eq!(test.trajectory.len(), 77);

        for mode in MODES {
            let report = compute(&reference, &test, mode)
                .unwrap_or_else(|e| panic!("{mode} failed: {e}"));
            assert_eq!(report.len(), test.trajectory.len());
            assert_eq!(report.records[0].elapsed_time, 0.0);

            for record in &report.records {
                assert!(
                    (record.lateral_error - 0.75).abs() < 1e-9,
                    "{mode} sample {}: lateral {}",
                    record.sample_index,
                    record.lateral_error
                );
                assert!((record.vertical_error - 0.3).abs() < 1e-9);
                assert!(record.error_point[1].abs() < 1e-9);
            }
        }
    }

    /// End-to-end: engine -> dispatcher -> CSV + JSON files
    #[tokio::test]
    async fn test_e2e_reports_written() {
        let dir = tempfile::tempdir().unwrap();
        let (reference, test) = write_straight_pair(dir.path());
        let report = compute(&reference, &test, CorrespondenceMode::TimeBracketed).unwrap();
        let records = report.len();

        let bundle = ReportBundle::new("e2e", report, test.trajectory)
            .with_table(test.table)
            .with_test_path(dir.path().join("test.csv"));

        let out_dir = dir.path().join("out");
        let (tx, rx) = mpsc::channel(1);
        let sinks = vec![
            SinkConfig::new("csv", SinkType::Csv),
            SinkConfig::new("summary", SinkType::Summary),
            SinkConfig::new("log", SinkType::Log),
        ];
        let dispatcher = create_dispatcher(sinks, &out_dir, rx).await.unwrap();
        let handle = dispatcher.spawn();
        tx.send(Arc::new(bundle)).await.unwrap();
        drop(tx);

        let outcome = handle.await.unwrap();
        assert!(outcome.is_clean(), "failed sinks: {:?}", outcome.failed_sinks());

        let table = std::fs::read_to_string(out_dir.join("test_log.csv")).unwrap();
        let mut lines = table.lines();
        assert_eq!(
            lines.next().unwrap(),
            "timestamp,x,y,z,elapsed_time,xy_err,z_err,error_point.x,error_point.y"
        );
        assert_eq!(lines.count(), records);

        let summary: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(out_dir.join("test_summary.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(summary["mode"], "time_bracketed");
        assert_eq!(summary["records"], records);
        assert!((summary["lateral"]["rmse"].as_f64().unwrap() - 0.75).abs() < 1e-9);
    }

    /// Reference samples at t = 0..3 on the x axis, one test sample at t = 1.4
    #[test]
    fn test_time_modes_on_unit_reference() {
        let (reference, test) = load_pair(
            "sec,nanosec,x,y,z\n0,0,0,0,0\n1,0,1,0,0\n2,0,2,0,0\n3,0,3,0,0\n",
            "sec,nanosec,x,y,z\n1,400000000,1.4,0.5,0\n",
        );

        let bracketed = compute(&reference, &test, CorrespondenceMode::TimeBracketed).unwrap();
        assert_eq!(bracketed.records[0].bracket, (1, 2));
        assert!((bracketed.records[0].lateral_error - 0.5).abs() < 1e-9);

        let synced = compute(&reference, &test, CorrespondenceMode::TimeSynchronized).unwrap();
        assert_eq!(synced.records[0].bracket, (1, 0));
        assert!((synced.records[0].lateral_error - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_running_minimum_pairs_last_two_pushes() {
        let (reference, test) = load_pair(
            "timestamp,x,y,z\n0,0,0,0\n1,5,0,0\n2,10,0,0\n",
            "timestamp,x,y,z\n0,9,0,0\n",
        );
        let report = compute(&reference, &test, CorrespondenceMode::NearestNeighborXY).unwrap();
        assert_eq!(report.records[0].bracket, (2, 1));
        assert!(report.records[0].lateral_error.abs() < 1e-12);
    }

    #[test]
    fn test_vertical_sign_follows_height() {
        let (reference, test) = load_pair(
            "timestamp,x,y,z\n0,0,0,1\n1,1,0,1\n2,2,0,1\n",
            "timestamp,x,y,z\n0.5,0.5,0.1,0.25\n1.5,1.5,0.1,1.75\n",
        );
        let report = compute(&reference, &test, CorrespondenceMode::TimeBracketed).unwrap();
        assert!((report.records[0].vertical_error + 0.75).abs() < 1e-12);
        assert!((report.records[1].vertical_error - 0.75).abs() < 1e-12);
        assert_eq!(report.records[1].elapsed_time, 1.0);
    }

    #[test]
    fn test_degenerate_reference_aborts() {
        let (reference, test) = load_pair(
            "timestamp,x,y,z\n0,1,1,0\n1,1,1,0\n",
            "timestamp,x,y,z\n0.5,2,2,0\n",
        );
        let err = compute(&reference, &test, CorrespondenceMode::TimeBracketed).unwrap_err();
        assert!(matches!(
            err,
            ContractError::DegenerateSegment { sample_index: 0, .. }
        ));
    }

    #[test]
    fn test_single_sample_reference_rejected() {
        let (reference, test) = load_pair("timestamp,x,y,z\n0,0,0,0\n", "timestamp,x,y,z\n0,1,1,0\n");
        for mode in MODES {
            let err = compute(&reference, &test, mode).unwrap_err();
            assert_eq!(err.kind(), "insufficient_data", "{mode}");
        }
    }

    #[test]
    fn test_unsorted_reference_rejected_in_time_modes() {
        let (reference, test) = load_pair(
            "timestamp,x,y,z\n0,0,0,0\n2,2,0,0\n1,1,0,0\n",
            "timestamp,x,y,z\n0.5,0.5,1,0\n",
        );
        let err = compute(&reference, &test, CorrespondenceMode::TimeSynchronized).unwrap_err();
        assert_eq!(err.kind(), "schema");
    }

    #[test]
    fn test_compute_is_idempotent() {
        let reference = MockTrajectory::circle("reference", 120, 10.0, 20.0, 0.3);
        let test = MockTrajectory::circle("test", 100, 10.0, 20.0, 0.3)
            .with_wobble(0.4)
            .with_start_time(0.5);
        let (reference, test) = load_pair(&reference.to_csv(), &test.to_csv());

        let first = compute(&reference, &test, CorrespondenceMode::TrueNearestXY).unwrap();
        let second = compute(&reference, &test, CorrespondenceMode::TrueNearestXY).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_segment_projection_stays_on_bracket() {
        let (reference, test) = load_pair(
            "timestamp,x,y,z\n0,0,0,0\n1,1,0,0\n2,2,1,0\n",
            "timestamp,x,y,z\n1.5,5,0,0\n",
        );
        let engine = DeviationEngine::new(
            DeviationEngineConfig::default().with_projection(ProjectionMode::Segment),
        );
        let report = engine
            .compute(
                &reference.trajectory,
                &test.trajectory,
                CorrespondenceMode::TimeBracketed,
            )
            .unwrap();
        let record = report.records[0];
        assert_eq!(record.bracket, (1, 2));
        assert!((record.error_point[0] - 2.0).abs() < 1e-12);
        assert!((record.error_point[1] - 1.0).abs() < 1e-12);
    }

    /// Config file with custom column names drives loader and engine
    #[test]
    fn test_config_driven_run() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("ref.csv"),
            "t,px,py,pz\n0,0,0,0\n1,10,0,0\n2,20,0,0\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("run.csv"), "t,px,py,pz\n0.5,5,-2,1\n1.5,15,-2,1\n")
            .unwrap();
        let config = dir.path().join("run.toml");
        std::fs::write(
            &config,
            r#"
[inputs]
reference = "ref.csv"
test = "run.csv"

[columns]
timestamp = "t"
x = "px"
y = "py"
z = "pz"

[engine]
mode = "time_bracketed"
projection = "segment"
"#,
        )
        .unwrap();

        let blueprint = config_loader::ConfigLoader::load_from_path(&config).unwrap();
        let loader = TrajectoryLoader::new(blueprint.columns.clone());
        let reference = loader.load_path(&blueprint.inputs.reference, "reference").unwrap();
        let test = loader.load_path(&blueprint.inputs.test, "test").unwrap();

        let report = DeviationEngine::new(blueprint.to_engine_config())
            .compute(&reference.trajectory, &test.trajectory, blueprint.engine.mode)
            .unwrap();
        assert_eq!(report.projection, ProjectionMode::Segment);
        assert_eq!(report.records[0].bracket, (0, 1));
        assert_eq!(report.records[1].bracket, (1, 2));
        for record in &report.records {
            assert!((record.lateral_error - 2.0).abs() < 1e-12);
            assert!((record.vertical_error - 1.0).abs() < 1e-12);
        }
        assert_eq!(blueprint.output_directory(), dir.path());
    }
}
