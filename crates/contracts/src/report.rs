//! ErrorReport - DeviationEngine output
//!
//! One [`ErrorRecord`] per test sample, in test order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::{CorrespondenceMode, ProjectionMode, SourceTable, Trajectory};

/// Deviation of one test sample from the reference path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Index into the test trajectory
    pub sample_index: usize,

    /// Seconds since the first test sample
    pub elapsed_time: f64,

    /// Horizontal distance to the bracketing line (>= 0)
    pub lateral_error: f64,

    /// Signed `test.z - ref_a.z`
    pub vertical_error: f64,

    /// Foot of the perpendicular in xy
    pub error_point: [f64; 2],

    /// Reference indices `(ref_a, ref_b)` used for this sample
    pub bracket: (usize, usize),
}

/// Ordered deviation records of one comparison run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub mode: CorrespondenceMode,
    pub projection: ProjectionMode,
    pub records: Vec<ErrorRecord>,
}

impl ErrorReport {
    pub fn new(mode: CorrespondenceMode, projection: ProjectionMode, records: Vec<ErrorRecord>) -> Self {
        Self {
            mode,
            projection,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ErrorRecord> {
        self.records.iter()
    }

    pub fn lateral_statistics(&self) -> ErrorStatistics {
        let values: Vec<f64> = self.records.iter().map(|r| r.lateral_error).collect();
        ErrorStatistics::from_values(&values)
    }

    /// Statistics over the signed vertical errors
    pub fn vertical_statistics(&self) -> ErrorStatistics {
        let values: Vec<f64> = self.records.iter().map(|r| r.vertical_error).collect();
        ErrorStatistics::from_values(&values)
    }

    /// Statistics over vertical error magnitudes
    pub fn abs_vertical_statistics(&self) -> ErrorStatistics {
        let values: Vec<f64> = self.records.iter().map(|r| r.vertical_error.abs()).collect();
        ErrorStatistics::from_values(&values)
    }
}

/// Summary statistics of an error series
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorStatistics {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub rmse: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

impl ErrorStatistics {
    /// Compute statistics; all zero for an empty series.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let count = values.len();
        let n = count as f64;

        let mean = values.iter().sum::<f64>() / n;
        let rmse = (values.iter().map(|v| v * v).sum::<f64>() / n).sqrt();
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let median = if count % 2 == 0 {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        } else {
            sorted[count / 2]
        };

        Self {
            count,
            mean,
            std: variance.sqrt(),
            rmse,
            min,
            max,
            median,
        }
    }
}

impl fmt::Display for ErrorStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} rmse={:.4} mean={:.4} std={:.4} min={:.4} max={:.4} median={:.4}",
            self.count, self.rmse, self.mean, self.std, self.min, self.max, self.median
        )
    }
}

/// Everything a sink needs to render one finished run
#[derive(Debug, Clone)]
pub struct ReportBundle {
    /// Unique identifier of the run
    pub run_id: String,

    /// Computed deviations
    pub report: ErrorReport,

    /// Test trajectory the report refers to
    pub test: Trajectory,

    /// Raw rows of the test input, row-aligned with `test`
    pub test_table: Option<SourceTable>,

    /// Where the test trajectory was read from
    pub test_path: Option<PathBuf>,

    /// Column to carry the combined sample timestamp when the test table
    /// only has split `sec`/`nanosec` stamps
    pub stamp_column: Option<String>,
}

impl ReportBundle {
    pub fn new(run_id: impl Into<String>, report: ErrorReport, test: Trajectory) -> Self {
        Self {
            run_id: run_id.into(),
            report,
            test,
            test_table: None,
            test_path: None,
            stamp_column: None,
        }
    }

    pub fn with_table(mut self, table: SourceTable) -> Self {
        self.test_table = Some(table);
        self
    }

    pub fn with_test_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.test_path = Some(path.into());
        self
    }

    pub fn with_stamp_column(mut self, column: impl Into<String>) -> Self {
        self.stamp_column = Some(column.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: usize, lateral: f64, vertical: f64) -> ErrorRecord {
        ErrorRecord {
            sample_index: index,
            elapsed_time: index as f64,
            lateral_error: lateral,
            vertical_error: vertical,
            error_point: [0.0, 0.0],
            bracket: (1, 0),
        }
    }

    #[test]
    fn test_statistics_basic() {
        let stats = ErrorStatistics::from_values(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(stats.count, 4);
        assert!((stats.mean - 2.5).abs() < 1e-12);
        assert!((stats.median - 2.5).abs() < 1e-12);
        assert!((stats.rmse - (30.0f64 / 4.0).sqrt()).abs() < 1e-12);
        assert!((stats.std - 1.25f64.sqrt()).abs() < 1e-12);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
    }

    #[test]
    fn test_statistics_empty() {
        let stats = ErrorStatistics::from_values(&[]);
        assert_eq!(stats, ErrorStatistics::default());
    }

    #[test]
    fn test_vertical_signed_and_abs() {
        let report = ErrorReport::new(
            CorrespondenceMode::TimeSynchronized,
            ProjectionMode::Line,
            vec![record(0, 1.0, -2.0), record(1, 3.0, 2.0)],
        );
        assert!((report.vertical_statistics().mean).abs() < 1e-12);
        assert!((report.abs_vertical_statistics().mean - 2.0).abs() < 1e-12);
        assert!((report.lateral_statistics().max - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_statistics_display() {
        let text = ErrorStatistics::from_values(&[1.0]).to_string();
        assert!(text.starts_with("n=1 rmse=1.0000"));
    }
}
