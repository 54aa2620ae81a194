//! Trajectory CSV loader
//!
//! Maps header columns to samples. The timestamp comes from a combined
//! seconds column when present, otherwise from integer `sec` + `nanosec`.

use std::path::Path;
use std::sync::Arc;

use contracts::{ColumnConfig, Position, SourceTable, Trajectory, TrajectorySample};
use tracing::{debug, instrument};

use crate::config::IngestionMetrics;
use crate::csv::{parse_document, CsvRow};
use crate::error::{IngestionError, Result};

/// Alternative name accepted for the combined timestamp column
pub const TIMESTAMP_ALIAS: &str = "timestamp";

/// Trajectory plus the raw table it was read from
#[derive(Debug, Clone)]
pub struct LoadedTrajectory {
    pub trajectory: Trajectory,
    pub table: SourceTable,
    pub time_source: TimeSource,
}

/// Where sample timestamps were taken from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeSource {
    /// Combined seconds column
    Combined(String),
    /// `sec` + `nanosec` integer columns
    Split { sec: String, nanosec: String },
}

#[derive(Debug, Clone, Copy)]
enum TimeColumns {
    Combined(usize),
    Split { sec: usize, nanosec: usize },
}

#[derive(Debug, Clone, Copy)]
struct ResolvedColumns {
    time: TimeColumns,
    x: usize,
    y: usize,
    z: usize,
}

/// CSV trajectory loader
#[derive(Debug, Clone, Default)]
pub struct TrajectoryLoader {
    columns: ColumnConfig,
    metrics: Option<Arc<IngestionMetrics>>,
}

impl TrajectoryLoader {
    pub fn new(columns: ColumnConfig) -> Self {
        Self {
            columns,
            metrics: None,
        }
    }

    /// Share a metrics instance across loads
    pub fn with_metrics(mut self, metrics: Arc<IngestionMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn columns(&self) -> &ColumnConfig {
        &self.columns
    }

    /// Load a trajectory file; `name` is the role label ("reference" / "test").
    #[instrument(name = "trajectory_load", skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn load_path(&self, path: impl AsRef<Path>, name: &str) -> Result<LoadedTrajectory> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| IngestionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_str(&text, name)
    }

    /// Parse CSV text
    pub fn load_str(&self, text: &str, name: &str) -> Result<LoadedTrajectory> {
        let doc = parse_document(text, name).inspect_err(|_| self.record_parse_error())?;
        let resolved = self.resolve_columns(&doc.headers, name)?;

        let mut samples = Vec::with_capacity(doc.rows.len());
        for row in &doc.rows {
            let sample = self
                .parse_sample(row, &doc.headers, &resolved, name)
                .inspect_err(|_| self.record_parse_error())?;
            samples.push(sample);
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_rows(samples.len() as u64);
            metrics.record_skipped(doc.skipped_blank as u64);
        }
        metrics::counter!("trajdev_rows_loaded_total", "trajectory" => name.to_string())
            .increment(samples.len() as u64);

        let time_source = match resolved.time {
            TimeColumns::Combined(idx) => TimeSource::Combined(doc.headers[idx].clone()),
            TimeColumns::Split { sec, nanosec } => TimeSource::Split {
                sec: doc.headers[sec].clone(),
                nanosec: doc.headers[nanosec].clone(),
            },
        };

        debug!(
            trajectory = name,
            samples = samples.len(),
            skipped_blank = doc.skipped_blank,
            time_source = ?time_source,
            "trajectory loaded"
        );

        let rows = doc.rows.into_iter().map(|row| row.fields).collect();
        Ok(LoadedTrajectory {
            trajectory: Trajectory::new(name, samples),
            table: SourceTable::new(doc.headers, rows),
            time_source,
        })
    }

    fn record_parse_error(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.record_parse_error();
        }
    }

    fn resolve_columns(&self, headers: &[String], name: &str) -> Result<ResolvedColumns> {
        let find = |column: &str| headers.iter().position(|h| h == column);
        let require = |column: &str| {
            find(column).ok_or_else(|| IngestionError::MissingColumn {
                source_name: name.to_string(),
                column: column.to_string(),
            })
        };

        let time = match find(&self.columns.timestamp).or_else(|| find(TIMESTAMP_ALIAS)) {
            Some(idx) => TimeColumns::Combined(idx),
            None => match (find(&self.columns.sec), find(&self.columns.nanosec)) {
                (Some(sec), Some(nanosec)) => TimeColumns::Split { sec, nanosec },
                _ => {
                    return Err(IngestionError::MissingColumn {
                        source_name: name.to_string(),
                        column: format!(
                            "{} (or {} + {})",
                            self.columns.timestamp, self.columns.sec, self.columns.nanosec
                        ),
                    })
                }
            },
        };

        Ok(ResolvedColumns {
            time,
            x: require(&self.columns.x)?,
            y: require(&self.columns.y)?,
            z: require(&self.columns.z)?,
        })
    }

    fn parse_sample(
        &self,
        row: &CsvRow,
        headers: &[String],
        columns: &ResolvedColumns,
        name: &str,
    ) -> Result<TrajectorySample> {
        let float = |idx: usize| parse_cell::<f64>(row, idx, headers, name);

        let position = Position::new(float(columns.x)?, float(columns.y)?, float(columns.z)?);
        let sample = match columns.time {
            TimeColumns::Combined(idx) => TrajectorySample::new(float(idx)?, position),
            TimeColumns::Split { sec, nanosec } => TrajectorySample::from_stamp(
                parse_cell::<i64>(row, sec, headers, name)?,
                parse_cell::<i64>(row, nanosec, headers, name)?,
                position,
            ),
        };
        Ok(sample)
    }
}

fn parse_cell<T>(row: &CsvRow, idx: usize, headers: &[String], name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = row.fields[idx].trim();
    raw.parse::<T>().map_err(|e| IngestionError::ParseFailed {
        source_name: name.to_string(),
        line: row.line,
        column: headers[idx].clone(),
        message: format!("'{raw}': {e}"),
    })
}
