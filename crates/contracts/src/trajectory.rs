//! Trajectory - Ingestion output
//!
//! Timestamped 3D samples in a shared planar frame.

use serde::{Deserialize, Serialize};

/// 3D position in planar units (e.g. meters)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Horizontal components
    pub fn xy(&self) -> [f64; 2] {
        [self.x, self.y]
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One recorded pose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    /// Seconds
    pub timestamp: f64,

    /// Position
    pub position: Position,
}

impl TrajectorySample {
    pub fn new(timestamp: f64, position: Position) -> Self {
        Self {
            timestamp,
            position,
        }
    }

    /// Build a sample from a split `sec` + `nanosec` stamp
    pub fn from_stamp(sec: i64, nanosec: i64, position: Position) -> Self {
        Self::new(sec as f64 + nanosec as f64 / 1_000_000_000.0, position)
    }
}

/// Ordered sequence of samples
///
/// Immutable for the duration of a comparison run. `name` is the role label
/// ("reference" / "test") used in errors and logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    name: String,
    samples: Vec<TrajectorySample>,
}

impl Trajectory {
    pub fn new(name: impl Into<String>, samples: Vec<TrajectorySample>) -> Self {
        Self {
            name: name.into(),
            samples,
        }
    }

    /// Build from `(timestamp, x, y, z)` tuples
    pub fn from_tuples(name: impl Into<String>, points: &[(f64, f64, f64, f64)]) -> Self {
        let samples = points
            .iter()
            .map(|&(t, x, y, z)| TrajectorySample::new(t, Position::new(x, y, z)))
            .collect();
        Self::new(name, samples)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn samples(&self) -> &[TrajectorySample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrajectorySample> {
        self.samples.get(index)
    }

    pub fn first(&self) -> Option<&TrajectorySample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&TrajectorySample> {
        self.samples.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrajectorySample> {
        self.samples.iter()
    }

    /// First timestamp, if any
    pub fn start_time(&self) -> Option<f64> {
        self.first().map(|s| s.timestamp)
    }

    /// Last minus first timestamp (0 for fewer than two samples)
    pub fn duration(&self) -> f64 {
        match (self.first(), self.last()) {
            (Some(a), Some(b)) => b.timestamp - a.timestamp,
            _ => 0.0,
        }
    }

    /// Index of the first sample whose timestamp is lower than its predecessor's
    pub fn first_time_inversion(&self) -> Option<usize> {
        self.samples
            .windows(2)
            .position(|w| w[1].timestamp < w[0].timestamp)
            .map(|i| i + 1)
    }

    /// Timestamps are non-decreasing
    pub fn is_time_ordered(&self) -> bool {
        self.first_time_inversion().is_none()
    }

    /// Index of the first sample carrying a non-finite timestamp or coordinate
    pub fn first_non_finite(&self) -> Option<usize> {
        self.samples
            .iter()
            .position(|s| !s.timestamp.is_finite() || !s.position.is_finite())
    }

    /// Total horizontal path length
    pub fn path_length_xy(&self) -> f64 {
        self.samples
            .windows(2)
            .map(|w| {
                let dx = w[1].position.x - w[0].position.x;
                let dy = w[1].position.y - w[0].position.y;
                (dx * dx + dy * dy).sqrt()
            })
            .sum()
    }

    /// Axis-aligned xy bounds as `([min_x, min_y], [max_x, max_y])`
    pub fn bounds_xy(&self) -> Option<([f64; 2], [f64; 2])> {
        let first = self.first()?;
        let init = (first.position.xy(), first.position.xy());
        Some(self.samples.iter().fold(init, |(lo, hi), s| {
            (
                [lo[0].min(s.position.x), lo[1].min(s.position.y)],
                [hi[0].max(s.position.x), hi[1].max(s.position.y)],
            )
        }))
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a TrajectorySample;
    type IntoIter = std::slice::Iter<'a, TrajectorySample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// Raw tabular source of a trajectory
///
/// Row-aligned with the trajectory built from it, so writers can echo the
/// original columns next to the computed ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceTable {
    /// Header row
    pub headers: Vec<String>,

    /// Data rows, each with `headers.len()` cells
    pub rows: Vec<Vec<String>>,
}

impl SourceTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Position of a column by exact header name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
