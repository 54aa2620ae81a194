//! Correspondence and projection modes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy selecting the bracketing reference pair for each test sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrespondenceMode {
    /// Running-minimum xy scan; the pair is the last two improvements found.
    /// Reproduces historical outputs, not the two globally nearest points.
    #[default]
    #[serde(rename = "nearest_neighbor_xy")]
    NearestNeighborXY,
    /// The two globally nearest reference points in xy
    #[serde(rename = "true_nearest_xy")]
    TrueNearestXY,
    /// Reference sample nearest in time and its predecessor
    TimeSynchronized,
    /// Reference pair whose timestamps straddle the test timestamp
    TimeBracketed,
}

impl CorrespondenceMode {
    /// Bracket selection uses timestamps (reference must be time-ordered)
    pub fn is_time_based(&self) -> bool {
        matches!(self, Self::TimeSynchronized | Self::TimeBracketed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NearestNeighborXY => "nearest_neighbor_xy",
            Self::TrueNearestXY => "true_nearest_xy",
            Self::TimeSynchronized => "time_synchronized",
            Self::TimeBracketed => "time_bracketed",
        }
    }
}

impl fmt::Display for CorrespondenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the test point is projected onto the bracketing pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMode {
    /// Infinite line through the pair (unclamped)
    #[default]
    Line,
    /// Segment between the pair (projection clamped to the endpoints)
    Segment,
}

impl ProjectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Segment => "segment",
        }
    }
}

impl fmt::Display for ProjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
