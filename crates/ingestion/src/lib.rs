//! # Ingestion
//!
//! Trajectory loading.
//!
//! Responsibilities:
//! - Parse CSV trajectory files into `Trajectory` (row order preserved)
//! - Reconstruct timestamps from `sec` + `nanosec` when no combined column exists
//! - Keep the raw table so reports can echo the original columns
//! - Report missing columns and unparsable cells with line and column
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::TrajectoryLoader;
//!
//! let loader = TrajectoryLoader::default();
//! let reference = loader.load_path("ref.csv", "reference")?;
//! let test = loader.load_path("run1.csv", "test")?;
//! ```
//!
//! ## Synthetic Data
//!
//! ```ignore
//! use ingestion::MockTrajectory;
//!
//! let reference = MockTrajectory::straight("reference", 200, 10.0, 2.0).generate();
//! let test = MockTrajectory::straight("test", 200, 10.0, 2.0)
//!     .with_lateral_offset(0.3)
//!     .generate();
//! ```

mod config;
pub mod csv;
mod error;
mod loader;
mod mock;

// Re-exports
pub use config::{IngestionMetrics, MetricsSnapshot};
pub use contracts::{ColumnConfig, SourceTable, Trajectory};
pub use error::{IngestionError, Result};
pub use loader::{LoadedTrajectory, TimeSource, TrajectoryLoader, TIMESTAMP_ALIAS};
pub use mock::{MockPath, MockTrajectory, MockTrajectoryConfig};
