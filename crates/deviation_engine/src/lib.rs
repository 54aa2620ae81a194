//! # Deviation Engine
//!
//! Per-sample lateral (xy) and vertical (z) deviation of a test trajectory
//! from a reference trajectory.
//!
//! Responsible for:
//! - input precondition checks (sample counts, finite values, reference order)
//! - bracketing pair selection per [`CorrespondenceMode`]
//! - projection of each test point onto the bracketing line or segment
//! - emitting one `ErrorRecord` per test sample, in test order
//!
//! ## Example
//!
//! ```ignore
//! use deviation_engine::{CorrespondenceMode, DeviationEngine, DeviationEngineConfig};
//!
//! let engine = DeviationEngine::new(DeviationEngineConfig::default());
//! let report = engine.compute(&reference, &test, CorrespondenceMode::TimeSynchronized)?;
//!
//! for record in &report.records {
//!     println!("{:.3}s lateral={:.3}", record.elapsed_time, record.lateral_error);
//! }
//! ```

pub mod correspondence;
mod engine;
pub mod projection;

pub use contracts::{
    CorrespondenceMode, DeviationEngineConfig, ErrorRecord, ErrorReport, ProjectionMode,
};
pub use correspondence::Bracket;
pub use engine::{DeviationEngine, DeviationSteps};
