//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace:
//! trajectory data model, deviation report, error taxonomy, correspondence
//! modes, progress and sink traits, and the run blueprint.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Timestamps are seconds (f64); `sec`/`nanosec` pairs are folded into one value
//! - Elapsed time is always relative to the first test sample

mod blueprint;
mod engine_config;
mod error;
mod mode;
mod progress;
mod report;
mod sink;
mod trajectory;

pub use blueprint::*;
pub use engine_config::*;
pub use error::*;
pub use mode::*;
pub use progress::{NoProgress, ProgressSink};
pub use report::*;
pub use sink::*;
pub use trajectory::*;
