//! # Dispatcher
//!
//! Report fan-out.
//!
//! Responsibilities:
//! - Consume finished `ReportBundle`s
//! - Fan out to every configured sink (CSV table, JSON summary, log)
//! - Isolate each sink behind its own queue and worker task

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{ReportBundle, ReportSink};
pub use dispatcher::{
    create_dispatcher, DispatchOutcome, Dispatcher, DispatcherBuilder, DispatcherConfig,
};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{CsvReportSink, LogSink, SummarySink};
