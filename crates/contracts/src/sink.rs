//! ReportSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for report sinks.

use crate::{ContractError, ReportBundle};

/// Report output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(ReportSink: Send)]
pub trait LocalReportSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write a finished report
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, bundle: &ReportBundle) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
