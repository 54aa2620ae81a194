//! LogSink - logs report summary via tracing

use contracts::{ContractError, ReportBundle, ReportSink};
use tracing::{info, instrument};

/// Sink that logs report summaries
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_report_summary(&self, bundle: &ReportBundle) {
        let lateral = bundle.report.lateral_statistics();
        let vertical = bundle.report.abs_vertical_statistics();

        info!(
            sink = %self.name,
            run_id = %bundle.run_id,
            mode = %bundle.report.mode,
            projection = %bundle.report.projection,
            samples = bundle.report.len(),
            lateral_rmse = lateral.rmse,
            lateral_max = lateral.max,
            vertical_rmse = vertical.rmse,
            vertical_max = vertical.max,
            "Deviation report"
        );
    }
}

impl ReportSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, bundle),
        fields(sink = %self.name, run_id = %bundle.run_id)
    )]
    async fn write(&mut self, bundle: &ReportBundle) -> Result<(), ContractError> {
        self.log_report_summary(bundle);
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
