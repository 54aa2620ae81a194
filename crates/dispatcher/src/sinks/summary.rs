//! SummarySink - writes run statistics as pretty JSON

use contracts::{
    ContractError, CorrespondenceMode, ErrorStatistics, ProjectionMode, ReportBundle, ReportSink,
};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use super::OutputTarget;

const FILE_SUFFIX: &str = "_summary.json";

/// JSON document written per report
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub run_id: String,
    pub generated_at: String,
    pub mode: CorrespondenceMode,
    pub projection: ProjectionMode,
    pub test_path: Option<PathBuf>,
    pub test_samples: usize,
    pub test_duration: f64,
    pub test_path_length_xy: f64,
    pub records: usize,
    pub lateral: ErrorStatistics,
    pub vertical: ErrorStatistics,
    pub vertical_abs: ErrorStatistics,
}

impl ReportSummary {
    pub fn from_bundle(bundle: &ReportBundle) -> Self {
        let report = &bundle.report;
        Self {
            run_id: bundle.run_id.clone(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            mode: report.mode,
            projection: report.projection,
            test_path: bundle.test_path.clone(),
            test_samples: bundle.test.len(),
            test_duration: bundle.test.duration(),
            test_path_length_xy: bundle.test.path_length_xy(),
            records: report.len(),
            lateral: report.lateral_statistics(),
            vertical: report.vertical_statistics(),
            vertical_abs: report.abs_vertical_statistics(),
        }
    }
}

/// Sink that writes one summary JSON file per report
///
/// Params: `path` (explicit file) or `directory`; default
/// `<test stem>_summary.json` in the output directory.
pub struct SummarySink {
    name: String,
    target: OutputTarget,
    written: Vec<PathBuf>,
}

impl SummarySink {
    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        output_dir: &Path,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let target = OutputTarget::from_params(&name, output_dir, params)?;
        Ok(Self {
            name,
            target,
            written: Vec::new(),
        })
    }

    /// Files written so far
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn write_summary_to_disk(&self, bundle: &ReportBundle) -> std::io::Result<PathBuf> {
        let path = self.target.resolve(bundle, FILE_SUFFIX);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let summary = ReportSummary::from_bundle(bundle);
        let mut out = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut out, &summary)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(out)?;
        out.flush()?;
        Ok(path)
    }
}

impl ReportSink for SummarySink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "summary_sink_write",
        skip(self, bundle),
        fields(sink = %self.name, run_id = %bundle.run_id)
    )]
    async fn write(&mut self, bundle: &ReportBundle) -> Result<(), ContractError> {
        let path = self
            .write_summary_to_disk(bundle)
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        info!(sink = %self.name, path = %path.display(), "Summary written");
        self.written.push(path);
        Ok(())
    }

    #[instrument(name = "summary_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "summary_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, files = self.written.len(), "SummarySink closed");
        Ok(())
    }
}
