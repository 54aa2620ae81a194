//! Sink implementations
//!
//! Contains LogSink, CsvReportSink, and SummarySink.

mod csv;
mod log;
mod summary;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use contracts::{ContractError, ReportBundle};

pub use self::csv::CsvReportSink;
pub use self::log::LogSink;
pub use self::summary::SummarySink;

/// `<test stem><suffix>`, falling back to the run id when the test path is unknown
pub(crate) fn report_file_name(bundle: &ReportBundle, suffix: &str) -> String {
    let stem = bundle
        .test_path
        .as_deref()
        .and_then(Path::file_stem)
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| bundle.run_id.clone());
    format!("{stem}{suffix}")
}

/// Output location shared by the file sinks
///
/// An explicit `path` param wins; otherwise `directory` (or the dispatcher
/// output directory) joined with the per-report default name.
#[derive(Debug, Clone)]
pub(crate) struct OutputTarget {
    path: Option<PathBuf>,
    directory: PathBuf,
}

impl OutputTarget {
    pub(crate) fn from_params(
        name: &str,
        output_dir: &Path,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let path = match params.get("path") {
            Some(p) if p.trim().is_empty() => {
                return Err(ContractError::config_validation(
                    format!("sinks.{name}.params.path"),
                    "must not be empty",
                ));
            }
            Some(p) => Some(PathBuf::from(p)),
            None => None,
        };
        let directory = params
            .get("directory")
            .map(PathBuf::from)
            .unwrap_or_else(|| output_dir.to_path_buf());
        Ok(Self { path, directory })
    }

    pub(crate) fn resolve(&self, bundle: &ReportBundle, suffix: &str) -> PathBuf {
        match &self.path {
            Some(p) => p.clone(),
            None => self.directory.join(report_file_name(bundle, suffix)),
        }
    }
}

/// Boolean sink param; absent means `default`
pub(crate) fn bool_param(
    name: &str,
    params: &HashMap<String, String>,
    key: &str,
    default: bool,
) -> Result<bool, ContractError> {
    match params.get(key) {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| {
            ContractError::config_validation(
                format!("sinks.{name}.params.{key}"),
                format!("expected true or false, got '{v}'"),
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ErrorReport, Trajectory};

    fn bundle() -> ReportBundle {
        let report = ErrorReport::new(Default::default(), Default::default(), Vec::new());
        ReportBundle::new("run-1", report, Trajectory::new("test", vec![]))
    }

    #[test]
    fn test_file_name_from_test_path() {
        let b = bundle().with_test_path("/data/drive_03.csv");
        assert_eq!(report_file_name(&b, "_log.csv"), "drive_03_log.csv");
        assert_eq!(report_file_name(&bundle(), "_log.csv"), "run-1_log.csv");
    }

    #[test]
    fn test_explicit_path_wins() {
        let mut params = HashMap::new();
        params.insert("path".to_string(), "/tmp/custom.csv".to_string());
        let target = OutputTarget::from_params("csv", Path::new("/out"), &params).unwrap();
        assert_eq!(target.resolve(&bundle(), "_log.csv"), PathBuf::from("/tmp/custom.csv"));

        let target = OutputTarget::from_params("csv", Path::new("/out"), &HashMap::new()).unwrap();
        assert_eq!(target.resolve(&bundle(), "_log.csv"), PathBuf::from("/out/run-1_log.csv"));
    }

    #[test]
    fn test_empty_path_rejected() {
        let mut params = HashMap::new();
        params.insert("path".to_string(), " ".to_string());
        assert!(OutputTarget::from_params("csv", Path::new("/out"), &params).is_err());
    }

    #[test]
    fn test_bool_param() {
        let mut params = HashMap::new();
        params.insert("flag".to_string(), "true".to_string());
        params.insert("bad".to_string(), "yes".to_string());
        assert!(bool_param("s", &params, "flag", false).unwrap());
        assert!(!bool_param("s", &params, "missing", false).unwrap());
        assert!(bool_param("s", &params, "bad", false).is_err());
    }
}
