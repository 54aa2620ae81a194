//! Error types for CLI operations.

use contracts::ContractError;
use dispatcher::DispatcherError;
use ingestion::IngestionError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Neither a configuration file nor both input paths were given
    #[error("Missing input: {message}")]
    MissingInput { message: String },

    /// Trajectory could not be loaded
    #[error("Failed to load {role} trajectory: {source}")]
    Ingestion {
        role: String,
        #[source]
        source: IngestionError,
    },

    /// Configuration or computation error
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// Run interrupted by a shutdown signal
    #[error("Run cancelled after {completed} of {total} samples")]
    Cancelled { completed: usize, total: usize },

    /// Sinks could not be set up
    #[error("Failed to set up sinks: {0}")]
    Sink(#[from] DispatcherError),

    /// At least one sink did not write its report
    #[error("Report not written by sink(s): {}", sinks.join(", "))]
    Dispatch { sinks: Vec<String> },

    /// Background task failed
    #[error("Pipeline task failed: {message}")]
    Task { message: String },
}

impl CliError {
    pub fn missing_input(message: impl Into<String>) -> Self {
        Self::MissingInput {
            message: message.into(),
        }
    }

    pub fn ingestion(role: impl Into<String>, source: IngestionError) -> Self {
        Self::Ingestion {
            role: role.into(),
            source,
        }
    }

    pub fn task(message: impl Into<String>) -> Self {
        Self::Task {
            message: message.into(),
        }
    }

    /// Short, stable label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingInput { .. } => "missing_input",
            Self::Ingestion { .. } => "ingestion",
            Self::Contract(e) => e.kind(),
            Self::Cancelled { .. } => "cancelled",
            Self::Sink(_) => "sink",
            Self::Dispatch { .. } => "dispatch",
            Self::Task { .. } => "task",
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_delegates_to_contract() {
        let err: CliError = ContractError::out_of_range(3, "before first reference").into();
        assert_eq!(err.kind(), "out_of_range");
        assert!(err.to_string().contains("test sample 3"));
    }

    #[test]
    fn test_dispatch_message_lists_sinks() {
        let err = CliError::Dispatch {
            sinks: vec!["csv".into(), "summary".into()],
        };
        assert_eq!(err.to_string(), "Report not written by sink(s): csv, summary");
        assert_eq!(err.kind(), "dispatch");
    }
}
