//! Ingestion error types

use std::path::PathBuf;

use contracts::ContractError;
use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Source could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source has no header row
    #[error("{source_name}: no header row")]
    Empty {
        /// Trajectory role or file name
        source_name: String,
    },

    /// Required column absent from the header
    #[error("{source_name}: missing column '{column}'")]
    MissingColumn {
        /// Trajectory role or file name
        source_name: String,
        /// Column name (or alternatives)
        column: String,
    },

    /// Data row has a different number of cells than the header
    #[error("{source_name}: line {line} has {actual} fields, header has {expected}")]
    RowLength {
        source_name: String,
        line: usize,
        expected: usize,
        actual: usize,
    },

    /// Cell could not be parsed as a number
    #[error("{source_name}: line {line}, column '{column}': {message}")]
    ParseFailed {
        /// Trajectory role or file name
        source_name: String,
        /// 1-based line number in the source
        line: usize,
        /// Column name
        column: String,
        /// Error message
        message: String,
    },

    /// Malformed CSV (e.g. unterminated quote)
    #[error("{source_name}: line {line}: {message}")]
    Malformed {
        source_name: String,
        line: usize,
        message: String,
    },
}

impl IngestionError {
    /// Trajectory role or file name the error refers to
    pub fn source_name(&self) -> Option<&str> {
        match self {
            Self::Io { .. } => None,
            Self::Empty { source_name }
            | Self::MissingColumn { source_name, .. }
            | Self::RowLength { source_name, .. }
            | Self::ParseFailed { source_name, .. }
            | Self::Malformed { source_name, .. } => Some(source_name),
        }
    }
}

impl From<IngestionError> for ContractError {
    fn from(err: IngestionError) -> Self {
        if let IngestionError::Io { source, .. } = err {
            return ContractError::Io(source);
        }
        let trajectory = err.source_name().unwrap_or_default().to_string();
        ContractError::schema(trajectory, err.to_string())
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
