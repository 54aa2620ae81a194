//! Layered error definitions
//!
//! Categorized by source: data / geometry / config / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Data Errors =====
    /// Trajectory too short for the requested comparison
    #[error("insufficient data in {trajectory} trajectory: {actual} samples, at least {required} required")]
    InsufficientData {
        trajectory: String,
        required: usize,
        actual: usize,
    },

    /// Required field absent or unusable in an input trajectory
    #[error("schema error in {trajectory} trajectory: {message}")]
    Schema { trajectory: String, message: String },

    // ===== Geometry Errors =====
    /// Bracketing reference pair coincides in (x, y)
    #[error("degenerate segment for test sample {sample_index}: reference points {ref_a} and {ref_b} coincide in xy")]
    DegenerateSegment {
        sample_index: usize,
        ref_a: usize,
        ref_b: usize,
    },

    /// No valid bracketing pair exists for a test sample
    #[error("no bracketing pair for test sample {sample_index}: {message}")]
    OutOfRange { sample_index: usize, message: String },

    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create insufficient data error
    pub fn insufficient_data(trajectory: impl Into<String>, required: usize, actual: usize) -> Self {
        Self::InsufficientData {
            trajectory: trajectory.into(),
            required,
            actual,
        }
    }

    /// Create schema error
    pub fn schema(trajectory: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            trajectory: trajectory.into(),
            message: message.into(),
        }
    }

    /// Create out-of-range error
    pub fn out_of_range(sample_index: usize, message: impl Into<String>) -> Self {
        Self::OutOfRange {
            sample_index,
            message: message.into(),
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Short, stable label for metrics and JSON output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InsufficientData { .. } => "insufficient_data",
            Self::Schema { .. } => "schema",
            Self::DegenerateSegment { .. } => "degenerate_segment",
            Self::OutOfRange { .. } => "out_of_range",
            Self::ConfigParse { .. } => "config_parse",
            Self::ConfigValidation { .. } => "config_validation",
            Self::SinkWrite { .. } => "sink_write",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data_message() {
        let err = ContractError::insufficient_data("reference", 2, 1);
        let msg = err.to_string();
        assert!(msg.contains("reference"), "got: {msg}");
        assert!(msg.contains("at least 2"), "got: {msg}");
        assert_eq!(err.kind(), "insufficient_data");
    }

    #[test]
    fn test_degenerate_segment_message() {
        let err = ContractError::DegenerateSegment {
            sample_index: 4,
            ref_a: 7,
            ref_b: 6,
        };
        assert!(err.to_string().contains("test sample 4"));
        assert_eq!(err.kind(), "degenerate_segment");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ContractError = io.into();
        assert!(matches!(err, ContractError::Io(_)));
    }
}
