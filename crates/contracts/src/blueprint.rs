//! RunBlueprint - Config Loader output
//!
//! Describes a complete comparison run: inputs, column mapping, engine
//! settings, output location and sink routing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use validator::Validate;

use crate::{CorrespondenceMode, DeviationEngineConfig, ProjectionMode};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete run blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Input trajectory files
    pub inputs: InputsConfig,

    /// CSV column names
    #[serde(default)]
    pub columns: ColumnConfig,

    /// Engine settings
    #[serde(default)]
    pub engine: EngineSettings,

    /// Output location
    #[serde(default)]
    pub output: OutputConfig,

    /// Output routing
    #[serde(default = "default_sinks")]
    pub sinks: Vec<SinkConfig>,
}

/// Input trajectory files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputsConfig {
    /// Ground-truth trajectory
    pub reference: PathBuf,

    /// Trajectory under evaluation
    pub test: PathBuf,
}

/// Column names used to read a trajectory CSV
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    /// Combined timestamp column (seconds)
    #[serde(default = "default_timestamp_column")]
    pub timestamp: String,

    /// Integer seconds column, used when `timestamp` is absent
    #[serde(default = "default_sec_column")]
    pub sec: String,

    /// Integer nanoseconds column, used when `timestamp` is absent
    #[serde(default = "default_nanosec_column")]
    pub nanosec: String,

    #[serde(default = "default_x_column")]
    pub x: String,

    #[serde(default = "default_y_column")]
    pub y: String,

    #[serde(default = "default_z_column")]
    pub z: String,
}

fn default_timestamp_column() -> String {
    "msg.header.stamp".to_string()
}

fn default_sec_column() -> String {
    "sec".to_string()
}

fn default_nanosec_column() -> String {
    "nanosec".to_string()
}

fn default_x_column() -> String {
    "x".to_string()
}

fn default_y_column() -> String {
    "y".to_string()
}

fn default_z_column() -> String {
    "z".to_string()
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            timestamp: default_timestamp_column(),
            sec: default_sec_column(),
            nanosec: default_nanosec_column(),
            x: default_x_column(),
            y: default_y_column(),
            z: default_z_column(),
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EngineSettings {
    /// Correspondence mode
    #[serde(default)]
    pub mode: CorrespondenceMode,

    /// Projection mode
    #[serde(default)]
    pub projection: ProjectionMode,

    /// Bracket length (xy) at or below which a segment is degenerate
    #[serde(default)]
    #[validate(range(min = 0.0, message = "must be non-negative"))]
    pub degenerate_epsilon: f64,

    /// Reject decreasing reference timestamps in time-based modes
    #[serde(default = "default_true")]
    pub validate_reference_order: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            mode: CorrespondenceMode::default(),
            projection: ProjectionMode::default(),
            degenerate_epsilon: 0.0,
            validate_reference_order: true,
        }
    }
}

/// Output location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for file sinks; defaults to the test file's directory
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Prometheus text snapshot written after the run
    #[serde(default)]
    pub metrics_file: Option<PathBuf>,
}

/// Sink output config
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkConfig {
    /// Sink name
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Queue capacity
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1, max = 1024, message = "must be between 1 and 1024"))]
    pub queue_capacity: usize,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    4
}

impl SinkConfig {
    pub fn new(name: impl Into<String>, sink_type: SinkType) -> Self {
        Self {
            name: name.into(),
            sink_type,
            queue_capacity: default_queue_capacity(),
            params: HashMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log output
    Log,
    /// Per-sample CSV report
    Csv,
    /// JSON statistics summary
    Summary,
}

fn default_sinks() -> Vec<SinkConfig> {
    vec![
        SinkConfig::new("csv", SinkType::Csv),
        SinkConfig::new("log", SinkType::Log),
    ]
}

impl RunBlueprint {
    /// Minimal blueprint for two input files with default settings
    pub fn new(reference: impl Into<PathBuf>, test: impl Into<PathBuf>) -> Self {
        Self {
            version: ConfigVersion::V1,
            inputs: InputsConfig {
                reference: reference.into(),
                test: test.into(),
            },
            columns: ColumnConfig::default(),
            engine: EngineSettings::default(),
            output: OutputConfig::default(),
            sinks: default_sinks(),
        }
    }

    /// Build a DeviationEngineConfig from the engine settings
    pub fn to_engine_config(&self) -> DeviationEngineConfig {
        DeviationEngineConfig {
            projection: self.engine.projection,
            degenerate_epsilon: self.engine.degenerate_epsilon,
            validate_reference_order: self.engine.validate_reference_order,
        }
    }

    /// Directory file sinks write into
    pub fn output_directory(&self) -> PathBuf {
        match &self.output.directory {
            Some(dir) => dir.clone(),
            None => self
                .inputs
                .test
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default(),
        }
    }
}
