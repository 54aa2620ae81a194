//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use contracts::{CorrespondenceMode, ProjectionMode};

/// trajdev - lateral and vertical deviation of a test trajectory from a reference
#[derive(Parser, Debug)]
#[command(
    name = "trajdev",
    author,
    version,
    about = "Trajectory deviation evaluator",
    long_about = "Compares a test trajectory against a reference trajectory.\n\n\
                  For every test sample a bracketing pair of reference samples is \n\
                  selected, the sample is projected onto the line through the pair, \n\
                  and lateral (xy) and vertical (z) errors are written to the \n\
                  configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TRAJDEV_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TRAJDEV_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute deviations and write reports
    Run(RunArgs),

    /// Validate a run configuration file without running
    Validate(ValidateArgs),

    /// Describe input trajectories
    Info(InfoArgs),
}

/// Arguments for the `run` command
///
/// Either `--config` or both `--reference` and `--test` are required;
/// flags override values from the configuration file.
#[derive(Parser, Debug, Clone, Default)]
pub struct RunArgs {
    /// Path to run configuration file (TOML or JSON)
    #[arg(short, long, env = "TRAJDEV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Reference trajectory CSV
    #[arg(short, long, env = "TRAJDEV_REFERENCE")]
    pub reference: Option<PathBuf>,

    /// Test trajectory CSV
    #[arg(short, long, env = "TRAJDEV_TEST")]
    pub test: Option<PathBuf>,

    /// Correspondence mode
    #[arg(short, long, value_enum, env = "TRAJDEV_MODE")]
    pub mode: Option<ModeArg>,

    /// Projection onto the bracketing pair
    #[arg(short, long, value_enum, env = "TRAJDEV_PROJECTION")]
    pub projection: Option<ProjectionArg>,

    /// Reference pairs closer than this in xy are rejected as degenerate
    #[arg(long, env = "TRAJDEV_EPSILON")]
    pub epsilon: Option<f64>,

    /// Skip the reference timestamp order check in time-based modes
    #[arg(long)]
    pub no_order_check: bool,

    /// Output directory for report files (default: beside the test file)
    #[arg(short, long, env = "TRAJDEV_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Also write a JSON summary
    #[arg(long)]
    pub summary: bool,

    /// Write a Prometheus text snapshot of run metrics to this file
    #[arg(long, env = "TRAJDEV_METRICS_OUT")]
    pub metrics_out: Option<PathBuf>,

    /// Validate configuration and exit without computing
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "trajdev.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Run configuration supplying input paths and column names
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Trajectory CSV files to describe
    pub files: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the source columns of each file
    #[arg(long)]
    pub columns: bool,
}

/// Correspondence mode as typed on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// Running-minimum nearest neighbour in xy
    #[value(name = "nearest-neighbor-xy", alias = "nn")]
    NearestNeighborXy,
    /// Two globally nearest reference points in xy
    #[value(name = "true-nearest-xy")]
    TrueNearestXy,
    /// Nearest reference timestamp and its predecessor
    #[value(name = "time-synchronized", alias = "time")]
    TimeSynchronized,
    /// Reference pair straddling the test timestamp
    #[value(name = "time-bracketed")]
    TimeBracketed,
}

impl From<ModeArg> for CorrespondenceMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::NearestNeighborXy => Self::NearestNeighborXY,
            ModeArg::TrueNearestXy => Self::TrueNearestXY,
            ModeArg::TimeSynchronized => Self::TimeSynchronized,
            ModeArg::TimeBracketed => Self::TimeBracketed,
        }
    }
}

/// Projection as typed on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectionArg {
    /// Infinite line through the pair
    Line,
    /// Segment between the pair
    Segment,
}

impl From<ProjectionArg> for ProjectionMode {
    fn from(arg: ProjectionArg) -> Self {
        match arg {
            ProjectionArg::Line => Self::Line,
            ProjectionArg::Segment => Self::Segment,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
