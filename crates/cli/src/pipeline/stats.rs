//! Pipeline statistics and metrics.

use std::path::PathBuf;
use std::time::Duration;

use contracts::{CorrespondenceMode, ErrorStatistics, ProjectionMode};
use observability::MetricsSummary;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Run identifier
    pub run_id: String,

    /// Correspondence mode used
    pub mode: CorrespondenceMode,

    /// Projection used
    pub projection: ProjectionMode,

    /// Samples in the reference trajectory
    pub reference_samples: usize,

    /// Records computed (one per test sample)
    pub records: usize,

    /// Time spent reading inputs
    pub load_duration: Duration,

    /// Time spent in the engine
    pub compute_duration: Duration,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Lateral error statistics
    pub lateral: ErrorStatistics,

    /// Vertical error magnitude statistics
    pub vertical_abs: ErrorStatistics,

    /// Streaming aggregate collected while computing
    pub deviation: MetricsSummary,

    /// Loader counters
    pub ingestion: ingestion::MetricsSnapshot,

    /// Final per-sink metrics
    pub sinks: Vec<(String, dispatcher::MetricsSnapshot)>,

    /// Directory file sinks wrote into
    pub output_dir: PathBuf,
}

impl PipelineStats {
    /// Engine throughput
    pub fn samples_per_sec(&self) -> f64 {
        if self.compute_duration.as_secs_f64() > 0.0 {
            self.records as f64 / self.compute_duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Deviation Statistics                      ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Run: {}", self.run_id);
        println!("   ├─ Mode: {} ({} projection)", self.mode, self.projection);
        println!("   ├─ Reference samples: {}", self.reference_samples);
        println!("   ├─ Test samples: {}", self.records);
        println!(
            "   ├─ Duration: {:.3}s (load {:.3}s, compute {:.3}s)",
            self.duration.as_secs_f64(),
            self.load_duration.as_secs_f64(),
            self.compute_duration.as_secs_f64()
        );
        println!("   └─ Throughput: {:.0} samples/s", self.samples_per_sec());

        println!("\n📈 Errors (m)");
        println!("   ├─ Lateral:  {}", self.lateral);
        println!("   └─ Vertical: {}", self.vertical_abs);

        if let Some((index, value)) = self.deviation.worst_lateral {
            println!("\n⚠️  Worst lateral error: {value:.4} m at sample {index}");
        }
        if self.deviation.repeated_brackets > 0 {
            println!(
                "   Repeated brackets: {} ({:.2}%)",
                self.deviation.repeated_brackets, self.deviation.repeated_bracket_rate
            );
        }

        println!("\n📤 Outputs ({})", self.output_dir.display());
        for (i, (name, snapshot)) in self.sinks.iter().enumerate() {
            let prefix = if i == self.sinks.len() - 1 { "└─" } else { "├─" };
            println!(
                "   {} {}: {} written ({} records), {} failed",
                prefix,
                name,
                snapshot.written,
                snapshot.records_written,
                snapshot.failures()
            );
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_per_sec() {
        let stats = PipelineStats {
            records: 500,
            compute_duration: Duration::from_millis(250),
            ..Default::default()
        };
        assert!((stats.samples_per_sec() - 2000.0).abs() < 1e-9);
        assert_eq!(PipelineStats::default().samples_per_sec(), 0.0);
    }
}
