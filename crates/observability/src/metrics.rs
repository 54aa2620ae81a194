//! Deviation metrics collection
//!
//! Records run- and report-level metrics and aggregates error series in memory.

use contracts::{ErrorRecord, ErrorReport};
use metrics::{counter, gauge, histogram};

/// Record a completed run
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_run_success;
///
/// let started = std::time::Instant::now();
/// let report = engine.compute(&reference, &test, mode)?;
/// record_run_success(mode.as_str(), report.len(), started.elapsed().as_secs_f64());
/// ```
pub fn record_run_success(mode: &str, samples: usize, duration_secs: f64) {
    counter!(
        "trajdev_runs_total",
        "mode" => mode.to_string(),
        "status" => "ok"
    )
    .increment(1);

    histogram!("trajdev_run_duration_seconds", "mode" => mode.to_string()).record(duration_secs);
    gauge!("trajdev_last_run_samples").set(samples as f64);
}

/// Record a failed run; `kind` is the error label
pub fn record_run_failure(mode: &str, kind: &str) {
    counter!(
        "trajdev_runs_total",
        "mode" => mode.to_string(),
        "status" => "error"
    )
    .increment(1);

    counter!("trajdev_run_failures_total", "kind" => kind.to_string()).increment(1);
}

/// Record summary gauges of a finished report
pub fn record_report(report: &ErrorReport) {
    let lateral = report.lateral_statistics();
    let vertical = report.abs_vertical_statistics();

    gauge!("trajdev_lateral_rmse_m").set(lateral.rmse);
    gauge!("trajdev_lateral_max_m").set(lateral.max);
    gauge!("trajdev_vertical_rmse_m").set(vertical.rmse);
    gauge!("trajdev_vertical_max_m").set(vertical.max);
}

/// Record report delivery to a sink
pub fn record_report_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "trajdev_reports_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Deviation metrics aggregator
///
/// Aggregates records in memory while a run is streaming, for progress
/// logs and summaries.
#[derive(Debug, Clone, Default)]
pub struct DeviationMetricsAggregator {
    /// Total records
    pub total_samples: u64,

    /// Lateral error statistics
    pub lateral_stats: RunningStats,

    /// Vertical error magnitude statistics
    pub vertical_stats: RunningStats,

    /// Sample index and value of the largest lateral error
    pub worst_lateral: Option<(usize, f64)>,

    /// Records whose bracket equals the previous record's
    pub repeated_brackets: u64,

    last_bracket: Option<(usize, usize)>,
}

impl DeviationMetricsAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Update aggregate statistics
    pub fn update(&mut self, record: &ErrorRecord) {
        self.total_samples += 1;
        self.lateral_stats.push(record.lateral_error);
        self.vertical_stats.push(record.vertical_error.abs());

        if self
            .worst_lateral
            .is_none_or(|(_, worst)| record.lateral_error > worst)
        {
            self.worst_lateral = Some((record.sample_index, record.lateral_error));
        }

        if self.last_bracket == Some(record.bracket) {
            self.repeated_brackets += 1;
        }
        self.last_bracket = Some(record.bracket);
    }

    /// Generate summary
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_samples: self.total_samples,
            repeated_brackets: self.repeated_brackets,
            repeated_bracket_rate: if self.total_samples > 0 {
                self.repeated_brackets as f64 / self.total_samples as f64 * 100.0
            } else {
                0.0
            },
            lateral_m: StatsSummary::from(&self.lateral_stats),
            vertical_m: StatsSummary::from(&self.vertical_stats),
            worst_lateral: self.worst_lateral,
        }
    }

    /// Reset statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_samples: u64,
    pub repeated_brackets: u64,
    pub repeated_bracket_rate: f64,
    pub lateral_m: StatsSummary,
    pub vertical_m: StatsSummary,
    pub worst_lateral: Option<(usize, f64)>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Deviation Metrics Summary ===")?;
        writeln!(f, "Total samples: {}", self.total_samples)?;
        writeln!(f, "Lateral error (m): {}", self.lateral_m)?;
        writeln!(f, "Vertical error |m|: {}", self.vertical_m)?;
        writeln!(
            f,
            "Repeated brackets: {} ({:.2}%)",
            self.repeated_brackets, self.repeated_bracket_rate
        )?;

        if let Some((index, value)) = self.worst_lateral {
            writeln!(f, "Worst lateral error: {:.4} m at sample {}", value, index)?;
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub rms: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
            rms: stats.rms(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3}, rms={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.rms, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    sum_sq: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a value
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum_sq += value * value;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Root mean square
    pub fn rms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.sum_sq / self.count as f64).sqrt()
        }
    }

    /// Minimum
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum
    pub fn max(&self) -> f64 {
        self.max
    }
}
