//! Main deviation engine implementation.

use contracts::{
    ContractError, CorrespondenceMode, DeviationEngineConfig, ErrorRecord, ErrorReport,
    NoProgress, ProgressSink, Trajectory,
};
use tracing::instrument;

use crate::correspondence::select_bracket;
use crate::projection::{project, segment_length, to_vector};

const MIN_REFERENCE_SAMPLES: usize = 2;
const MIN_TEST_SAMPLES: usize = 1;

/// Trajectory deviation engine
///
/// Stateless between calls: identical inputs give identical reports.
#[derive(Debug, Clone, Default)]
pub struct DeviationEngine {
    config: DeviationEngineConfig,
}

impl DeviationEngine {
    /// Create a new engine with the given configuration
    pub fn new(config: DeviationEngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DeviationEngineConfig {
        &self.config
    }

    /// Compute one record per test sample.
    ///
    /// Any failure aborts the run; no partial report is returned.
    pub fn compute(
        &self,
        reference: &Trajectory,
        test: &Trajectory,
        mode: CorrespondenceMode,
    ) -> Result<ErrorReport, ContractError> {
        self.compute_with_progress(reference, test, mode, &mut NoProgress)
    }

    /// Same as [`compute`](Self::compute), notifying `progress` with
    /// `(records_done, total)` after each record.
    #[instrument(
        name = "deviation_engine_compute",
        skip(self, reference, test, progress),
        fields(
            mode = %mode,
            projection = %self.config.projection,
            reference_len = reference.len(),
            test_len = test.len()
        )
    )]
    pub fn compute_with_progress(
        &self,
        reference: &Trajectory,
        test: &Trajectory,
        mode: CorrespondenceMode,
        progress: &mut dyn ProgressSink,
    ) -> Result<ErrorReport, ContractError> {
        let steps = self.steps(reference, test, mode)?;
        let total = steps.total();

        let mut records = Vec::with_capacity(total);
        for step in steps {
            records.push(step?);
            progress.on_progress(records.len(), total);
        }

        tracing::debug!(records = records.len(), "deviation computed");
        Ok(ErrorReport::new(mode, self.config.projection, records))
    }

    /// Validate inputs and return a step iterator yielding one record per
    /// test sample.
    ///
    /// The caller may stop pulling between samples. After the first error
    /// the iterator is exhausted.
    #[instrument(name = "deviation_engine_steps", level = "trace", skip(self, reference, test))]
    pub fn steps<'a>(
        &self,
        reference: &'a Trajectory,
        test: &'a Trajectory,
        mode: CorrespondenceMode,
    ) -> Result<DeviationSteps<'a>, ContractError> {
        self.validate_inputs(reference, test, mode)?;

        let start_time = test.start_time().unwrap_or_default();
        Ok(DeviationSteps {
            reference,
            test,
            mode,
            config: self.config.clone(),
            start_time,
            next_index: 0,
            failed: false,
        })
    }

    fn validate_inputs(
        &self,
        reference: &Trajectory,
        test: &Trajectory,
        mode: CorrespondenceMode,
    ) -> Result<(), ContractError> {
        if reference.len() < MIN_REFERENCE_SAMPLES {
            return Err(ContractError::insufficient_data(
                reference.name(),
                MIN_REFERENCE_SAMPLES,
                reference.len(),
            ));
        }
        if test.len() < MIN_TEST_SAMPLES {
            return Err(ContractError::insufficient_data(
                test.name(),
                MIN_TEST_SAMPLES,
                test.len(),
            ));
        }

        for trajectory in [reference, test] {
            if let Some(index) = trajectory.first_non_finite() {
                return Err(ContractError::schema(
                    trajectory.name(),
                    format!("sample {index} has a non-finite timestamp or coordinate"),
                ));
            }
        }

        if mode.is_time_based() && self.config.validate_reference_order {
            if let Some(index) = reference.first_time_inversion() {
                return Err(ContractError::schema(
                    reference.name(),
                    format!("timestamp decreases at sample {index}; {mode} requires time-ordered reference"),
                ));
            }
        }

        Ok(())
    }
}

/// Resumable per-sample computation
///
/// Produced by [`DeviationEngine::steps`]. Yields `Ok(ErrorRecord)` for each
/// test sample in order, or a single `Err` after which it is fused.
#[derive(Debug)]
pub struct DeviationSteps<'a> {
    reference: &'a Trajectory,
    test: &'a Trajectory,
    mode: CorrespondenceMode,
    config: DeviationEngineConfig,
    start_time: f64,
    next_index: usize,
    failed: bool,
}

impl DeviationSteps<'_> {
    /// Number of test samples
    pub fn total(&self) -> usize {
        self.test.len()
    }

    /// Number of records already produced
    pub fn completed(&self) -> usize {
        self.next_index
    }

    pub fn mode(&self) -> CorrespondenceMode {
        self.mode
    }

    fn compute_record(&self, sample_index: usize) -> Result<ErrorRecord, ContractError> {
        let samples = self.test.samples();
        let sample = &samples[sample_index];

        let bracket = select_bracket(self.mode, self.reference, sample, sample_index)?;
        let ref_samples = self.reference.samples();
        let ref_a = &ref_samples[bracket.ref_a];
        let ref_b = &ref_samples[bracket.ref_b];

        let a = to_vector(ref_a.position.xy());
        let b = to_vector(ref_b.position.xy());
        let p = to_vector(sample.position.xy());

        // also rejects NaN lengths
        if !(segment_length(&a, &b) > self.config.degenerate_epsilon) {
            return Err(ContractError::DegenerateSegment {
                sample_index,
                ref_a: bracket.ref_a,
                ref_b: bracket.ref_b,
            });
        }

        let projection = project(&a, &b, &p, self.config.projection);
        let vertical_error = sample.position.z - ref_a.position.z;

        tracing::trace!(
            sample_index,
            ref_a = bracket.ref_a,
            ref_b = bracket.ref_b,
            lateral = projection.distance,
            vertical = vertical_error,
            "sample projected"
        );

        Ok(ErrorRecord {
            sample_index,
            elapsed_time: sample.timestamp - self.start_time,
            lateral_error: projection.distance,
            vertical_error,
            error_point: [projection.foot.x, projection.foot.y],
            bracket: bracket.as_tuple(),
        })
    }

    fn record_sample_metrics(&self, record: &ErrorRecord) {
        let mode = self.mode.as_str();
        metrics::counter!("trajdev_samples_total", "mode" => mode).increment(1);
        metrics::histogram!("trajdev_lateral_error_m", "mode" => mode).record(record.lateral_error);
        metrics::histogram!("trajdev_vertical_error_m", "mode" => mode)
            .record(record.vertical_error.abs());
    }
}

impl Iterator for DeviationSteps<'_> {
    type Item = Result<ErrorRecord, ContractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next_index >= self.test.len() {
            return None;
        }

        let index = self.next_index;
        match self.compute_record(index) {
            Ok(record) => {
                self.next_index += 1;
                self.record_sample_metrics(&record);
                Some(Ok(record))
            }
            Err(err) => {
                self.failed = true;
                tracing::warn!(sample_index = index, error = %err, "deviation step failed");
                metrics::counter!("trajdev_sample_failures_total", "kind" => err.kind())
                    .increment(1);
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let remaining = self.test.len() - self.next_index;
        (0, Some(remaining))
    }
}

impl std::iter::FusedIterator for DeviationSteps<'_> {}
