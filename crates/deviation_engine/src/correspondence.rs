//! Bracketing pair selection.
//!
//! Every strategy returns reference indices `(ref_a, ref_b)`; `ref_a` is the
//! anchor used for the vertical error.

use contracts::{ContractError, CorrespondenceMode, Trajectory, TrajectorySample};

use crate::projection::{segment_length, to_vector};

/// Reference indices bracketing one test sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bracket {
    pub ref_a: usize,
    pub ref_b: usize,
}

impl Bracket {
    pub fn new(ref_a: usize, ref_b: usize) -> Self {
        Self { ref_a, ref_b }
    }

    pub fn as_tuple(&self) -> (usize, usize) {
        (self.ref_a, self.ref_b)
    }
}

/// Select the bracketing pair for `sample` with the given strategy.
pub fn select_bracket(
    mode: CorrespondenceMode,
    reference: &Trajectory,
    sample: &TrajectorySample,
    sample_index: usize,
) -> Result<Bracket, ContractError> {
    let samples = reference.samples();
    match mode {
        CorrespondenceMode::NearestNeighborXY => {
            nearest_neighbor_xy(samples, sample.position.xy(), sample_index)
        }
        CorrespondenceMode::TrueNearestXY => {
            true_nearest_xy(samples, sample.position.xy(), sample_index)
        }
        CorrespondenceMode::TimeSynchronized => {
            time_synchronized(samples, sample.timestamp, sample_index)
        }
        CorrespondenceMode::TimeBracketed => time_bracketed(samples, sample.timestamp, sample_index),
    }
}

fn xy_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    segment_length(&to_vector(a), &to_vector(b))
}

/// Running-minimum scan.
///
/// The first reference point seeds the minimum; each later point that is
/// strictly closer is pushed. The pair is `(last push, previous push)`,
/// which is not necessarily the two globally nearest points.
pub fn nearest_neighbor_xy(
    reference: &[TrajectorySample],
    target: [f64; 2],
    sample_index: usize,
) -> Result<Bracket, ContractError> {
    let mut min_dist = f64::INFINITY;
    let mut last: Option<usize> = None;
    let mut previous: Option<usize> = None;

    for (idx, candidate) in reference.iter().enumerate() {
        let dist = xy_distance(candidate.position.xy(), target);
        if last.is_none() || dist < min_dist {
            min_dist = dist;
            previous = last;
            last = Some(idx);
        }
    }

    match (last, previous) {
        (Some(ref_a), Some(ref_b)) => Ok(Bracket::new(ref_a, ref_b)),
        _ => Err(ContractError::out_of_range(
            sample_index,
            "running-minimum scan never improved on the first reference sample",
        )),
    }
}

/// The two globally nearest reference points; ties go to the lower index.
pub fn true_nearest_xy(
    reference: &[TrajectorySample],
    target: [f64; 2],
    sample_index: usize,
) -> Result<Bracket, ContractError> {
    let mut best: Option<(usize, f64)> = None;
    let mut second: Option<(usize, f64)> = None;

    for (idx, candidate) in reference.iter().enumerate() {
        let dist = xy_distance(candidate.position.xy(), target);
        match best {
            Some((_, best_dist)) if dist >= best_dist => {
                if second.is_none_or(|(_, second_dist)| dist < second_dist) {
                    second = Some((idx, dist));
                }
            }
            _ => {
                second = best;
                best = Some((idx, dist));
            }
        }
    }

    match (best, second) {
        (Some((ref_a, _)), Some((ref_b, _))) => Ok(Bracket::new(ref_a, ref_b)),
        _ => Err(ContractError::out_of_range(
            sample_index,
            "fewer than two reference samples",
        )),
    }
}

/// Reference sample nearest in time (first minimum wins) and its predecessor.
pub fn time_synchronized(
    reference: &[TrajectorySample],
    timestamp: f64,
    sample_index: usize,
) -> Result<Bracket, ContractError> {
    let mut nearest: Option<(usize, f64)> = None;
    for (idx, candidate) in reference.iter().enumerate() {
        let gap = (candidate.timestamp - timestamp).abs();
        if nearest.is_none_or(|(_, best)| gap < best) {
            nearest = Some((idx, gap));
        }
    }

    match nearest {
        Some((k, _)) if k > 0 => Ok(Bracket::new(k, k - 1)),
        Some(_) => Err(ContractError::out_of_range(
            sample_index,
            format!("timestamp {timestamp} is nearest to the first reference sample, which has no predecessor"),
        )),
        None => Err(ContractError::out_of_range(sample_index, "empty reference")),
    }
}

/// Consecutive reference pair whose timestamps straddle `timestamp`.
///
/// `ref_a` is the earlier sample. Timestamps outside the reference time
/// range have no bracket.
pub fn time_bracketed(
    reference: &[TrajectorySample],
    timestamp: f64,
    sample_index: usize,
) -> Result<Bracket, ContractError> {
    let (first, last) = match (reference.first(), reference.last()) {
        (Some(first), Some(last)) if reference.len() >= 2 => (first.timestamp, last.timestamp),
        _ => {
            return Err(ContractError::out_of_range(
                sample_index,
                "fewer than two reference samples",
            ))
        }
    };

    if timestamp < first || timestamp > last {
        return Err(ContractError::out_of_range(
            sample_index,
            format!("timestamp {timestamp} outside reference time range [{first}, {last}]"),
        ));
    }

    let upper = (1 + reference[1..].partition_point(|s| s.timestamp < timestamp))
        .min(reference.len() - 1);
    Ok(Bracket::new(upper - 1, upper))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Position;

    fn samples(points: &[(f64, f64, f64)]) -> Vec<TrajectorySample> {
        points
            .iter()
            .map(|&(t, x, y)| TrajectorySample::new(t, Position::new(x, y, 0.0)))
            .collect()
    }

    #[test]
    fn test_nearest_neighbor_push_sequence() {
        let reference = samples(&[(0.0, 0.0, 0.0), (1.0, 5.0, 0.0), (2.0, 10.0, 0.0)]);
        let bracket = nearest_neighbor_xy(&reference, [9.0, 0.0], 0).unwrap();
        assert_eq!(bracket, Bracket::new(2, 1));
    }

    #[test]
    fn test_nearest_neighbor_is_not_global_nearest() {
        // pushes: 0 (d=10), 1 (d=1), 3 (d=0.5); index 2 (d=2) is never pushed
        let reference = samples(&[
            (0.0, 10.0, 0.0),
            (1.0, 1.0, 0.0),
            (2.0, 2.0, 0.0),
            (3.0, -0.5, 0.0),
        ]);
        let bracket = nearest_neighbor_xy(&reference, [0.0, 0.0], 0).unwrap();
        assert_eq!(bracket, Bracket::new(3, 1));

        let mut reordered = reference.clone();
        reordered.swap(1, 2);
        // pushes: 0 (d=10), 1 (d=2), 2 (d=1), 3 (d=0.5)
        let bracket = nearest_neighbor_xy(&reordered, [0.0, 0.0], 0).unwrap();
        assert_eq!(bracket, Bracket::new(3, 2));
    }

    #[test]
    fn test_nearest_neighbor_single_push_is_out_of_range() {
        let reference = samples(&[(0.0, 0.0, 0.0), (1.0, 5.0, 0.0), (2.0, 10.0, 0.0)]);
        let err = nearest_neighbor_xy(&reference, [-1.0, 0.0], 3).unwrap_err();
        assert!(matches!(err, ContractError::OutOfRange { sample_index: 3, .. }));
    }

    #[test]
    fn test_nearest_neighbor_equal_distance_not_pushed() {
        let reference = samples(&[(0.0, -1.0, 0.0), (1.0, 1.0, 0.0), (2.0, 0.0, 2.0)]);
        let err = nearest_neighbor_xy(&reference, [0.0, 0.0], 0);
        assert!(err.is_err());
    }

    #[test]
    fn test_true_nearest_picks_two_closest() {
        let reference = samples(&[
            (0.0, 10.0, 0.0),
            (1.0, 1.0, 0.0),
            (2.0, 2.0, 0.0),
            (3.0, -0.5, 0.0),
        ]);
        let bracket = true_nearest_xy(&reference, [0.0, 0.0], 0).unwrap();
        assert_eq!(bracket, Bracket::new(3, 1));

        let bracket = true_nearest_xy(&reference, [-1.0, 0.0], 0).unwrap();
        assert_eq!(bracket, Bracket::new(3, 1));

        let bracket = true_nearest_xy(&reference, [11.0, 0.0], 0).unwrap();
        assert_eq!(bracket, Bracket::new(0, 2));
    }

    #[test]
    fn test_true_nearest_ties_prefer_lower_index() {
        let reference = samples(&[(0.0, -1.0, 0.0), (1.0, 1.0, 0.0), (2.0, 0.0, 1.0)]);
        let bracket = true_nearest_xy(&reference, [0.0, 0.0], 0).unwrap();
        assert_eq!(bracket, Bracket::new(0, 1));
    }

    #[test]
    fn test_time_synchronized_pairs_with_predecessor() {
        let reference = samples(&[
            (0.0, 0.0, 0.0),
            (1.0, 1.0, 0.0),
            (2.0, 2.0, 0.0),
            (3.0, 3.0, 0.0),
        ]);
        assert_eq!(time_synchronized(&reference, 1.4, 0).unwrap(), Bracket::new(1, 0));
        assert_eq!(time_synchronized(&reference, 1.6, 0).unwrap(), Bracket::new(2, 1));
        assert_eq!(time_synchronized(&reference, 9.0, 0).unwrap(), Bracket::new(3, 2));
    }

    #[test]
    fn test_time_synchronized_first_minimum_wins() {
        let reference = samples(&[(0.0, 0.0, 0.0), (1.0, 1.0, 0.0), (2.0, 2.0, 0.0)]);
        assert_eq!(time_synchronized(&reference, 1.5, 0).unwrap(), Bracket::new(1, 0));
    }

    #[test]
    fn test_time_synchronized_nearest_first_is_out_of_range() {
        let reference = samples(&[(0.0, 0.0, 0.0), (1.0, 1.0, 0.0)]);
        let err = time_synchronized(&reference, 0.2, 5).unwrap_err();
        assert!(matches!(err, ContractError::OutOfRange { sample_index: 5, .. }));
    }

    #[test]
    fn test_time_bracketed_straddles() {
        let reference = samples(&[
            (0.0, 0.0, 0.0),
            (1.0, 1.0, 0.0),
            (2.0, 2.0, 0.0),
            (3.0, 3.0, 0.0),
        ]);
        assert_eq!(time_bracketed(&reference, 1.4, 0).unwrap(), Bracket::new(1, 2));
        assert_eq!(time_bracketed(&reference, 0.0, 0).unwrap(), Bracket::new(0, 1));
        assert_eq!(time_bracketed(&reference, 2.0, 0).unwrap(), Bracket::new(1, 2));
        assert_eq!(time_bracketed(&reference, 3.0, 0).unwrap(), Bracket::new(2, 3));
    }

    #[test]
    fn test_time_bracketed_outside_range() {
        let reference = samples(&[(1.0, 0.0, 0.0), (2.0, 1.0, 0.0)]);
        assert!(time_bracketed(&reference, 0.5, 0).is_err());
        assert!(time_bracketed(&reference, 2.5, 0).is_err());
    }
}
