//! Seeded holdout partitioning of sample identities.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::domain::RecordId;
use crate::CoreError;

/// Fraction of rows held out for testing.
pub const TEST_FRACTION: f64 = 0.20;

/// Deterministic pseudo-random train/test partitioner.
///
/// The partition is a pure function of (row count, seed): repeated calls
/// with the same inputs produce identical partitions. It is not stratified
/// by label; class balance across the split is incidental.
#[derive(Debug, Clone, Copy)]
pub struct SplitPlanner {
    seed: u64,
}

/// One target's train/test partition with its carried-along data.
///
/// `train ∪ test` covers every input row and `train ∩ test` is empty; the
/// test side holds 20% of rows (rounded up). Identity order follows the
/// shuffle, not the table; consumers re-sort by identity when assembling.
#[derive(Debug)]
pub struct SplitResult {
    /// Feature rows of the training partition.
    pub train_features: Vec<Vec<f64>>,
    /// Feature rows of the test partition.
    pub test_features: Vec<Vec<f64>>,
    /// Encoded labels of the training partition.
    pub train_labels: Vec<usize>,
    /// Encoded labels of the test partition.
    pub test_labels: Vec<usize>,
    /// Identities of the training partition.
    pub train_ids: Vec<RecordId>,
    /// Identities of the test partition.
    pub test_ids: Vec<RecordId>,
}

impl SplitPlanner {
    /// Create a planner for the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Partition parallel (ids, features, labels) into train and test sets.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CoreError::SplitLengthMismatch`] | Parallel inputs disagree in length |
    /// | [`CoreError::TooFewSamples`] | Fewer than two rows, so one side would be empty |
    pub fn split(
        &self,
        ids: &[RecordId],
        features: &[Vec<f64>],
        labels: &[usize],
    ) -> Result<SplitResult, CoreError> {
        if ids.len() != features.len() || ids.len() != labels.len() {
            return Err(CoreError::SplitLengthMismatch {
                ids: ids.len(),
                features: features.len(),
                labels: labels.len(),
            });
        }
        let n_samples = ids.len();
        let n_test = (n_samples as f64 * TEST_FRACTION).ceil() as usize;
        if n_samples < 2 || n_test == n_samples {
            return Err(CoreError::TooFewSamples { n_samples });
        }

        let mut order: Vec<usize> = (0..n_samples).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        order.shuffle(&mut rng);

        let (test_pos, train_pos) = order.split_at(n_test);
        debug!(
            n_samples,
            n_train = train_pos.len(),
            n_test = test_pos.len(),
            "holdout partition drawn"
        );

        let gather = |positions: &[usize]| {
            let f: Vec<Vec<f64>> = positions.iter().map(|&i| features[i].clone()).collect();
            let l: Vec<usize> = positions.iter().map(|&i| labels[i]).collect();
            let s: Vec<RecordId> = positions.iter().map(|&i| ids[i]).collect();
            (f, l, s)
        };
        let (test_features, test_labels, test_ids) = gather(test_pos);
        let (train_features, train_labels, train_ids) = gather(train_pos);

        Ok(SplitResult {
            train_features,
            test_features,
            train_labels,
            test_labels,
            train_ids,
            test_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_inputs(n: usize) -> (Vec<RecordId>, Vec<Vec<f64>>, Vec<usize>) {
        let ids: Vec<RecordId> = (0..n as i64).map(RecordId::new).collect();
        let features: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64]).collect();
        let labels: Vec<usize> = (0..n).map(|i| i % 2).collect();
        (ids, features, labels)
    }

    #[test]
    fn partition_is_disjoint_and_complete() {
        let (ids, features, labels) = make_inputs(10);
        let split = SplitPlanner::new(42).split(&ids, &features, &labels).unwrap();

        assert_eq!(split.test_ids.len(), 2);
        assert_eq!(split.train_ids.len(), 8);

        let mut all: Vec<RecordId> = split
            .train_ids
            .iter()
            .chain(&split.test_ids)
            .copied()
            .collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 10);
    }

    #[test]
    fn deterministic_for_fixed_seed() {
        let (ids, features, labels) = make_inputs(25);
        let planner = SplitPlanner::new(42);
        let first = planner.split(&ids, &features, &labels).unwrap();
        let second = planner.split(&ids, &features, &labels).unwrap();
        assert_eq!(first.test_ids, second.test_ids);
        assert_eq!(first.train_ids, second.train_ids);
        assert_eq!(first.test_features, second.test_features);
    }

    #[test]
    fn different_seeds_differ() {
        let (ids, features, labels) = make_inputs(50);
        let a = SplitPlanner::new(1).split(&ids, &features, &labels).unwrap();
        let b = SplitPlanner::new(2).split(&ids, &features, &labels).unwrap();
        assert_ne!(a.test_ids, b.test_ids);
    }

    #[test]
    fn rows_follow_their_identity() {
        let (ids, features, labels) = make_inputs(10);
        let split = SplitPlanner::new(7).split(&ids, &features, &labels).unwrap();
        for (id, row) in split.test_ids.iter().zip(&split.test_features) {
            assert_eq!(row[0], id.value() as f64);
        }
    }

    #[test]
    fn too_few_samples_error() {
        let (ids, features, labels) = make_inputs(1);
        let err = SplitPlanner::new(42)
            .split(&ids, &features, &labels)
            .unwrap_err();
        assert!(matches!(err, CoreError::TooFewSamples { n_samples: 1 }));
    }

    #[test]
    fn length_mismatch_error() {
        let (ids, features, _) = make_inputs(5);
        let err = SplitPlanner::new(42)
            .split(&ids, &features, &[0, 1])
            .unwrap_err();
        assert!(matches!(err, CoreError::SplitLengthMismatch { .. }));
    }
}
