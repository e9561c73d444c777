//! Random Forest training with seeded bootstrap sampling.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

use crate::config::ForestConfig;
use crate::error::RfError;
use crate::tree::{DecisionTree, GrowParams};

/// A fitted Random Forest ensemble.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Forest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

/// Draw a bootstrap sample of `n_samples` indices with replacement.
fn bootstrap_sample(n_samples: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

/// Train the Random Forest ensemble.
///
/// Trees are grown one at a time; each gets its own RNG stream derived from
/// the master seed, so the fitted model is a pure function of
/// (config, features, labels).
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train(
    config: &ForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
) -> Result<Forest, RfError> {
    if features.is_empty() {
        return Err(RfError::EmptyDataset);
    }
    let n_samples = features.len();
    let n_features = features[0].len();
    if n_features == 0 {
        return Err(RfError::ZeroFeatures);
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(RfError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        for (feature_index, &val) in row.iter().enumerate() {
            if !val.is_finite() {
                return Err(RfError::NonFiniteValue {
                    sample_index,
                    feature_index,
                });
            }
        }
    }

    let n_classes = labels.iter().max().copied().unwrap_or(0) + 1;
    let max_features = (n_features as f64).sqrt().ceil() as usize;

    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        n_classes,
        max_features,
        "training random forest"
    );

    let params = GrowParams {
        max_depth: config.max_depth,
        min_samples_leaf: config.min_samples_leaf,
        max_features,
        n_classes,
    };

    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut trees = Vec::with_capacity(config.n_trees);
    for _ in 0..config.n_trees {
        let mut rng = ChaCha8Rng::seed_from_u64(master_rng.gen());
        let indices = bootstrap_sample(n_samples, &mut rng);
        trees.push(DecisionTree::grow(features, labels, &indices, &params, &mut rng));
    }

    debug!(n_trees_trained = trees.len(), "tree training complete");

    Ok(Forest {
        trees,
        n_features,
        n_classes,
    })
}

impl Forest {
    /// Predict the class label for a single sample by majority vote.
    ///
    /// Vote ties resolve to the lowest class index.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when
    /// `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let mut votes = vec![0usize; self.n_classes];
        for tree in &self.trees {
            votes[tree.predict(sample)] += 1;
        }
        let mut best = 0;
        for (c, &count) in votes.iter().enumerate() {
            if count > votes[best] {
                best = c;
            }
        }
        Ok(best)
    }

    /// Predict class labels for a batch of samples.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] if any sample has the
    /// wrong feature count.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, RfError> {
        features.iter().map(|sample| self.predict(sample)).collect()
    }

    /// Return the number of features this forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ForestConfig;

    /// Generate a simple 2-class separable dataset.
    fn make_separable_data() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            features.push(vec![i as f64 * 0.15, 0.5]);
            labels.push(0);
        }
        for i in 0..20 {
            features.push(vec![10.0 + i as f64 * 0.15, 0.5]);
            labels.push(1);
        }
        (features, labels)
    }

    #[test]
    fn two_class_separable_accuracy() {
        let (features, labels) = make_separable_data();
        let forest = ForestConfig::new(25)
            .unwrap()
            .with_seed(42)
            .fit(&features, &labels)
            .unwrap();

        let predictions = forest.predict_batch(&features).unwrap();
        let correct = predictions
            .iter()
            .zip(&labels)
            .filter(|&(&p, &l)| p == l)
            .count();
        let accuracy = correct as f64 / labels.len() as f64;
        assert!(accuracy > 0.9, "accuracy = {accuracy}");
    }

    #[test]
    fn deterministic_with_same_seed() {
        let (features, labels) = make_separable_data();
        let forest1 = ForestConfig::new(10)
            .unwrap()
            .with_seed(99)
            .fit(&features, &labels)
            .unwrap();
        let forest2 = ForestConfig::new(10)
            .unwrap()
            .with_seed(99)
            .fit(&features, &labels)
            .unwrap();

        let preds1 = forest1.predict_batch(&features).unwrap();
        let preds2 = forest2.predict_batch(&features).unwrap();
        assert_eq!(preds1, preds2);
    }

    #[test]
    fn invalid_tree_count_error() {
        assert!(ForestConfig::new(0).is_err());
    }

    #[test]
    fn empty_dataset_error() {
        let config = ForestConfig::new(10).unwrap();
        let err = config.fit(&[], &[]).unwrap_err();
        assert!(matches!(err, crate::RfError::EmptyDataset));
    }

    #[test]
    fn feature_count_mismatch_error() {
        let config = ForestConfig::new(5).unwrap();
        let features = vec![vec![1.0, 2.0], vec![3.0]];
        let err = config.fit(&features, &[0, 1]).unwrap_err();
        assert!(matches!(
            err,
            crate::RfError::FeatureCountMismatch { sample_index: 1, .. }
        ));
    }

    #[test]
    fn non_finite_value_error() {
        let config = ForestConfig::new(5).unwrap();
        let features = vec![vec![1.0], vec![f64::NAN]];
        let err = config.fit(&features, &[0, 1]).unwrap_err();
        assert!(matches!(err, crate::RfError::NonFiniteValue { .. }));
    }

    #[test]
    fn prediction_feature_mismatch_error() {
        let (features, labels) = make_separable_data();
        let forest = ForestConfig::new(5)
            .unwrap()
            .fit(&features, &labels)
            .unwrap();
        let err = forest.predict(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            crate::RfError::PredictionFeatureMismatch { expected: 2, got: 1 }
        ));
    }
}
