//! Configuration builder for Random Forest training.

use crate::error::RfError;
use crate::forest::Forest;

/// Configuration for Random Forest training.
///
/// Construct via [`ForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default            |
/// |---------------------|--------------------|
/// | `max_depth`         | `None` (unlimited) |
/// | `min_samples_leaf`  | 1                  |
/// | `seed`              | 42                 |
#[derive(Debug, Clone)]
pub struct ForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_leaf: usize,
    pub(crate) seed: u64,
}

impl ForestConfig {
    /// Create a new config with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, RfError> {
        if n_trees == 0 {
            return Err(RfError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_depth: None,
            min_samples_leaf: 1,
            seed: 42,
        })
    }

    /// Set the maximum tree depth. `None` means unlimited.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples required in each leaf.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Train a Random Forest on the provided dataset.
    ///
    /// `features[sample_idx][feature_idx]` — row-major layout.
    /// `labels[sample_idx]` — class labels (zero-based).
    ///
    /// # Errors
    ///
    /// | Variant                           | When                               |
    /// |-----------------------------------|------------------------------------|
    /// | [`RfError::EmptyDataset`]         | `features` is empty                |
    /// | [`RfError::ZeroFeatures`]         | rows have zero feature columns     |
    /// | [`RfError::FeatureCountMismatch`] | rows have inconsistent lengths     |
    /// | [`RfError::NonFiniteValue`]       | any value is NaN or infinite       |
    pub fn fit(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<Forest, RfError> {
        crate::forest::train(self, features, labels)
    }
}
