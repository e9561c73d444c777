//! CART decision tree with Gini impurity splits.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// A node in the flattened tree array.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub(crate) enum Node {
    /// Terminal node carrying the majority class of its samples.
    Leaf { class: usize },
    /// Internal node routing samples by `feature <= threshold`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted CART decision tree.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub(crate) struct DecisionTree {
    nodes: Vec<Node>,
}

/// Per-tree growth parameters, resolved by the forest trainer.
pub(crate) struct GrowParams {
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    /// Number of candidate features drawn per split.
    pub max_features: usize,
    pub n_classes: usize,
}

impl DecisionTree {
    /// Grow a tree on the given sample indices.
    ///
    /// Inputs are pre-validated by the forest trainer; `indices` must be
    /// non-empty.
    pub(crate) fn grow(
        features: &[Vec<f64>],
        labels: &[usize],
        indices: &[usize],
        params: &GrowParams,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow_node(features, labels, indices, 0, params, rng);
        tree
    }

    /// Recursively grow one node, returning its index in `nodes`.
    fn grow_node(
        &mut self,
        features: &[Vec<f64>],
        labels: &[usize],
        indices: &[usize],
        depth: usize,
        params: &GrowParams,
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let counts = class_counts(labels, indices, params.n_classes);
        let majority = argmax(&counts);

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = params.max_depth.is_some_and(|d| depth >= d);
        if pure || depth_reached || indices.len() < 2 * params.min_samples_leaf {
            return self.push(Node::Leaf { class: majority });
        }

        let Some((feature, threshold)) = best_split(features, labels, indices, params, rng) else {
            return self.push(Node::Leaf { class: majority });
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| features[i][feature] <= threshold);

        // Placeholder reserved first so children index correctly.
        let node = self.push(Node::Leaf { class: majority });
        let left = self.grow_node(features, labels, &left_idx, depth + 1, params, rng);
        let right = self.grow_node(features, labels, &right_idx, depth + 1, params, rng);
        self.nodes[node] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        node
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Predict the class of a single sample.
    pub(crate) fn predict(&self, sample: &[f64]) -> usize {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf { class } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if sample[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Count labels per class over the given indices.
fn class_counts(labels: &[usize], indices: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &i in indices {
        counts[labels[i]] += 1;
    }
    counts
}

/// Index of the largest count; ties resolve to the lowest class.
fn argmax(counts: &[usize]) -> usize {
    let mut best = 0;
    for (c, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = c;
        }
    }
    best
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let sum_sq: f64 = counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total as f64;
            p * p
        })
        .sum();
    1.0 - sum_sq
}

/// Exhaustive split search over a random feature subset.
///
/// For each candidate feature, samples are sorted by value and every
/// boundary between distinct consecutive values is scored by weighted Gini
/// impurity. Returns `None` when no split satisfies `min_samples_leaf` on
/// both sides or no feature has two distinct values.
fn best_split(
    features: &[Vec<f64>],
    labels: &[usize],
    indices: &[usize],
    params: &GrowParams,
    rng: &mut ChaCha8Rng,
) -> Option<(usize, f64)> {
    let n_features = features[0].len();
    let mut candidates: Vec<usize> = (0..n_features).collect();
    candidates.shuffle(rng);
    candidates.truncate(params.max_features.max(1));
    // Deterministic scan order once the subset is drawn.
    candidates.sort_unstable();

    let total = indices.len();
    let mut best: Option<(usize, f64, f64)> = None;

    for &feature in &candidates {
        let mut ordered: Vec<(f64, usize)> = indices
            .iter()
            .map(|&i| (features[i][feature], labels[i]))
            .collect();
        ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_counts = vec![0usize; params.n_classes];
        let mut right_counts = class_counts(labels, indices, params.n_classes);

        for pos in 1..total {
            let (value, label) = ordered[pos - 1];
            left_counts[label] += 1;
            right_counts[label] -= 1;

            if value == ordered[pos].0 {
                continue;
            }
            if pos < params.min_samples_leaf || total - pos < params.min_samples_leaf {
                continue;
            }

            let score = (pos as f64 * gini(&left_counts, pos)
                + (total - pos) as f64 * gini(&right_counts, total - pos))
                / total as f64;
            if best.is_none_or(|(_, _, s)| score < s) {
                let threshold = (value + ordered[pos].0) / 2.0;
                best = Some((feature, threshold, score));
            }
        }
    }

    best.map(|(feature, threshold, _)| (feature, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn grow_params(n_classes: usize) -> GrowParams {
        GrowParams {
            max_depth: None,
            min_samples_leaf: 1,
            max_features: 2,
            n_classes,
        }
    }

    #[test]
    fn separable_two_class() {
        let features = vec![vec![1.0], vec![2.0], vec![10.0], vec![11.0]];
        let labels = vec![0, 0, 1, 1];
        let indices = vec![0, 1, 2, 3];
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let tree = DecisionTree::grow(&features, &labels, &indices, &grow_params(2), &mut rng);
        assert_eq!(tree.predict(&[1.5]), 0);
        assert_eq!(tree.predict(&[10.5]), 1);
    }

    #[test]
    fn pure_node_is_leaf() {
        let features = vec![vec![1.0], vec![2.0]];
        let labels = vec![1, 1];
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let tree = DecisionTree::grow(&features, &labels, &[0, 1], &grow_params(2), &mut rng);
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.predict(&[5.0]), 1);
    }

    #[test]
    fn constant_feature_falls_back_to_majority() {
        let features = vec![vec![3.0], vec![3.0], vec![3.0]];
        let labels = vec![0, 1, 1];
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let tree = DecisionTree::grow(&features, &labels, &[0, 1, 2], &grow_params(2), &mut rng);
        assert_eq!(tree.predict(&[3.0]), 1);
    }

    #[test]
    fn max_depth_zero_is_single_leaf() {
        let features = vec![vec![1.0], vec![10.0]];
        let labels = vec![0, 1];
        let params = GrowParams {
            max_depth: Some(0),
            ..grow_params(2)
        };
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let tree = DecisionTree::grow(&features, &labels, &[0, 1], &params, &mut rng);
        assert_eq!(tree.nodes.len(), 1);
    }
}
