//! Confusion-matrix-derived quality metrics per target.

use tracing::debug;

use crate::CoreError;

/// Round a percentage to two decimals.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A rate as a percentage; zero when the denominator is zero.
fn rate(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        round2(numerator as f64 / denominator as f64 * 100.0)
    }
}

fn mean(values: &[f64]) -> f64 {
    round2(values.iter().sum::<f64>() / values.len() as f64)
}

/// Quality metrics for one target, computed over its test partition.
///
/// All rates are percentages rounded to two decimals. The formula family is
/// selected by alphabet size: two labels use the positive-class counting
/// rules (alphabet index 0 is the positive class), three or more use
/// per-class confusion-matrix rates averaged across classes.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetMetrics {
    /// True positives (binary) or summed per-class true positives.
    pub true_positives: usize,
    /// False positives (binary) or summed per-class false positives.
    pub false_positives: usize,
    /// True negatives (binary) or summed per-class true negatives.
    pub true_negatives: usize,
    /// False negatives (binary) or summed per-class false negatives.
    pub false_negatives: usize,
    /// TP/(TP+FN); multi-class: mean of per-class rates.
    pub true_positive_rate: f64,
    /// FP/(FP+TN); multi-class: mean of per-class rates.
    pub false_positive_rate: f64,
    /// Reported precision: macro average across classes.
    pub precision: f64,
    /// Reported accuracy: overall for binary, mean per-class for multi-class.
    pub accuracy: f64,
    /// Proportion of correct predictions over all pairs.
    pub overall_accuracy: f64,
    /// Mean of per-class precisions.
    pub macro_precision: f64,
    /// Pooled TP/(TP+FP) across all classes.
    pub micro_precision: f64,
}

impl TargetMetrics {
    /// Compute metrics from paired actual/predicted label codes.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CoreError::EmptyTestPartition`] | Zero pairs provided |
    /// | [`CoreError::MetricsLengthMismatch`] | `actual` and `predicted` lengths differ |
    pub fn from_labels(
        n_classes: usize,
        actual: &[usize],
        predicted: &[usize],
    ) -> Result<Self, CoreError> {
        if actual.len() != predicted.len() {
            return Err(CoreError::MetricsLengthMismatch {
                actual: actual.len(),
                predicted: predicted.len(),
            });
        }
        if actual.is_empty() {
            return Err(CoreError::EmptyTestPartition);
        }

        let metrics = if n_classes == 2 {
            binary_metrics(actual, predicted)
        } else {
            multiclass_metrics(n_classes, actual, predicted)
        };
        debug!(
            n_pairs = actual.len(),
            n_classes,
            accuracy = metrics.accuracy,
            "metrics computed"
        );
        Ok(metrics)
    }
}

/// Binary counting rules: class 0 is the positive class.
fn binary_metrics(actual: &[usize], predicted: &[usize]) -> TargetMetrics {
    let mut tp = 0;
    let mut fp = 0;
    let mut tn = 0;
    let mut fn_ = 0;
    for (&a, &p) in actual.iter().zip(predicted) {
        if a == p && p == 0 {
            tp += 1;
        }
        if p == 0 && a != p {
            fp += 1;
        }
        if a == p && p == 1 {
            tn += 1;
        }
        if p == 1 && a != p {
            fn_ += 1;
        }
    }

    let total = actual.len();
    let correct = tp + tn;
    let precision_positive = rate(tp, tp + fp);
    let precision_negative = rate(tn, tn + fn_);

    TargetMetrics {
        true_positives: tp,
        false_positives: fp,
        true_negatives: tn,
        false_negatives: fn_,
        true_positive_rate: rate(tp, tp + fn_),
        false_positive_rate: rate(fp, fp + tn),
        precision: mean(&[precision_positive, precision_negative]),
        accuracy: rate(correct, total),
        overall_accuracy: rate(correct, total),
        macro_precision: mean(&[precision_positive, precision_negative]),
        micro_precision: rate(correct, total),
    }
}

/// Per-class confusion-matrix rates averaged across classes.
fn multiclass_metrics(n_classes: usize, actual: &[usize], predicted: &[usize]) -> TargetMetrics {
    let mut matrix = vec![vec![0usize; n_classes]; n_classes];
    for (&a, &p) in actual.iter().zip(predicted) {
        matrix[a][p] += 1;
    }
    let total = actual.len();

    let mut tp_sum = 0;
    let mut fp_sum = 0;
    let mut tn_sum = 0;
    let mut fn_sum = 0;
    let mut tpr = Vec::with_capacity(n_classes);
    let mut fpr = Vec::with_capacity(n_classes);
    let mut ppv = Vec::with_capacity(n_classes);
    let mut acc = Vec::with_capacity(n_classes);

    for c in 0..n_classes {
        let tp = matrix[c][c];
        let fp: usize = (0..n_classes).map(|r| matrix[r][c]).sum::<usize>() - tp;
        let fn_: usize = matrix[c].iter().sum::<usize>() - tp;
        let tn = total - tp - fp - fn_;

        tp_sum += tp;
        fp_sum += fp;
        tn_sum += tn;
        fn_sum += fn_;

        tpr.push(rate(tp, tp + fn_));
        ppv.push(rate(tp, tp + fp));
        fpr.push(rate(fp, fp + tn));
        acc.push(rate(tp + tn, total));
    }

    let correct: usize = (0..n_classes).map(|c| matrix[c][c]).sum();
    let macro_precision = mean(&ppv);

    TargetMetrics {
        true_positives: tp_sum,
        false_positives: fp_sum,
        true_negatives: tn_sum,
        false_negatives: fn_sum,
        true_positive_rate: mean(&tpr),
        false_positive_rate: mean(&fpr),
        precision: macro_precision,
        accuracy: mean(&acc),
        overall_accuracy: rate(correct, total),
        macro_precision,
        micro_precision: rate(tp_sum, tp_sum + fp_sum),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_counts_sum_to_test_size() {
        let actual = vec![0, 1, 0, 1, 0, 0, 1];
        let predicted = vec![0, 0, 1, 1, 0, 1, 1];
        let m = TargetMetrics::from_labels(2, &actual, &predicted).unwrap();
        assert_eq!(
            m.true_positives + m.false_positives + m.true_negatives + m.false_negatives,
            actual.len()
        );
    }

    #[test]
    fn binary_known_confusion() {
        // TP=1 (both 0), FP=1 (predicted 0, actual 1), TN=1, FN=0.
        let actual = vec![0, 1, 1];
        let predicted = vec![0, 0, 1];
        let m = TargetMetrics::from_labels(2, &actual, &predicted).unwrap();
        assert_eq!(m.true_positives, 1);
        assert_eq!(m.false_positives, 1);
        assert_eq!(m.true_negatives, 1);
        assert_eq!(m.false_negatives, 0);
        assert!((m.true_positive_rate - 100.00).abs() < 0.01);
        assert!((m.false_positive_rate - 50.00).abs() < 0.01);
        assert!((m.accuracy - 66.67).abs() < 0.01);
    }

    #[test]
    fn binary_zero_denominator_is_zero_rate() {
        // Everything predicted negative: TP+FN>0 but FP+TN covers all.
        let actual = vec![1, 1, 1];
        let predicted = vec![1, 1, 1];
        let m = TargetMetrics::from_labels(2, &actual, &predicted).unwrap();
        // No positive actuals or predictions at all.
        assert_eq!(m.true_positive_rate, 0.0);
        assert_eq!(m.false_positive_rate, 0.0);
        assert!((m.accuracy - 100.0).abs() < 0.01);
    }

    #[test]
    fn perfect_binary_predictions() {
        let actual = vec![0, 0, 1, 1];
        let predicted = vec![0, 0, 1, 1];
        let m = TargetMetrics::from_labels(2, &actual, &predicted).unwrap();
        assert!((m.true_positive_rate - 100.0).abs() < 0.01);
        assert_eq!(m.false_positive_rate, 0.0);
        assert!((m.precision - 100.0).abs() < 0.01);
        assert!((m.accuracy - 100.0).abs() < 0.01);
    }

    #[test]
    fn multiclass_perfect_predictions() {
        let actual = vec![0, 1, 2, 0, 1, 2];
        let predicted = actual.clone();
        let m = TargetMetrics::from_labels(3, &actual, &predicted).unwrap();
        assert!((m.true_positive_rate - 100.0).abs() < 0.01);
        assert_eq!(m.false_positive_rate, 0.0);
        assert!((m.precision - 100.0).abs() < 0.01);
        assert!((m.accuracy - 100.0).abs() < 0.01);
        assert!((m.overall_accuracy - 100.0).abs() < 0.01);
    }

    #[test]
    fn multiclass_known_confusion() {
        // True: [0,0,0, 1,1,1, 2,2,2]; Pred: [0,0,1, 1,1,2, 2,2,0]
        // Each class: TP=2, FP=1, FN=1, TN=5.
        let actual = vec![0, 0, 0, 1, 1, 1, 2, 2, 2];
        let predicted = vec![0, 0, 1, 1, 1, 2, 2, 2, 0];
        let m = TargetMetrics::from_labels(3, &actual, &predicted).unwrap();

        assert_eq!(m.true_positives, 6);
        assert_eq!(m.false_positives, 3);
        assert_eq!(m.false_negatives, 3);
        assert_eq!(m.true_negatives, 15);
        // Per-class TPR = 2/3, PPV = 2/3, FPR = 1/6, ACC = 7/9.
        assert!((m.true_positive_rate - 66.67).abs() < 0.01);
        assert!((m.precision - 66.67).abs() < 0.01);
        assert!((m.false_positive_rate - 16.67).abs() < 0.01);
        assert!((m.accuracy - 77.78).abs() < 0.01);
        assert!((m.overall_accuracy - 66.67).abs() < 0.01);
        assert!((m.micro_precision - 66.67).abs() < 0.01);
    }

    #[test]
    fn empty_pairs_error() {
        let err = TargetMetrics::from_labels(2, &[], &[]).unwrap_err();
        assert!(matches!(err, CoreError::EmptyTestPartition));
    }

    #[test]
    fn length_mismatch_error() {
        let err = TargetMetrics::from_labels(2, &[0, 1], &[0]).unwrap_err();
        assert!(matches!(err, CoreError::MetricsLengthMismatch { .. }));
    }
}
