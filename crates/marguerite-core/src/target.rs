//! Target specifications and label alphabets.

use crate::CoreError;

/// An explicit, ordered, closed set of category labels.
///
/// The ordering fixes the integer encoding: label `i` encodes to `i`. Any
/// value outside the alphabet is a data error, never a new category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelAlphabet {
    labels: Vec<String>,
}

impl LabelAlphabet {
    /// Build an alphabet from an ordered list of distinct labels.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidAlphabet`] if fewer than two labels are
    /// given or any label repeats.
    pub fn new<I, S>(labels: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.len() < 2 {
            return Err(CoreError::InvalidAlphabet {
                reason: format!("need at least 2 labels, got {}", labels.len()),
            });
        }
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(CoreError::InvalidAlphabet {
                    reason: format!("duplicate label \"{label}\""),
                });
            }
        }
        Ok(Self { labels })
    }

    /// The binary health alphabet: Healthy (positive class), Sick.
    #[must_use]
    pub fn healthy_sick() -> Self {
        Self {
            labels: vec!["Healthy".into(), "Sick".into()],
        }
    }

    /// The binary heat-stress alphabet: Healthy (positive class), Stressed.
    #[must_use]
    pub fn healthy_stressed() -> Self {
        Self {
            labels: vec!["Healthy".into(), "Stressed".into()],
        }
    }

    /// The three-class quality alphabet: Low, Medium, High.
    #[must_use]
    pub fn quality_grades() -> Self {
        Self {
            labels: vec!["Low".into(), "Medium".into(), "High".into()],
        }
    }

    /// Return the ordered labels.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Return the number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Alphabets are never empty; present for completeness.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Whether this alphabet has exactly two labels.
    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.labels.len() == 2
    }

    /// Return the code of a label, if it is a member.
    #[must_use]
    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Return the label for a code, if in range.
    #[must_use]
    pub fn label(&self, code: usize) -> Option<&str> {
        self.labels.get(code).map(String::as_str)
    }
}

/// Static descriptor of one estimated condition.
///
/// Names the feature columns the classifier consumes, the ground-truth and
/// prediction columns, and the label alphabet. Per-target holdout splits
/// are independent planner invocations sharing the run seed; the first
/// configured target of a run is the reference whose test identities define
/// the exported row subset.
#[derive(Debug, Clone)]
pub struct TargetSpec {
    name: String,
    feature_columns: Vec<String>,
    label_column: String,
    predicted_column: String,
    alphabet: LabelAlphabet,
}

impl TargetSpec {
    /// Create a new target spec.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        feature_columns: Vec<String>,
        label_column: impl Into<String>,
        predicted_column: impl Into<String>,
        alphabet: LabelAlphabet,
    ) -> Self {
        Self {
            name: name.into(),
            feature_columns,
            label_column: label_column.into(),
            predicted_column: predicted_column.into(),
            alphabet,
        }
    }

    /// Return the target name (also the model artifact stem).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the feature column names.
    #[must_use]
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// Return the ground-truth label column name.
    #[must_use]
    pub fn label_column(&self) -> &str {
        &self.label_column
    }

    /// Return the prediction output column name.
    #[must_use]
    pub fn predicted_column(&self) -> &str {
        &self.predicted_column
    }

    /// Return the label alphabet.
    #[must_use]
    pub fn alphabet(&self) -> &LabelAlphabet {
        &self.alphabet
    }
}

fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

/// The four binary herd-health targets.
#[must_use]
pub fn herd_health_targets() -> Vec<TargetSpec> {
    vec![
        TargetSpec::new(
            "Lameness",
            cols(&["Total Daily Lying"]),
            "ActualLameness",
            "PredictedLameness",
            LabelAlphabet::healthy_sick(),
        ),
        TargetSpec::new(
            "Ketosis",
            cols(&["Daily Fat", "Daily Proteins", "Daily Fat/Proteins"]),
            "ActualKetosis",
            "PredictedKetosis",
            LabelAlphabet::healthy_sick(),
        ),
        TargetSpec::new(
            "Mastitis",
            cols(&["Conductivity 1", "Conductivity 2", "Conductivity 3"]),
            "ActualMastitis",
            "PredictedMastitis",
            LabelAlphabet::healthy_sick(),
        ),
        TargetSpec::new(
            "HeatStress",
            cols(&[
                "Average Rumination Time 1",
                "Average Rumination Time 2",
                "Average Rumination Time 3",
                "Average Ingestion Time 1",
                "Average Ingestion Time 2",
                "Average Ingestion Time 3",
            ]),
            "ActualHeatStress",
            "PredictedHeatStress",
            LabelAlphabet::healthy_stressed(),
        ),
    ]
}

/// The single three-class milk-quality target.
#[must_use]
pub fn milk_quality_targets() -> Vec<TargetSpec> {
    vec![TargetSpec::new(
        "Quality",
        cols(&[
            "AciditySH",
            "Casein",
            "Density",
            "Fat",
            "Freezing Point mC",
            "Lactose",
            "Protein",
            "SNF",
            "Urea",
        ]),
        "Actual Quality",
        "Predicted Quality",
        LabelAlphabet::quality_grades(),
    )]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_rejects_duplicates() {
        let err = LabelAlphabet::new(["Healthy", "Healthy"]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAlphabet { .. }));
    }

    #[test]
    fn alphabet_rejects_single_label() {
        let err = LabelAlphabet::new(["Only"]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAlphabet { .. }));
    }

    #[test]
    fn alphabet_position_and_label_are_inverse() {
        let alphabet = LabelAlphabet::quality_grades();
        for (i, label) in alphabet.labels().iter().enumerate() {
            assert_eq!(alphabet.position(label), Some(i));
            assert_eq!(alphabet.label(i), Some(label.as_str()));
        }
        assert_eq!(alphabet.position("Unknown"), None);
        assert_eq!(alphabet.label(3), None);
    }

    #[test]
    fn herd_targets_are_binary() {
        let targets = herd_health_targets();
        assert_eq!(targets.len(), 4);
        assert!(targets.iter().all(|t| t.alphabet().is_binary()));
        assert_eq!(targets[0].name(), "Lameness");
    }

    #[test]
    fn milk_target_is_three_class() {
        let targets = milk_quality_targets();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].alphabet().len(), 3);
        assert_eq!(targets[0].feature_columns().len(), 9);
    }
}
