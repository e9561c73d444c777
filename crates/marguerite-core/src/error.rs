//! Error types for the classification pipeline.

use std::path::PathBuf;

/// Errors from pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Returned when a label is not a member of the configured alphabet.
    #[error("label \"{label}\" is not in the alphabet [{alphabet}]")]
    UnknownLabel {
        /// The offending label value.
        label: String,
        /// Comma-joined alphabet for diagnostics.
        alphabet: String,
    },

    /// Returned when decoding an integer code outside the alphabet range.
    #[error("label code {code} is out of range for an alphabet of {size} labels")]
    InvalidLabelCode {
        /// The offending code.
        code: usize,
        /// The alphabet size.
        size: usize,
    },

    /// Returned when an alphabet has fewer than two labels or duplicates.
    #[error("invalid label alphabet: {reason}")]
    InvalidAlphabet {
        /// Human-readable description of the defect.
        reason: String,
    },

    /// Returned when a required column is absent from the sample table.
    #[error("column \"{column}\" not found in the sample table")]
    MissingColumn {
        /// The requested column name.
        column: String,
    },

    /// Returned when a cell holds text where a numeric value is required.
    #[error("non-numeric value \"{raw}\" in column \"{column}\", row id {id}")]
    NonNumericCell {
        /// The column name.
        column: String,
        /// The row identity.
        id: i64,
        /// The raw textual value.
        raw: String,
    },

    /// Returned when a table is built from rows of inconsistent width.
    #[error("row id {id} has {got} cells, expected {expected}")]
    InconsistentRowWidth {
        /// The row identity.
        id: i64,
        /// Expected cell count (from the column list).
        expected: usize,
        /// Actual cell count.
        got: usize,
    },

    /// Returned when the same row identity appears twice.
    #[error("duplicate row id {id}")]
    DuplicateRecordId {
        /// The duplicated identity.
        id: i64,
    },

    /// Returned when there are too few rows to derive a holdout partition.
    #[error("{n_samples} sample(s) cannot be split into train and test partitions")]
    TooFewSamples {
        /// Number of rows available.
        n_samples: usize,
    },

    /// Returned when parallel inputs to the split planner disagree in length.
    #[error("split inputs disagree: {ids} ids, {features} feature rows, {labels} labels")]
    SplitLengthMismatch {
        /// Number of identities.
        ids: usize,
        /// Number of feature rows.
        features: usize,
        /// Number of labels.
        labels: usize,
    },

    /// Returned when actual/predicted label sequences disagree in length.
    #[error("metrics inputs disagree: {actual} actual vs {predicted} predicted labels")]
    MetricsLengthMismatch {
        /// Number of actual labels.
        actual: usize,
        /// Number of predicted labels.
        predicted: usize,
    },

    /// Returned when the metrics engine receives zero pairs.
    #[error("cannot compute metrics over an empty test partition")]
    EmptyTestPartition,

    /// Returned when the model directory cannot be created.
    #[error("cannot create model directory {path}")]
    ModelDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when listing the model directory fails.
    #[error("cannot list model directory {path}")]
    ModelDirList {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Propagated classifier capability error.
    #[error(transparent)]
    Classifier(#[from] marguerite_rf::RfError),
}
