//! I/O error types for dataset adapters, assembly, and exchange.

use std::path::PathBuf;

/// Errors from document parsing, result assembly, and exchange.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the input document is not valid JSON.
    #[error("invalid JSON input: {snippet}")]
    JsonParse {
        /// A short excerpt of the offending input.
        snippet: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when the document root has the wrong shape.
    #[error("unexpected document shape: expected {expected}")]
    DocumentShape {
        /// Description of the expected root.
        expected: &'static str,
    },

    /// Returned when a row record is missing a required field.
    #[error("row {row_index} is missing field \"{field}\"")]
    MissingField {
        /// Zero-based row position in the document.
        row_index: usize,
        /// The absent field name.
        field: String,
    },

    /// Returned when a field holds a value of an unusable type.
    #[error("row {row_index} field \"{field}\" has unsupported value {value}")]
    BadFieldValue {
        /// Zero-based row position in the document.
        row_index: usize,
        /// The field name.
        field: String,
        /// Rendered offending value.
        value: String,
    },

    /// Returned when the row identity field is absent or not an integer.
    #[error("row {row_index} has no usable identity in field \"{field}\"")]
    BadIdentity {
        /// Zero-based row position in the document.
        row_index: usize,
        /// The identity field name.
        field: String,
    },

    /// Returned when a graph document block is shorter than the stride.
    #[error("graph block starting at entry {entry_index} is truncated: {got} of {stride} entries")]
    TruncatedGraphBlock {
        /// Index of the first entry of the block.
        entry_index: usize,
        /// Entries available.
        got: usize,
        /// Entries required per block.
        stride: usize,
    },

    /// Returned when an assembled row identity is absent from the table.
    #[error("row id {id} is not present in the sample table")]
    RowNotFound {
        /// The missing identity.
        id: i64,
    },

    /// Returned when a date cell is not in `YYYY-MM-DD` form.
    #[error("column \"{column}\" value \"{raw}\" is not an ISO date")]
    DateFormat {
        /// The column name.
        column: String,
        /// The raw value.
        raw: String,
    },

    /// Returned when delimited serialization fails.
    #[error("cannot build delimited exchange payload")]
    Delimited {
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the translation service call fails.
    #[error("translation service request to {url} failed")]
    Translator {
        /// The endpoint URL.
        url: String,
        /// Underlying transport error.
        source: Box<ureq::Error>,
    },

    /// Returned when the translation service responds with invalid JSON.
    #[error("translation service at {url} returned invalid JSON")]
    TranslatorResponse {
        /// The endpoint URL.
        url: String,
        /// Underlying I/O error while decoding the body.
        source: std::io::Error,
    },

    /// Propagated pipeline error (table construction, column extraction).
    #[error(transparent)]
    Core(#[from] marguerite_core::CoreError),
}
