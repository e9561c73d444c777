//! Flat JSON record adapter.

use std::path::Path;

use marguerite_core::{Cell, RecordId, SampleTable};
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::IoError;

/// Default name of the row identity field.
const INDEX_FIELD: &str = "Index";

/// Reads a JSON array of row records into a [`SampleTable`].
///
/// Each record is an object keyed by column name. One integer field (by
/// default `Index`) carries the stable row identity and is not stored as a
/// column; the remaining fields become columns in the order the first
/// record lists them. Numbers become numeric cells, strings become text,
/// and `null` becomes empty text.
pub struct RecordReader {
    index_field: String,
}

impl Default for RecordReader {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordReader {
    /// Create a reader using the default `Index` identity field.
    #[must_use]
    pub fn new() -> Self {
        Self {
            index_field: INDEX_FIELD.to_string(),
        }
    }

    /// Override the identity field name.
    #[must_use]
    pub fn with_index_field(mut self, field: impl Into<String>) -> Self {
        self.index_field = field.into();
        self
    }

    /// Read a document from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::FileNotFound`] if the file is unreadable, plus
    /// everything [`RecordReader::read_str`] can return.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn read_path(&self, path: &Path) -> Result<SampleTable, IoError> {
        let text = std::fs::read_to_string(path).map_err(|e| IoError::FileNotFound {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.read_str(&text)
    }

    /// Parse a JSON document into a table.
    ///
    /// Malformed input is logged with a snippet of the offending text and
    /// propagated as a hard failure.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::JsonParse`] | Input is not valid JSON |
    /// | [`IoError::DocumentShape`] | Root is not an array of objects |
    /// | [`IoError::BadIdentity`] | Identity field absent or not an integer |
    /// | [`IoError::MissingField`] | A record lacks a column of the first record |
    /// | [`IoError::BadFieldValue`] | A field is an array/object/bool |
    #[instrument(skip_all)]
    pub fn read_str(&self, text: &str) -> Result<SampleTable, IoError> {
        let document: Value = serde_json::from_str(text).map_err(|e| {
            let snippet: String = text.chars().take(80).collect();
            error!(%snippet, error = %e, "input document is not valid JSON");
            IoError::JsonParse { snippet, source: e }
        })?;

        let records = document.as_array().ok_or(IoError::DocumentShape {
            expected: "a JSON array of row records",
        })?;

        let mut columns: Vec<String> = Vec::new();
        let mut ids = Vec::with_capacity(records.len());
        let mut rows = Vec::with_capacity(records.len());

        for (row_index, record) in records.iter().enumerate() {
            let fields = record.as_object().ok_or(IoError::DocumentShape {
                expected: "an object per row record",
            })?;

            if columns.is_empty() {
                columns = fields
                    .keys()
                    .filter(|k| *k != &self.index_field)
                    .cloned()
                    .collect();
            }

            let id = fields
                .get(&self.index_field)
                .and_then(Value::as_i64)
                .ok_or_else(|| IoError::BadIdentity {
                    row_index,
                    field: self.index_field.clone(),
                })?;
            ids.push(RecordId::new(id));

            let row = columns
                .iter()
                .map(|column| {
                    let value = fields.get(column).ok_or_else(|| IoError::MissingField {
                        row_index,
                        field: column.clone(),
                    })?;
                    cell_from_value(value, row_index, column)
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }

        let table = SampleTable::new(ids, columns, rows)?;
        info!(
            n_rows = table.n_rows(),
            n_columns = table.columns().len(),
            "record document loaded"
        );
        Ok(table)
    }
}

/// Convert one JSON value into a table cell.
fn cell_from_value(value: &Value, row_index: usize, column: &str) -> Result<Cell, IoError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(Cell::Number)
            .ok_or_else(|| IoError::BadFieldValue {
                row_index,
                field: column.to_string(),
                value: n.to_string(),
            }),
        Value::String(s) => Ok(Cell::Text(s.clone())),
        Value::Null => Ok(Cell::Text(String::new())),
        other => Err(IoError::BadFieldValue {
            row_index,
            field: column.to_string(),
            value: other.to_string(),
        }),
    }
}
