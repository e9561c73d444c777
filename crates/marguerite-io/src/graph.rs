//! Nested graph-document adapter with positional extraction.

use marguerite_core::{Cell, LabelAlphabet, RecordId, SampleTable};
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::IoError;

/// How to extract one column from its entry within a row block.
#[derive(Debug, Clone)]
pub enum GraphField {
    /// The row identity, read from the entry's `identifier` field.
    Identifier,
    /// An observation timestamp, read from the entry's `resultTime` field.
    Timestamp,
    /// A measurement, read from `hasResult[0].numericValue`.
    Measurement,
    /// A numeric value read directly from the named entry field.
    Quantity(&'static str),
    /// A categorical status, matched against `hasResult` marker strings of
    /// the form `#...-<Label>`. Unknown markers yield empty text.
    Status(LabelAlphabet),
}

/// One column of the positional layout: where in the block, and how.
#[derive(Debug, Clone)]
pub struct GraphColumn {
    /// Output column name (empty for the identifier).
    pub name: &'static str,
    /// Entry offset within the row block.
    pub offset: usize,
    /// Extraction rule.
    pub field: GraphField,
}

/// Reads a nested graph-style document into a [`SampleTable`].
///
/// The document root holds a `@graph` array whose first entry is a metrics
/// storage placeholder; the remaining entries form fixed-stride blocks, one
/// block per row. Column values sit at fixed offsets within each block.
pub struct GraphReader {
    stride: usize,
    columns: Vec<GraphColumn>,
}

impl GraphReader {
    /// Create a reader over a custom positional layout.
    #[must_use]
    pub fn new(stride: usize, columns: Vec<GraphColumn>) -> Self {
        Self { stride, columns }
    }

    /// The herd-health observation layout: 36 entries per animal.
    #[must_use]
    pub fn herd_health() -> Self {
        use GraphField::{Identifier, Measurement, Quantity, Status, Timestamp};
        let healthy_sick = LabelAlphabet::healthy_sick;
        let healthy_stressed = LabelAlphabet::healthy_stressed;
        let columns = vec![
            GraphColumn { name: "Cow", offset: 0, field: Quantity("livestockNumber") },
            GraphColumn { name: "Index", offset: 1, field: Identifier },
            GraphColumn { name: "Date", offset: 2, field: Timestamp },
            GraphColumn { name: "Pedometer", offset: 7, field: Measurement },
            GraphColumn { name: "MID", offset: 8, field: Measurement },
            GraphColumn { name: "Lactations", offset: 9, field: Measurement },
            GraphColumn { name: "Daily Production", offset: 10, field: Measurement },
            GraphColumn { name: "Average Daily Production", offset: 11, field: Measurement },
            GraphColumn { name: "Daily Fat", offset: 12, field: Measurement },
            GraphColumn { name: "Daily Proteins", offset: 13, field: Measurement },
            GraphColumn { name: "Daily Fat/Proteins", offset: 14, field: Measurement },
            GraphColumn { name: "Total Daily Lying", offset: 15, field: Measurement },
            GraphColumn { name: "ActualLameness", offset: 16, field: Status(healthy_sick()) },
            GraphColumn { name: "PredictedLameness", offset: 17, field: Status(healthy_sick()) },
            GraphColumn { name: "ActualKetosis", offset: 18, field: Status(healthy_sick()) },
            GraphColumn { name: "PredictedKetosis", offset: 19, field: Status(healthy_sick()) },
            GraphColumn { name: "ActualMastitis", offset: 20, field: Status(healthy_sick()) },
            GraphColumn { name: "PredictedMastitis", offset: 21, field: Status(healthy_sick()) },
            GraphColumn { name: "ActualHeatStress", offset: 22, field: Status(healthy_stressed()) },
            GraphColumn { name: "PredictedHeatStress", offset: 23, field: Status(healthy_stressed()) },
            GraphColumn { name: "Conductivity 1", offset: 24, field: Measurement },
            GraphColumn { name: "Conductivity 2", offset: 25, field: Measurement },
            GraphColumn { name: "Conductivity 3", offset: 26, field: Measurement },
            GraphColumn { name: "Activity 1", offset: 27, field: Measurement },
            GraphColumn { name: "Activity 2", offset: 28, field: Measurement },
            GraphColumn { name: "Activity 3", offset: 29, field: Measurement },
            GraphColumn { name: "Average Rumination Time 1", offset: 30, field: Measurement },
            GraphColumn { name: "Average Rumination Time 2", offset: 31, field: Measurement },
            GraphColumn { name: "Average Rumination Time 3", offset: 32, field: Measurement },
            GraphColumn { name: "Average Ingestion Time 1", offset: 33, field: Measurement },
            GraphColumn { name: "Average Ingestion Time 2", offset: 34, field: Measurement },
            GraphColumn { name: "Average Ingestion Time 3", offset: 35, field: Measurement },
        ];
        Self::new(36, columns)
    }

    /// Parse a graph document into a table.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::JsonParse`] | Input is not valid JSON |
    /// | [`IoError::DocumentShape`] | Root lacks a `@graph` array |
    /// | [`IoError::TruncatedGraphBlock`] | Trailing block shorter than the stride |
    /// | [`IoError::BadIdentity`] | An identifier entry is unusable |
    /// | [`IoError::BadFieldValue`] | A measurement entry is unusable |
    #[instrument(skip_all)]
    pub fn read_str(&self, text: &str) -> Result<SampleTable, IoError> {
        let document: Value = serde_json::from_str(text).map_err(|e| {
            let snippet: String = text.chars().take(80).collect();
            error!(%snippet, error = %e, "graph document is not valid JSON");
            IoError::JsonParse { snippet, source: e }
        })?;

        let entries = document
            .get("@graph")
            .and_then(Value::as_array)
            .ok_or(IoError::DocumentShape {
                expected: "an object with a @graph array",
            })?;

        // Entry 0 is the metrics storage placeholder.
        let body = entries.get(1..).unwrap_or_default();

        let mut ids = Vec::new();
        let mut rows = Vec::new();
        let column_names: Vec<String> = self
            .columns
            .iter()
            .filter(|c| !matches!(c.field, GraphField::Identifier))
            .map(|c| c.name.to_string())
            .collect();

        for (block_index, block) in body.chunks(self.stride).enumerate() {
            if block.len() < self.stride {
                return Err(IoError::TruncatedGraphBlock {
                    entry_index: 1 + block_index * self.stride,
                    got: block.len(),
                    stride: self.stride,
                });
            }

            let mut id = None;
            let mut row = Vec::with_capacity(column_names.len());
            for column in &self.columns {
                let entry = &block[column.offset];
                match &column.field {
                    GraphField::Identifier => {
                        id = entry.get("identifier").and_then(Value::as_i64);
                    }
                    GraphField::Timestamp => {
                        let raw = entry
                            .get("resultTime")
                            .and_then(Value::as_str)
                            .unwrap_or_default();
                        row.push(Cell::Text(raw.to_string()));
                    }
                    GraphField::Measurement => {
                        row.push(measurement_cell(entry, block_index, column.name)?);
                    }
                    GraphField::Quantity(key) => {
                        let value = entry.get(*key).and_then(numeric_value).ok_or_else(|| {
                            IoError::BadFieldValue {
                                row_index: block_index,
                                field: column.name.to_string(),
                                value: entry.get(*key).cloned().unwrap_or(Value::Null).to_string(),
                            }
                        })?;
                        row.push(Cell::Number(value));
                    }
                    GraphField::Status(alphabet) => {
                        row.push(Cell::Text(status_label(entry, alphabet)));
                    }
                }
            }

            let id = id.ok_or_else(|| IoError::BadIdentity {
                row_index: block_index,
                field: "identifier".to_string(),
            })?;
            ids.push(RecordId::new(id));
            rows.push(row);
        }

        let table = SampleTable::new(ids, column_names, rows)?;
        info!(
            n_rows = table.n_rows(),
            n_columns = table.columns().len(),
            "graph document loaded"
        );
        Ok(table)
    }
}

/// Accept numbers directly or as numeric strings.
fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Extract `hasResult[0].numericValue` from an observation entry.
fn measurement_cell(entry: &Value, row_index: usize, column: &str) -> Result<Cell, IoError> {
    entry
        .get("hasResult")
        .and_then(|r| r.get(0))
        .and_then(|r| r.get("numericValue"))
        .and_then(numeric_value)
        .map(Cell::Number)
        .ok_or_else(|| IoError::BadFieldValue {
            row_index,
            field: column.to_string(),
            value: entry
                .get("hasResult")
                .cloned()
                .unwrap_or(Value::Null)
                .to_string(),
        })
}

/// Resolve a status marker (`#...-<Label>`) against an alphabet.
///
/// `hasResult` may be a marker string or an array containing one; anything
/// that does not end in a known label yields empty text.
fn status_label(entry: &Value, alphabet: &LabelAlphabet) -> String {
    let markers: Vec<&str> = match entry.get("hasResult") {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    for marker in markers {
        if let Some(label) = marker.rsplit('-').next() {
            if alphabet.position(label).is_some() {
                return label.to_string();
            }
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Two-row layout with a 4-entry stride exercising every field kind.
    fn tiny_reader() -> GraphReader {
        GraphReader::new(
            4,
            vec![
                GraphColumn {
                    name: "Index",
                    offset: 0,
                    field: GraphField::Identifier,
                },
                GraphColumn {
                    name: "Date",
                    offset: 1,
                    field: GraphField::Timestamp,
                },
                GraphColumn {
                    name: "Fat",
                    offset: 2,
                    field: GraphField::Measurement,
                },
                GraphColumn {
                    name: "ActualLameness",
                    offset: 3,
                    field: GraphField::Status(LabelAlphabet::healthy_sick()),
                },
            ],
        )
    }

    fn tiny_document() -> String {
        json!({
            "@graph": [
                {"metricsStorage": true},
                {"identifier": 7},
                {"resultTime": "2020-12-17"},
                {"hasResult": [{"numericValue": 3.25}]},
                {"hasResult": ["#healthStatus-Sick"]},
                {"identifier": 3},
                {"resultTime": "2020-12-18"},
                {"hasResult": [{"numericValue": "2.5"}]},
                {"hasResult": ["#healthStatus-Unknown"]}
            ]
        })
        .to_string()
    }

    #[test]
    fn positional_extraction() {
        let table = tiny_reader().read_str(&tiny_document()).unwrap();
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.ids()[0].value(), 7);
        assert_eq!(table.ids()[1].value(), 3);
        assert_eq!(table.cell(0, "Fat"), Some(&Cell::Number(3.25)));
        assert_eq!(table.cell(1, "Fat"), Some(&Cell::Number(2.5)));
        assert_eq!(table.cell(0, "Date"), Some(&Cell::Text("2020-12-17".into())));
        assert_eq!(
            table.cell(0, "ActualLameness"),
            Some(&Cell::Text("Sick".into()))
        );
        // Unknown marker resolves to empty text, not a new category.
        assert_eq!(
            table.cell(1, "ActualLameness"),
            Some(&Cell::Text(String::new()))
        );
    }

    #[test]
    fn missing_graph_root_rejected() {
        let err = tiny_reader().read_str(r#"{"rows": []}"#).unwrap_err();
        assert!(matches!(err, IoError::DocumentShape { .. }));
    }

    #[test]
    fn truncated_block_rejected() {
        let doc = json!({
            "@graph": [
                {"metricsStorage": true},
                {"identifier": 7},
                {"resultTime": "2020-12-17"}
            ]
        })
        .to_string();
        let err = tiny_reader().read_str(&doc).unwrap_err();
        assert!(matches!(
            err,
            IoError::TruncatedGraphBlock { got: 2, stride: 4, .. }
        ));
    }

    #[test]
    fn missing_identifier_rejected() {
        let doc = json!({
            "@graph": [
                {"metricsStorage": true},
                {"noid": true},
                {"resultTime": "2020-12-17"},
                {"hasResult": [{"numericValue": 1.0}]},
                {"hasResult": ["#healthStatus-Sick"]}
            ]
        })
        .to_string();
        let err = tiny_reader().read_str(&doc).unwrap_err();
        assert!(matches!(err, IoError::BadIdentity { row_index: 0, .. }));
    }

    #[test]
    fn herd_health_layout_has_expected_columns() {
        let reader = GraphReader::herd_health();
        assert_eq!(reader.stride, 36);
        let status_count = reader
            .columns
            .iter()
            .filter(|c| matches!(c.field, GraphField::Status(_)))
            .count();
        assert_eq!(status_count, 8);
    }
}
