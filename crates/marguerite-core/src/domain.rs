//! Domain types for the classification pipeline.

use std::collections::HashMap;

use crate::CoreError;

/// A stable row identity, unique within a table and preserved end-to-end.
///
/// Splits, predictions, and joins all key off this value; assembled output
/// is sorted by it ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(i64);

impl RecordId {
    /// Create a new record identity.
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Return the raw identity value.
    #[must_use]
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single table cell: a measurement or a categorical/textual attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// A numeric measurement.
    Number(f64),
    /// A textual attribute (labels, dates, remarks). Empty means absent.
    Text(String),
}

impl Cell {
    /// Return the numeric value, if this cell is numeric.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Text(_) => None,
        }
    }

    /// Return the textual value, if this cell is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Number(_) => None,
            Cell::Text(s) => Some(s),
        }
    }
}

/// A row-indexed table of samples with named columns.
///
/// Row identities, column names, and cell rows are stored in parallel —
/// `ids[i]` identifies `rows[i]`. Produced by the dataset adapters and
/// read-only thereafter.
#[derive(Debug)]
pub struct SampleTable {
    ids: Vec<RecordId>,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
    column_lookup: HashMap<String, usize>,
}

impl SampleTable {
    /// Build a table from parallel ids, column names, and cell rows.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CoreError::DuplicateRecordId`] | The same id appears twice |
    /// | [`CoreError::InconsistentRowWidth`] | A row's cell count differs from the column count |
    pub fn new(
        ids: Vec<RecordId>,
        columns: Vec<String>,
        rows: Vec<Vec<Cell>>,
    ) -> Result<Self, CoreError> {
        let mut seen = HashMap::with_capacity(ids.len());
        for (id, row) in ids.iter().zip(&rows) {
            if seen.insert(*id, ()).is_some() {
                return Err(CoreError::DuplicateRecordId { id: id.value() });
            }
            if row.len() != columns.len() {
                return Err(CoreError::InconsistentRowWidth {
                    id: id.value(),
                    expected: columns.len(),
                    got: row.len(),
                });
            }
        }
        let column_lookup = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Ok(Self {
            ids,
            columns,
            rows,
            column_lookup,
        })
    }

    /// Return the row identities in insertion order.
    #[must_use]
    pub fn ids(&self) -> &[RecordId] {
        &self.ids
    }

    /// Return the column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.ids.len()
    }

    /// Return the position of a column by name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_lookup.get(name).copied()
    }

    /// Return the cell at `(row, column name)`, if both exist.
    #[must_use]
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[col])
    }

    /// Return the row position of an identity, if present.
    #[must_use]
    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.ids.iter().position(|&x| x == id)
    }

    /// Extract a row-major numeric matrix for the named feature columns.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CoreError::MissingColumn`] | A named column is absent |
    /// | [`CoreError::NonNumericCell`] | A cell in a named column is text |
    pub fn numeric_matrix(&self, columns: &[String]) -> Result<Vec<Vec<f64>>, CoreError> {
        let positions = columns
            .iter()
            .map(|name| {
                self.column_index(name).ok_or_else(|| CoreError::MissingColumn {
                    column: name.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.rows
            .iter()
            .zip(&self.ids)
            .map(|(row, id)| {
                positions
                    .iter()
                    .zip(columns)
                    .map(|(&col, name)| {
                        row[col].as_number().ok_or_else(|| CoreError::NonNumericCell {
                            column: name.clone(),
                            id: id.value(),
                            raw: row[col].as_text().unwrap_or_default().to_string(),
                        })
                    })
                    .collect()
            })
            .collect()
    }

    /// Extract a textual column (labels, remarks) by name.
    ///
    /// Numeric cells are rendered through their display form so that
    /// numeric-coded categories survive round trips.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingColumn`] if the column is absent.
    pub fn text_column(&self, column: &str) -> Result<Vec<String>, CoreError> {
        let col = self
            .column_index(column)
            .ok_or_else(|| CoreError::MissingColumn {
                column: column.to_string(),
            })?;
        Ok(self
            .rows
            .iter()
            .map(|row| match &row[col] {
                Cell::Text(s) => s.clone(),
                Cell::Number(v) => v.to_string(),
            })
            .collect())
    }
}
