//! Identity-keyed result assembly into nested exchange documents.

use std::collections::HashMap;

use marguerite_core::{
    Cell, CoreError, PredictionRun, RecordId, SampleTable, StoreFailure, TrainingRun,
};
use serde_json::{Map, Value};
use time::format_description::FormatItem;
use time::macros::format_description;
use tracing::{info, instrument, warn};

use crate::IoError;

const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const DISPLAY_DATE: &[FormatItem<'static>] = format_description!("[day]/[month]/[year]");

/// Routes rows whose discriminator equals `value` into section `section`.
#[derive(Debug, Clone)]
pub struct SectionRule {
    /// Discriminator cell value to match.
    pub value: String,
    /// Output section name.
    pub section: String,
}

/// How assembled rows are grouped into top-level document sections.
#[derive(Debug, Clone)]
pub enum SectionLayout {
    /// All rows under one named section.
    Single(String),
    /// Rows split by a categorical discriminator column. Rows matching no
    /// rule are dropped.
    ByColumn {
        /// The discriminator column name.
        column: String,
        /// Section rules, in output order.
        rules: Vec<SectionRule>,
    },
}

impl SectionLayout {
    /// All rows under one section.
    #[must_use]
    pub fn single(name: impl Into<String>) -> Self {
        Self::Single(name.into())
    }

    /// Split rows by a discriminator column.
    #[must_use]
    pub fn by_column(column: impl Into<String>, rules: Vec<(String, String)>) -> Self {
        Self::ByColumn {
            column: column.into(),
            rules: rules
                .into_iter()
                .map(|(value, section)| SectionRule { value, section })
                .collect(),
        }
    }
}

/// Display-formatting rules applied while rendering cells.
#[derive(Debug, Clone, Default)]
pub struct DisplayOptions {
    /// Numeric columns rounded to three decimals (e.g. a density reading).
    pub fixed3_columns: Vec<String>,
    /// Text columns reformatted from `YYYY-MM-DD` to `DD/MM/YYYY`.
    pub date_columns: Vec<String>,
}

/// Rejoins per-row actual/predicted labels onto original row attributes and
/// serializes the result as a nested document.
///
/// Rows are keyed by identity and emitted in ascending identity order. In
/// training mode the exported subset is the reference target's test
/// partition; a non-reference target whose test set lacks a row contributes
/// empty label cells for it.
pub struct ResultAssembler {
    columns: Vec<String>,
    layout: SectionLayout,
    display: DisplayOptions,
}

impl ResultAssembler {
    /// Create an assembler carrying the named attribute columns, in order.
    #[must_use]
    pub fn new(columns: Vec<String>, layout: SectionLayout, display: DisplayOptions) -> Self {
        Self {
            columns,
            layout,
            display,
        }
    }

    /// Assemble flat training rows: attributes plus per-target
    /// actual/predicted labels for the reference test partition.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::RowNotFound`] | A test identity is absent from the table |
    /// | [`IoError::Core`] | A configured column is absent |
    /// | [`IoError::DateFormat`] | A date cell is not ISO-formatted |
    pub fn training_rows(
        &self,
        table: &SampleTable,
        run: &TrainingRun,
    ) -> Result<Vec<Map<String, Value>>, IoError> {
        let reference = run.reference();
        let mut ids = reference.test_ids.clone();
        ids.sort();

        // Per-target position of each identity within its own test set.
        let lookups: Vec<HashMap<RecordId, usize>> = run
            .targets
            .iter()
            .map(|t| {
                t.test_ids
                    .iter()
                    .enumerate()
                    .map(|(i, &id)| (id, i))
                    .collect()
            })
            .collect();

        let mut rows = Vec::with_capacity(ids.len());
        for id in ids {
            let mut row = self.attribute_row(table, id)?;
            for (target, lookup) in run.targets.iter().zip(&lookups) {
                let (actual, predicted) = match lookup.get(&id) {
                    Some(&i) => (target.actual[i].clone(), target.predicted[i].clone()),
                    None => (String::new(), String::new()),
                };
                row.insert(target.spec.label_column().to_string(), Value::String(actual));
                row.insert(
                    target.spec.predicted_column().to_string(),
                    Value::String(predicted),
                );
            }
            rows.push(row);
        }
        Ok(rows)
    }

    /// Assemble flat prediction rows: attributes plus per-target predicted
    /// labels for every input row.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ResultAssembler::training_rows`].
    pub fn prediction_rows(
        &self,
        table: &SampleTable,
        run: &PredictionRun,
    ) -> Result<Vec<Map<String, Value>>, IoError> {
        let positions: HashMap<RecordId, usize> = run
            .ids
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i))
            .collect();
        let mut ids = run.ids.clone();
        ids.sort();

        let mut rows = Vec::with_capacity(ids.len());
        for id in ids {
            let mut row = self.attribute_row(table, id)?;
            for target in &run.targets {
                let predicted = positions
                    .get(&id)
                    .map(|&i| target.predicted[i].clone())
                    .unwrap_or_default();
                row.insert(
                    target.spec.predicted_column().to_string(),
                    Value::String(predicted),
                );
            }
            rows.push(row);
        }
        Ok(rows)
    }

    /// Build the nested training document: sectioned rows plus a
    /// `metricsData` section with per-target rate fields.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ResultAssembler::training_rows`].
    #[instrument(skip_all, fields(n_targets = run.targets.len()))]
    pub fn training_document(
        &self,
        table: &SampleTable,
        run: &TrainingRun,
    ) -> Result<Value, IoError> {
        let rows = self.training_rows(table, run)?;
        let mut document = self.sectioned(rows);

        let mut metrics = Map::new();
        for target in &run.targets {
            let prefix = field_prefix(target.spec.name());
            let m = &target.metrics;
            metrics.insert(
                format!("{prefix}TruePositiveRate"),
                number(m.true_positive_rate),
            );
            metrics.insert(
                format!("{prefix}FalsePositiveRate"),
                number(m.false_positive_rate),
            );
            metrics.insert(format!("{prefix}Precision"), number(m.precision));
            metrics.insert(format!("{prefix}Accuracy"), number(m.accuracy));
        }
        document.insert("metricsData".to_string(), Value::Array(vec![Value::Object(metrics)]));

        info!("training document assembled");
        Ok(Value::Object(document))
    }

    /// Build the nested prediction document: sectioned rows, no metrics.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ResultAssembler::prediction_rows`].
    #[instrument(skip_all, fields(n_targets = run.targets.len()))]
    pub fn prediction_document(
        &self,
        table: &SampleTable,
        run: &PredictionRun,
    ) -> Result<Value, IoError> {
        let rows = self.prediction_rows(table, run)?;
        let document = self.sectioned(rows);
        info!("prediction document assembled");
        Ok(Value::Object(document))
    }

    /// Render a structured store failure as the error exchange document.
    #[must_use]
    pub fn failure_document(failure: &StoreFailure) -> Value {
        let mut map = Map::new();
        map.insert("Status".to_string(), Value::String("Error".to_string()));
        map.insert(
            "Type".to_string(),
            Value::String(failure.kind.label().to_string()),
        );
        map.insert(
            "Description".to_string(),
            Value::String(failure.description.clone()),
        );
        Value::Object(map)
    }

    /// Render one row's identity and attribute columns.
    fn attribute_row(
        &self,
        table: &SampleTable,
        id: RecordId,
    ) -> Result<Map<String, Value>, IoError> {
        let position = table
            .position(id)
            .ok_or(IoError::RowNotFound { id: id.value() })?;

        let mut row = Map::new();
        row.insert("Index".to_string(), Value::from(id.value()));
        for column in &self.columns {
            let cell = table
                .cell(position, column)
                .ok_or_else(|| CoreError::MissingColumn {
                    column: column.clone(),
                })?;
            row.insert(column.clone(), self.render_cell(column, cell)?);
        }
        Ok(row)
    }

    /// Apply display rules to one cell.
    fn render_cell(&self, column: &str, cell: &Cell) -> Result<Value, IoError> {
        match cell {
            Cell::Number(v) => {
                let v = if self.display.fixed3_columns.iter().any(|c| c == column) {
                    (v * 1000.0).round() / 1000.0
                } else {
                    *v
                };
                Ok(number(v))
            }
            Cell::Text(raw) => {
                if self.display.date_columns.iter().any(|c| c == column) && !raw.is_empty() {
                    Ok(Value::String(reformat_date(column, raw)?))
                } else {
                    Ok(Value::String(raw.clone()))
                }
            }
        }
    }

    /// Group flat rows into the configured top-level sections.
    fn sectioned(&self, rows: Vec<Map<String, Value>>) -> Map<String, Value> {
        let mut document = Map::new();
        match &self.layout {
            SectionLayout::Single(name) => {
                let rows: Vec<Value> = rows.into_iter().map(Value::Object).collect();
                document.insert(name.clone(), Value::Array(rows));
            }
            SectionLayout::ByColumn { column, rules } => {
                for rule in rules {
                    document.insert(rule.section.clone(), Value::Array(Vec::new()));
                }
                let mut dropped = 0usize;
                for row in rows {
                    let discriminator = row.get(column.as_str()).and_then(Value::as_str);
                    let section = discriminator
                        .and_then(|value| rules.iter().find(|r| r.value == value))
                        .map(|r| r.section.clone());
                    match section {
                        Some(section) => {
                            if let Some(Value::Array(items)) = document.get_mut(&section) {
                                items.push(Value::Object(row));
                            }
                        }
                        None => dropped += 1,
                    }
                }
                if dropped > 0 {
                    warn!(dropped, column = column.as_str(), "rows matched no section rule");
                }
            }
        }
        document
    }
}

/// Camel-case field prefix for a target name (`HeatStress` → `heatStress`).
fn field_prefix(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn number(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

/// Reformat an ISO date for display.
fn reformat_date(column: &str, raw: &str) -> Result<String, IoError> {
    let parsed = time::Date::parse(raw, ISO_DATE).map_err(|_| IoError::DateFormat {
        column: column.to_string(),
        raw: raw.to_string(),
    })?;
    parsed.format(DISPLAY_DATE).map_err(|_| IoError::DateFormat {
        column: column.to_string(),
        raw: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use marguerite_core::{
        LabelAlphabet, PredictedTarget, TargetMetrics, TargetSpec, TrainedTarget,
    };

    fn quality_spec() -> TargetSpec {
        TargetSpec::new(
            "Quality",
            vec!["Density".into()],
            "Actual Quality",
            "Predicted Quality",
            LabelAlphabet::quality_grades(),
        )
    }

    fn toy_metrics() -> TargetMetrics {
        TargetMetrics {
            true_positives: 1,
            false_positives: 1,
            true_negatives: 1,
            false_negatives: 0,
            true_positive_rate: 100.0,
            false_positive_rate: 50.0,
            precision: 75.0,
            accuracy: 66.67,
            overall_accuracy: 66.67,
            macro_precision: 75.0,
            micro_precision: 66.67,
        }
    }

    fn make_table() -> SampleTable {
        SampleTable::new(
            vec![RecordId::new(4), RecordId::new(2), RecordId::new(9)],
            vec!["Date".into(), "Density".into(), "Remark".into()],
            vec![
                vec![
                    Cell::Text("2020-10-01".into()),
                    Cell::Number(1.031_72),
                    Cell::Text("Raw".into()),
                ],
                vec![
                    Cell::Text("2020-10-02".into()),
                    Cell::Number(1.028_4),
                    Cell::Text("Processed".into()),
                ],
                vec![
                    Cell::Text("2020-10-03".into()),
                    Cell::Number(1.030_01),
                    Cell::Text("Raw".into()),
                ],
            ],
        )
        .unwrap()
    }

    fn make_run() -> TrainingRun {
        TrainingRun {
            targets: vec![TrainedTarget {
                spec: quality_spec(),
                test_ids: vec![RecordId::new(9), RecordId::new(2)],
                actual: vec!["High".into(), "Low".into()],
                predicted: vec!["Medium".into(), "Low".into()],
                metrics: toy_metrics(),
            }],
        }
    }

    fn assembler(layout: SectionLayout) -> ResultAssembler {
        ResultAssembler::new(
            vec!["Date".into(), "Density".into(), "Remark".into()],
            layout,
            DisplayOptions {
                fixed3_columns: vec!["Density".into()],
                date_columns: vec!["Date".into()],
            },
        )
    }

    #[test]
    fn rows_sorted_ascending_and_match_reference() {
        let rows = assembler(SectionLayout::single("milkData"))
            .training_rows(&make_table(), &make_run())
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Index"], Value::from(2));
        assert_eq!(rows[1]["Index"], Value::from(9));
        assert_eq!(rows[0]["Actual Quality"], Value::from("Low"));
        assert_eq!(rows[1]["Predicted Quality"], Value::from("Medium"));
    }

    #[test]
    fn display_rules_applied() {
        let rows = assembler(SectionLayout::single("milkData"))
            .training_rows(&make_table(), &make_run())
            .unwrap();
        assert_eq!(rows[0]["Date"], Value::from("02/10/2020"));
        assert_eq!(rows[0]["Density"], Value::from(1.028));
        assert_eq!(rows[1]["Density"], Value::from(1.03));
    }

    #[test]
    fn sections_split_by_remark() {
        let layout = SectionLayout::by_column(
            "Remark",
            vec![
                ("Raw".to_string(), "rawData".to_string()),
                ("Processed".to_string(), "processedData".to_string()),
            ],
        );
        let document = assembler(layout)
            .training_document(&make_table(), &make_run())
            .unwrap();
        assert_eq!(document["rawData"].as_array().unwrap().len(), 1);
        assert_eq!(document["processedData"].as_array().unwrap().len(), 1);
        assert_eq!(document["rawData"][0]["Index"], Value::from(9));
    }

    #[test]
    fn metrics_section_fields() {
        let document = assembler(SectionLayout::single("milkData"))
            .training_document(&make_table(), &make_run())
            .unwrap();
        let metrics = &document["metricsData"][0];
        assert_eq!(metrics["qualityTruePositiveRate"], Value::from(100.0));
        assert_eq!(metrics["qualityFalsePositiveRate"], Value::from(50.0));
        assert_eq!(metrics["qualityPrecision"], Value::from(75.0));
        assert_eq!(metrics["qualityAccuracy"], Value::from(66.67));
    }

    #[test]
    fn prediction_document_has_no_metrics() {
        let run = PredictionRun {
            ids: vec![RecordId::new(4), RecordId::new(2), RecordId::new(9)],
            targets: vec![PredictedTarget {
                spec: quality_spec(),
                predicted: vec!["Low".into(), "High".into(), "Medium".into()],
            }],
        };
        let document = assembler(SectionLayout::single("milkData"))
            .prediction_document(&make_table(), &run)
            .unwrap();
        assert!(document.get("metricsData").is_none());
        let rows = document["milkData"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        // Sorted by identity: 2, 4, 9.
        assert_eq!(rows[0]["Index"], Value::from(2));
        assert_eq!(rows[0]["Predicted Quality"], Value::from("High"));
        assert!(rows[0].get("Actual Quality").is_none());
    }

    #[test]
    fn non_reference_target_tolerates_divergent_membership() {
        let mut run = make_run();
        run.targets.push(TrainedTarget {
            spec: TargetSpec::new(
                "Grade",
                vec!["Density".into()],
                "ActualGrade",
                "PredictedGrade",
                LabelAlphabet::quality_grades(),
            ),
            // Diverges from the reference test set: holds 4, not 2.
            test_ids: vec![RecordId::new(9), RecordId::new(4)],
            actual: vec!["High".into(), "Low".into()],
            predicted: vec!["High".into(), "Low".into()],
            metrics: toy_metrics(),
        });

        let rows = assembler(SectionLayout::single("milkData"))
            .training_rows(&make_table(), &run)
            .unwrap();
        // Row subset still follows the reference target.
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Index"], Value::from(2));
        assert_eq!(rows[0]["ActualGrade"], Value::from(""));
        assert_eq!(rows[1]["ActualGrade"], Value::from("High"));
    }

    #[test]
    fn failure_document_shape() {
        use marguerite_core::{StoreFailure, StoreFailureKind};
        let document = ResultAssembler::failure_document(&StoreFailure {
            kind: StoreFailureKind::DirectoryMissing,
            description: "The models directory is missing.".into(),
        });
        assert_eq!(document["Status"], Value::from("Error"));
        assert_eq!(document["Type"], Value::from("Models directory not found"));
        assert!(document["Description"].as_str().unwrap().contains("missing"));
    }

    #[test]
    fn bad_date_is_an_error() {
        let table = SampleTable::new(
            vec![RecordId::new(2), RecordId::new(9)],
            vec!["Date".into(), "Density".into(), "Remark".into()],
            vec![
                vec![
                    Cell::Text("01-10-2020".into()),
                    Cell::Number(1.0),
                    Cell::Text("Raw".into()),
                ],
                vec![
                    Cell::Text("2020-10-02".into()),
                    Cell::Number(1.0),
                    Cell::Text("Raw".into()),
                ],
            ],
        )
        .unwrap();
        let err = assembler(SectionLayout::single("milkData"))
            .training_rows(&table, &make_run())
            .unwrap_err();
        assert!(matches!(err, IoError::DateFormat { .. }));
    }
}
