//! Built-in estimation domains: target sets, prefixes, output shape.

use anyhow::Result;
use marguerite_core::{herd_health_targets, milk_quality_targets, TargetSpec};
use marguerite_io::{DisplayOptions, ResultAssembler, SectionLayout};

/// One deployed estimation domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    /// Four binary herd-health conditions.
    HerdHealth,
    /// One three-class milk-quality grade.
    MilkQuality,
}

/// Parse a `--domain` argument.
pub fn parse_domain(s: &str) -> Result<Domain> {
    match s {
        "herd-health" => Ok(Domain::HerdHealth),
        "milk-quality" => Ok(Domain::MilkQuality),
        other => anyhow::bail!("unknown domain: {other} (expected herd-health or milk-quality)"),
    }
}

impl Domain {
    /// The target specs this domain estimates.
    pub fn targets(&self) -> Vec<TargetSpec> {
        match self {
            Self::HerdHealth => herd_health_targets(),
            Self::MilkQuality => milk_quality_targets(),
        }
    }

    /// The model artifact prefix.
    pub fn model_prefix(&self) -> &'static str {
        match self {
            Self::HerdHealth => "AnimalWelfare",
            Self::MilkQuality => "MilkQuality",
        }
    }

    /// The result assembler for this domain's exchange documents.
    pub fn assembler(&self) -> ResultAssembler {
        match self {
            Self::HerdHealth => ResultAssembler::new(
                columns(&[
                    "Date",
                    "Pedometer",
                    "Cow",
                    "MID",
                    "Lactations",
                    "Daily Production",
                    "Average Daily Production",
                    "Daily Fat",
                    "Daily Proteins",
                    "Daily Fat/Proteins",
                    "Conductivity 1",
                    "Conductivity 2",
                    "Conductivity 3",
                    "Activity 1",
                    "Activity 2",
                    "Activity 3",
                    "Total Daily Lying",
                    "Average Rumination Time 1",
                    "Average Rumination Time 2",
                    "Average Rumination Time 3",
                    "Average Ingestion Time 1",
                    "Average Ingestion Time 2",
                    "Average Ingestion Time 3",
                ]),
                SectionLayout::single("animalData"),
                DisplayOptions {
                    fixed3_columns: Vec::new(),
                    date_columns: vec!["Date".into()],
                },
            ),
            Self::MilkQuality => ResultAssembler::new(
                columns(&[
                    "Date",
                    "Time",
                    "Product Name",
                    "AciditySH",
                    "Casein",
                    "Density",
                    "Fat",
                    "Freezing Point mC",
                    "Lactose",
                    "Protein",
                    "SNF",
                    "Urea",
                    "Remark",
                ]),
                SectionLayout::by_column(
                    "Remark",
                    vec![
                        ("Raw".to_string(), "rawData".to_string()),
                        ("Processed".to_string(), "processedData".to_string()),
                    ],
                ),
                DisplayOptions {
                    fixed3_columns: vec!["Density".into()],
                    date_columns: vec!["Date".into()],
                },
            ),
        }
    }
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}
