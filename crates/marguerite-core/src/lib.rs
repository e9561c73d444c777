//! Multi-target classification pipeline: targets, splits, metrics, models.
//!
//! Orchestrates the training-and-evaluation pipeline over a row-indexed
//! sample table: per-target holdout splits, label encoding, classifier
//! fit/predict, confusion-matrix metrics, and model persistence.

mod codec;
mod domain;
mod error;
mod metrics;
mod pipeline;
mod split;
mod store;
mod target;

pub use codec::LabelCodec;
pub use domain::{Cell, RecordId, SampleTable};
pub use error::CoreError;
pub use metrics::TargetMetrics;
pub use pipeline::{
    Orchestrator, PredictedTarget, PredictionOutcome, PredictionRun, TrainedTarget, TrainingRun,
};
pub use split::{SplitPlanner, SplitResult, TEST_FRACTION};
pub use store::{ModelStore, StoreFailure, StoreFailureKind, StoreState};
pub use target::{herd_health_targets, milk_quality_targets, LabelAlphabet, TargetSpec};
