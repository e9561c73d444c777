//! Multi-target orchestration: fit, predict, measure, persist.

use marguerite_rf::ForestConfig;
use tracing::{info, instrument};

use crate::codec::LabelCodec;
use crate::domain::{RecordId, SampleTable};
use crate::metrics::TargetMetrics;
use crate::split::SplitPlanner;
use crate::store::{ModelStore, StoreFailure};
use crate::target::TargetSpec;
use crate::CoreError;

/// Runs the classification pipeline over a list of target specs.
///
/// One generic loop covers every target; the bodies differ only in the
/// columns and alphabet each spec names. Each target's holdout split is an
/// independent planner invocation sharing the run seed, so all targets of
/// one run receive identical partitions; the first spec is the reference
/// target for assembly.
#[derive(Debug, Clone, Copy)]
pub struct Orchestrator {
    seed: u64,
    n_trees: usize,
}

/// Training outcome for one target.
#[derive(Debug)]
pub struct TrainedTarget {
    /// The spec this target was trained from.
    pub spec: TargetSpec,
    /// Test partition identities, in split order.
    pub test_ids: Vec<RecordId>,
    /// Ground-truth labels of the test partition, decoded.
    pub actual: Vec<String>,
    /// Predicted labels of the test partition, decoded.
    pub predicted: Vec<String>,
    /// Confusion-matrix metrics over the test partition.
    pub metrics: TargetMetrics,
}

/// Training outcome across all targets of a run.
#[derive(Debug)]
pub struct TrainingRun {
    /// Per-target outcomes, in spec order.
    pub targets: Vec<TrainedTarget>,
}

impl TrainingRun {
    /// The reference target whose test identities define the exported rows.
    #[must_use]
    pub fn reference(&self) -> &TrainedTarget {
        &self.targets[0]
    }
}

/// Prediction outcome for one target, parallel to the input table rows.
#[derive(Debug)]
pub struct PredictedTarget {
    /// The spec this target was predicted from.
    pub spec: TargetSpec,
    /// Predicted labels for every input row, decoded.
    pub predicted: Vec<String>,
}

/// Prediction outcome across all targets of a run.
#[derive(Debug)]
pub struct PredictionRun {
    /// Row identities, in table order.
    pub ids: Vec<RecordId>,
    /// Per-target predictions, in spec order.
    pub targets: Vec<PredictedTarget>,
}

/// Result of a prediction request.
///
/// Store problems surface as a structured value so callers branch on it
/// instead of catching a fault.
#[derive(Debug)]
pub enum PredictionOutcome {
    /// Predictions were produced for every target.
    Completed(PredictionRun),
    /// The model store cannot serve this run; nothing was predicted.
    Unavailable(StoreFailure),
}

impl Orchestrator {
    /// Create an orchestrator with the run seed and ensemble size.
    #[must_use]
    pub fn new(seed: u64, n_trees: usize) -> Self {
        Self { seed, n_trees }
    }

    /// Train, evaluate, and persist one classifier per target spec.
    ///
    /// For each target: encode labels, draw the holdout split, fit on the
    /// train partition, predict the test partition, compute metrics, and
    /// persist the fitted model. The model directory is created on first
    /// save.
    ///
    /// # Errors
    ///
    /// Propagates codec, split, classifier, metrics, and store errors
    /// unmodified.
    #[instrument(skip_all, fields(n_targets = specs.len(), n_rows = table.n_rows(), seed = self.seed))]
    pub fn train(
        &self,
        table: &SampleTable,
        specs: &[TargetSpec],
        store: &ModelStore,
    ) -> Result<TrainingRun, CoreError> {
        let planner = SplitPlanner::new(self.seed);
        let mut targets = Vec::with_capacity(specs.len());

        for spec in specs {
            let features = table.numeric_matrix(spec.feature_columns())?;
            let raw_labels = table.text_column(spec.label_column())?;
            let codec = LabelCodec::new(spec.alphabet().clone());
            let encoded = codec.encode(&raw_labels)?;

            let split = planner.split(table.ids(), &features, &encoded)?;

            let forest = ForestConfig::new(self.n_trees)?
                .with_seed(self.seed)
                .fit(&split.train_features, &split.train_labels)?;
            let predicted_codes = forest.predict_batch(&split.test_features)?;

            let metrics = TargetMetrics::from_labels(
                spec.alphabet().len(),
                &split.test_labels,
                &predicted_codes,
            )?;

            store.save(&forest, spec.name())?;

            info!(
                target = spec.name(),
                n_test = split.test_ids.len(),
                accuracy = metrics.accuracy,
                "target trained"
            );

            targets.push(TrainedTarget {
                spec: spec.clone(),
                test_ids: split.test_ids,
                actual: codec.decode(&split.test_labels)?,
                predicted: codec.decode(&predicted_codes)?,
                metrics,
            });
        }

        Ok(TrainingRun { targets })
    }

    /// Predict every target over all input rows using persisted models.
    ///
    /// The store is checked exhaustively against the spec manifest first;
    /// a missing directory or missing artifacts yield
    /// [`PredictionOutcome::Unavailable`] rather than an error.
    ///
    /// # Errors
    ///
    /// Propagates directory listing, model decoding, and prediction errors
    /// unmodified.
    #[instrument(skip_all, fields(n_targets = specs.len(), n_rows = table.n_rows()))]
    pub fn predict(
        &self,
        table: &SampleTable,
        specs: &[TargetSpec],
        store: &ModelStore,
    ) -> Result<PredictionOutcome, CoreError> {
        let state = store.check(specs)?;
        if let Some(failure) = state.failure(store.prefix()) {
            return Ok(PredictionOutcome::Unavailable(failure));
        }

        let mut targets = Vec::with_capacity(specs.len());
        for spec in specs {
            let forest = store.load(spec.name())?;
            let features = table.numeric_matrix(spec.feature_columns())?;
            let codes = forest.predict_batch(&features)?;
            let codec = LabelCodec::new(spec.alphabet().clone());
            targets.push(PredictedTarget {
                spec: spec.clone(),
                predicted: codec.decode(&codes)?,
            });
        }

        info!(n_targets = targets.len(), "prediction complete");

        Ok(PredictionOutcome::Completed(PredictionRun {
            ids: table.ids().to_vec(),
            targets,
        }))
    }
}
