//! Persistence of one classifier artifact per target.

use std::path::{Path, PathBuf};

use marguerite_rf::Forest;
use tracing::{debug, info, instrument, warn};

use crate::target::TargetSpec;
use crate::CoreError;

/// Filename suffix of every model artifact.
const ARTIFACT_SUFFIX: &str = "Model.bin";

/// Stores and loads classifier artifacts under a configured directory.
///
/// Each target persists to `<prefix><TargetName>Model.bin`. The directory
/// is created lazily on first save. A single writer per model directory is
/// assumed; concurrent training runs against the same directory are not
/// coordinated.
#[derive(Debug, Clone)]
pub struct ModelStore {
    directory: PathBuf,
    prefix: String,
}

/// Result of checking the store against the expected target manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreState {
    /// Every expected artifact is present.
    Ready,
    /// The model directory itself does not exist.
    DirectoryMissing,
    /// The directory exists but holds no artifacts at all.
    Empty,
    /// Some expected artifacts are absent.
    ModelsMissing {
        /// Target names whose artifacts are missing.
        missing: Vec<String>,
        /// Artifact name stems discovered in the directory.
        present: Vec<String>,
    },
}

/// Kind of a structured store failure, reported as a value, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFailureKind {
    /// The model directory is missing.
    DirectoryMissing,
    /// The directory holds no artifacts.
    NoModelsSaved,
    /// One or more named artifacts are missing.
    ModelsMissing,
}

impl StoreFailureKind {
    /// Short display label used as the `Type` field of error documents.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::DirectoryMissing => "Models directory not found",
            Self::NoModelsSaved => "No models saved",
            Self::ModelsMissing => "Models not found",
        }
    }
}

/// A structured store failure with a human-readable description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreFailure {
    /// The failure kind.
    pub kind: StoreFailureKind,
    /// Description aimed at the caller, naming discovered artifacts where
    /// that helps diagnose partial state.
    pub description: String,
}

impl StoreState {
    /// Convert a non-ready state into its structured failure, if any.
    #[must_use]
    pub fn failure(&self, prefix: &str) -> Option<StoreFailure> {
        match self {
            Self::Ready => None,
            Self::DirectoryMissing => Some(StoreFailure {
                kind: StoreFailureKind::DirectoryMissing,
                description: "The models directory is missing. Please execute the training first."
                    .to_string(),
            }),
            Self::Empty => Some(StoreFailure {
                kind: StoreFailureKind::NoModelsSaved,
                description: "There are no models saved. Please execute the training first."
                    .to_string(),
            }),
            Self::ModelsMissing { missing, present } => Some(StoreFailure {
                kind: StoreFailureKind::ModelsMissing,
                description: format!(
                    "Models not found for prefix {prefix}: missing [{}], found [{}]",
                    missing.join(", "),
                    present.join(", ")
                ),
            }),
        }
    }
}

impl ModelStore {
    /// Create a store over the given directory and artifact prefix.
    #[must_use]
    pub fn new(directory: &Path, prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.to_path_buf(),
            prefix: prefix.into(),
        }
    }

    /// Return the configured artifact prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Return the artifact path for a target.
    #[must_use]
    pub fn artifact_path(&self, target_name: &str) -> PathBuf {
        self.directory
            .join(format!("{}{}{}", self.prefix, target_name, ARTIFACT_SUFFIX))
    }

    /// Whether the model directory exists.
    #[must_use]
    pub fn directory_exists(&self) -> bool {
        self.directory.is_dir()
    }

    /// Whether the artifact for a target exists.
    #[must_use]
    pub fn target_exists(&self, target_name: &str) -> bool {
        self.artifact_path(target_name).is_file()
    }

    /// Check the store exhaustively against the expected target manifest.
    ///
    /// Distinguishes "never trained" (missing directory, empty directory)
    /// from "partially trained" (some artifacts missing), enumerating the
    /// artifact stems that are present.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ModelDirList`] if the directory cannot be read.
    #[instrument(skip_all, fields(dir = %self.directory.display()))]
    pub fn check(&self, specs: &[TargetSpec]) -> Result<StoreState, CoreError> {
        if !self.directory_exists() {
            warn!("model directory missing");
            return Ok(StoreState::DirectoryMissing);
        }

        let missing: Vec<String> = specs
            .iter()
            .filter(|spec| !self.target_exists(spec.name()))
            .map(|spec| spec.name().to_string())
            .collect();
        if missing.is_empty() {
            debug!(n_models = specs.len(), "all model artifacts present");
            return Ok(StoreState::Ready);
        }

        let present = self.discovered_stems()?;
        if present.is_empty() {
            warn!("model directory is empty");
            return Ok(StoreState::Empty);
        }
        warn!(?missing, ?present, "model artifacts missing");
        Ok(StoreState::ModelsMissing { missing, present })
    }

    /// List artifact name stems present in the directory, sorted.
    fn discovered_stems(&self) -> Result<Vec<String>, CoreError> {
        let entries = std::fs::read_dir(&self.directory).map_err(|e| CoreError::ModelDirList {
            path: self.directory.clone(),
            source: e,
        })?;
        let mut stems: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(|name| name.strip_suffix(ARTIFACT_SUFFIX))
                    .map(String::from)
            })
            .collect();
        stems.sort();
        stems.dedup();
        Ok(stems)
    }

    /// Persist a fitted classifier for a target.
    ///
    /// Creates the model directory on first save; an existing directory is
    /// not an error.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CoreError::ModelDirCreate`] | Directory creation failed |
    /// | [`CoreError::Classifier`] | Serialization or write failed |
    #[instrument(skip(self, forest), fields(target = target_name))]
    pub fn save(&self, forest: &Forest, target_name: &str) -> Result<(), CoreError> {
        std::fs::create_dir_all(&self.directory).map_err(|e| CoreError::ModelDirCreate {
            path: self.directory.clone(),
            source: e,
        })?;
        let path = self.artifact_path(target_name);
        forest.save(&path)?;
        info!(path = %path.display(), "model artifact saved");
        Ok(())
    }

    /// Load the fitted classifier for a target.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Classifier`] if the artifact cannot be read or
    /// decoded.
    #[instrument(skip(self), fields(target = target_name))]
    pub fn load(&self, target_name: &str) -> Result<Forest, CoreError> {
        let forest = Forest::load(self.artifact_path(target_name))?;
        Ok(forest)
    }
}
