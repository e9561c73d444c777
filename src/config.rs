//! Optional TOML run configuration supplying CLI flag defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

/// File-backed defaults for a pipeline run.
///
/// Every field is optional; explicit CLI flags win over the file, which
/// wins over built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Model store settings.
    #[serde(default)]
    pub models: ModelsSection,
    /// Training settings.
    #[serde(default)]
    pub training: TrainingSection,
    /// Exchange settings.
    #[serde(default)]
    pub exchange: ExchangeSection,
}

/// `[models]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelsSection {
    /// Model artifact directory.
    pub directory: Option<PathBuf>,
    /// Artifact name prefix, overriding the domain's default.
    pub prefix: Option<String>,
}

/// `[training]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainingSection {
    /// RNG seed for split and ensemble determinism.
    pub seed: Option<u64>,
    /// Number of trees per target ensemble.
    pub estimators: Option<usize>,
}

/// `[exchange]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExchangeSection {
    /// Translation service endpoint; when set, delimited payloads are
    /// exchanged for the service's JSON dialect.
    pub translator_url: Option<String>,
}

impl FileConfig {
    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}
