//! Runtime settings, read from an optional TOML file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::data_loading::DatasetSource;
use crate::error::{HepatoError, Result};
use crate::pipeline::TrainerConfig;
use crate::processing::SplitConfig;

pub const ILPD_URL: &str = "https://archive.ics.uci.edu/ml/machine-learning-databases/00225/Indian%20Liver%20Patient%20Dataset%20(ILPD).csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dataset_url: String,
    /// Local copy of the dataset; takes precedence over `dataset_url`.
    pub dataset_path: Option<PathBuf>,
    pub artifact_dir: PathBuf,
    pub test_fractions: Vec<f64>,
    pub fetch_timeout_secs: u64,
    pub trainer: TrainerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset_url: ILPD_URL.to_string(),
            dataset_path: None,
            artifact_dir: PathBuf::from("models"),
            test_fractions: SplitConfig::DEFAULT_FRACTIONS.to_vec(),
            fetch_timeout_secs: 30,
            trainer: TrainerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reads `path` when given. Without a path the defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            tracing::debug!("no config file given, using defaults");
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .map_err(|e| HepatoError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::from_toml(&content)
            .map_err(|e| HepatoError::Config(format!("{}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| HepatoError::Config(e.to_string()))?;
        config.split_configs()?;
        Ok(config)
    }

    /// Validated splits, in configured order.
    pub fn split_configs(&self) -> Result<Vec<SplitConfig>> {
        if self.test_fractions.is_empty() {
            return Err(HepatoError::Config("test_fractions is empty".to_string()));
        }
        self.test_fractions
            .iter()
            .map(|&f| SplitConfig::from_fraction(f))
            .collect()
    }

    pub fn dataset_source(&self) -> DatasetSource {
        match &self.dataset_path {
            Some(path) => DatasetSource::File(path.clone()),
            None => DatasetSource::Url(self.dataset_url.clone()),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
