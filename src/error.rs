//! Error types for the screening core.
//!
//! Artifact-level failures are recoverable (the lifecycle manager retrains);
//! dataset-level failures abort initialization.

use std::path::PathBuf;
use thiserror::Error;

use crate::processing::SplitConfig;

#[derive(Debug, Error)]
pub enum HepatoError {
    /// The dataset could not be fetched or parsed.
    #[error("dataset unavailable ({source_desc}): {reason}")]
    DataUnavailable { source_desc: String, reason: String },

    /// A persisted artifact exists but cannot be deserialized.
    #[error("artifact '{id}' is corrupt: {reason}")]
    ArtifactCorrupt { id: String, reason: String },

    /// Filesystem failure while reading or writing an artifact.
    #[error("failed to {operation} artifact file {}", path.display())]
    ArtifactIo {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid feature vector: expected {expected} values, got {actual}")]
    InvalidFeatureVector { expected: usize, actual: usize },

    #[error("invalid test fraction {0}: must lie strictly between 0 and 1 with whole-percent precision")]
    InvalidSplit(f64),

    #[error("no models registered for split {0}")]
    UnknownSplit(SplitConfig),

    /// The training partition of a split holds a single class.
    #[error("training partition for split {split} contains a single class")]
    DegenerateSplit { split: SplitConfig },

    #[error("invalid patient data: {0}")]
    InvalidPatient(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// Failure inside the tensor backend while fitting or scoring the MLP.
    #[error("tensor computation failed: {0}")]
    Tensor(#[from] candle_core::Error),
}

impl HepatoError {
    pub(crate) fn data_unavailable(source_desc: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            source_desc: source_desc.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt(id: &str, reason: impl Into<String>) -> Self {
        Self::ArtifactCorrupt {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// True for failures the lifecycle manager resolves by retraining.
    pub fn is_recoverable_artifact_error(&self) -> bool {
        matches!(self, Self::ArtifactCorrupt { .. } | Self::ArtifactIo { .. })
    }
}

pub type Result<T> = std::result::Result<T, HepatoError>;
