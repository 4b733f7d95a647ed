//! Model-lifecycle core for liver-disease risk screening on the ILPD table.
//!
//! The [`pipeline::ModelLifecycleManager`] loads the dataset, then for each
//! configured train/test split either restores persisted SVM, MLP and scaler
//! artifacts or retrains and saves them. The resulting
//! [`pipeline::ModelRegistry`] is immutable and serves predictions and
//! evaluation from any thread.

pub mod artifacts;
pub mod config;
pub mod data_loading;
pub mod error;
pub mod evaluation;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod processing;
pub mod screening;

pub use artifacts::{ArtifactIds, ArtifactStore, FsArtifactStore};
pub use config::AppConfig;
pub use data_loading::{
    DataLoader, Dataset, DatasetSource, DatasetSummary, IlpdCsvLoader, FEATURE_COUNT,
};
pub use error::{HepatoError, Result};
pub use evaluation::{EvaluationReport, EvaluationScope, ModelEvaluator};
pub use models::{ClassifierKind, IModel};
pub use pipeline::{
    predict, ArtifactBundle, ModelLifecycleManager, ModelRegistry, Prediction, Resolution,
    Trainer, TrainerConfig,
};
pub use processing::{SplitConfig, StandardScaler};
pub use screening::{PatientRecord, RiskLevel};
