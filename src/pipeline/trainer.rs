use serde::{Deserialize, Serialize};

use super::bundle::ArtifactBundle;
use crate::data_loading::data_loader::Dataset;
use crate::error::{HepatoError, Result};
use crate::models::{IModel, MlpClassifier, MlpParams, SvmClassifier, SvmParams, TrainingOutcome};
use crate::processing::{stratified_split, DataProcessor, SplitConfig, StandardScaler};

pub const DEFAULT_SEED: u64 = 42;

/// Hyperparameters for one split's training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Seeds the stratified split and the perceptron.
    pub seed: u64,
    pub svm: SvmParams,
    pub mlp: MlpParams,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            svm: SvmParams::default(),
            mlp: MlpParams::default(),
        }
    }
}

/// Result of training one split, before persistence.
#[derive(Debug, Clone)]
pub struct TrainedBundle {
    pub bundle: ArtifactBundle,
    pub svm_outcome: TrainingOutcome,
    pub mlp_outcome: TrainingOutcome,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Fits the scaler and both classifiers on a split's training partition.
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn train(&self, dataset: &Dataset, split: SplitConfig) -> Result<TrainedBundle> {
        let indices = stratified_split(&dataset.y_data, split, self.config.seed);

        let positives = indices
            .train
            .iter()
            .filter(|&&i| dataset.y_data[i] == 1.0)
            .count();
        if positives == 0 || positives == indices.train.len() {
            return Err(HepatoError::DegenerateSplit { split });
        }
        let train = dataset.select(&indices.train)?;

        let mut scaler = StandardScaler::new();
        let x_scaled = scaler.fit_transform(&train.x_data);

        let mut svm = SvmClassifier::new(self.config.svm.clone());
        let svm_outcome = svm.train(&x_scaled, &train.y_data)?;
        if !svm_outcome.converged {
            tracing::warn!(
                split = %split,
                iterations = svm_outcome.iterations,
                "SVM solver stopped before convergence; model may be under-fit"
            );
        }

        let mut mlp = MlpClassifier::new(self.config.mlp.clone(), self.config.seed);
        let mlp_outcome = mlp.train(&x_scaled, &train.y_data)?;
        if !mlp_outcome.converged {
            tracing::warn!(
                split = %split,
                epochs = mlp_outcome.iterations,
                "MLP reached the iteration cap without converging; model may be under-fit"
            );
        }

        tracing::info!(
            split = %split,
            train_rows = indices.train.len(),
            test_rows = indices.test.len(),
            support_vectors = svm.n_support(),
            mlp_epochs = mlp_outcome.iterations,
            "split trained"
        );

        Ok(TrainedBundle {
            bundle: ArtifactBundle { svm, mlp, scaler },
            svm_outcome,
            mlp_outcome,
            train_rows: indices.train.len(),
            test_rows: indices.test.len(),
        })
    }
}
