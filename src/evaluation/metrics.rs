use serde::{Deserialize, Serialize};

use crate::models::ClassifierKind;
use crate::processing::SplitConfig;

/// Binary confusion counts, laid out as `[[tn, fp], [fn, tp]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_positives: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(y_true: &[f64], y_pred: &[f64]) -> Self {
        let mut cm = Self::default();
        for (t, p) in y_true.iter().zip(y_pred) {
            match (t.round() == 1.0, p.round() == 1.0) {
                (true, true) => cm.true_positives += 1,
                (false, false) => cm.true_negatives += 1,
                (false, true) => cm.false_positives += 1,
                (true, false) => cm.false_negatives += 1,
            }
        }
        cm
    }

    /// Rows are actual classes (healthy, diseased), columns predicted.
    pub fn as_array(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negatives, self.false_positives],
            [self.false_negatives, self.true_positives],
        ]
    }

    pub fn total(&self) -> usize {
        self.true_negatives + self.false_positives + self.false_negatives + self.true_positives
    }

    pub fn off_diagonal(&self) -> usize {
        self.false_positives + self.false_negatives
    }

    /// Share of correct predictions; `0.0` for an empty matrix.
    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => (self.true_positives + self.true_negatives) as f64 / total as f64,
        }
    }
}

/// Which rows a report was computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EvaluationScope {
    /// Every row of the dataset, including rows the model trained on.
    #[default]
    FullDataset,
    /// Only the split's held-out test partition. `seed` must be the one the
    /// split was trained with so the same partition is recovered.
    HeldOut { seed: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub split: SplitConfig,
    pub model: ClassifierKind,
    pub scope: EvaluationScope,
    pub samples: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Area under the ROC curve of the diseased-class probabilities;
    /// `None` when only one class is present.
    pub roc_auc: Option<f64>,
    pub confusion: ConfusionMatrix,
}
