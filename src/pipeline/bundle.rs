use serde::{Deserialize, Serialize};

use crate::models::{ClassifierKind, IModel, MlpClassifier, SvmClassifier};
use crate::processing::StandardScaler;

/// Scaler and both classifiers fitted on the same partition of one split.
///
/// Always built whole (by the trainer or from three persisted artifacts) and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactBundle {
    pub svm: SvmClassifier,
    pub mlp: MlpClassifier,
    pub scaler: StandardScaler,
}

impl ArtifactBundle {
    pub fn classifier(&self, kind: ClassifierKind) -> &dyn IModel {
        match kind {
            ClassifierKind::Svm => &self.svm,
            ClassifierKind::Mlp => &self.mlp,
        }
    }
}
