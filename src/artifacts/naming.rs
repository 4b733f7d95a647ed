//! Deterministic artifact identifiers per split.

use crate::models::ClassifierKind;
use crate::processing::SplitConfig;

/// The three identifiers persisted for one split, e.g. `svm_20`,
/// `mlp_20`, `scaler_20`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactIds {
    pub svm: String,
    pub mlp: String,
    pub scaler: String,
}

impl ArtifactIds {
    pub fn for_split(split: SplitConfig) -> Self {
        let pct = split.test_percent();
        Self {
            svm: format!("svm_{pct}"),
            mlp: format!("mlp_{pct}"),
            scaler: format!("scaler_{pct}"),
        }
    }

    pub fn for_kind(&self, kind: ClassifierKind) -> &str {
        match kind {
            ClassifierKind::Svm => &self.svm,
            ClassifierKind::Mlp => &self.mlp,
        }
    }

    pub fn all(&self) -> [&str; 3] {
        [&self.svm, &self.mlp, &self.scaler]
    }
}
