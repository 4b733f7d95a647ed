use serde::{Deserialize, Serialize};

use super::bundle::ArtifactBundle;
use crate::data_loading::FEATURE_COUNT;
use crate::error::{HepatoError, Result};
use crate::models::ClassifierKind;
use crate::screening::RiskLevel;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub model: ClassifierKind,
    /// `1.0` diseased, `0.0` healthy.
    pub label: f64,
    /// Probability of the diseased class.
    pub probability: f64,
    pub risk: RiskLevel,
}

/// Scores one validated, fixed-order feature vector with the chosen model.
pub fn predict(
    bundle: &ArtifactBundle,
    features: &[f64],
    kind: ClassifierKind,
) -> Result<Prediction> {
    if features.len() != FEATURE_COUNT {
        return Err(HepatoError::InvalidFeatureVector {
            expected: FEATURE_COUNT,
            actual: features.len(),
        });
    }

    let scaled = bundle.scaler.transform_row(features);
    let model = bundle.classifier(kind);
    let label = model.predict_row(&scaled)?;
    let probability = model.predict_proba_row(&scaled)?.clamp(0.0, 1.0);

    Ok(Prediction {
        model: kind,
        label,
        probability,
        risk: RiskLevel::from_label(label),
    })
}
