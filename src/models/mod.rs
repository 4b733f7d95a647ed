use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::error::{HepatoError, Result};

/// Binary classifier over standardized feature rows.
///
/// Labels are `0.0` (healthy) and `1.0` (diseased); probabilities are for
/// the diseased class.
pub trait IModel: Send + Sync {
    fn get_name(&self) -> &str;

    fn train(&mut self, x: &DenseMatrix<f64>, y: &[f64]) -> Result<TrainingOutcome>;

    fn predict_row(&self, row: &[f64]) -> Result<f64>;

    fn predict_proba_row(&self, row: &[f64]) -> Result<f64>;

    /// Input width the model was fitted on; `0` before training.
    fn n_features(&self) -> usize;

    fn is_fitted(&self) -> bool;

    fn predict(&self, x: &DenseMatrix<f64>) -> Result<Vec<f64>> {
        matrix_rows(x).iter().map(|r| self.predict_row(r)).collect()
    }

    fn predict_proba(&self, x: &DenseMatrix<f64>) -> Result<Vec<f64>> {
        matrix_rows(x)
            .iter()
            .map(|r| self.predict_proba_row(r))
            .collect()
    }
}

/// Rejects rows whose width differs from what `model` was fitted on.
pub(crate) fn check_width(model: &dyn IModel, row: &[f64]) -> Result<()> {
    if row.len() != model.n_features() {
        return Err(HepatoError::InvalidFeatureVector {
            expected: model.n_features(),
            actual: row.len(),
        });
    }
    Ok(())
}

/// How a fit ended. Hitting the iteration cap is a warning, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingOutcome {
    pub iterations: usize,
    pub converged: bool,
}

/// The two classifier families trained per split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClassifierKind {
    Svm,
    Mlp,
}

impl ClassifierKind {
    pub const ALL: [ClassifierKind; 2] = [ClassifierKind::Svm, ClassifierKind::Mlp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Svm => "svm",
            Self::Mlp => "mlp",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Svm => "Support Vector Machine - RBF kernel, Platt-calibrated probabilities",
            Self::Mlp => "Multi-layer Perceptron - two ReLU hidden layers, logistic output",
        }
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

impl FromStr for ClassifierKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "svm" | "svc" => Ok(Self::Svm),
            "mlp" | "perceptron" => Ok(Self::Mlp),
            _ => Err(format!("unknown model: {s}")),
        }
    }
}

pub(crate) fn matrix_rows(x: &DenseMatrix<f64>) -> Vec<Vec<f64>> {
    let (rows, cols) = x.shape();
    (0..rows)
        .map(|i| (0..cols).map(|j| *x.get((i, j))).collect())
        .collect()
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

pub mod mlp;
pub mod platt;
pub mod svm;

pub use mlp::{MlpClassifier, MlpParams};
pub use platt::PlattScaling;
pub use svm::{SvmClassifier, SvmParams};
