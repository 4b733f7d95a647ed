use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::arrays::{Array, MutArray};
use smartcore::linalg::basic::matrix::DenseMatrix;
use statrs::statistics::Statistics;

use super::DataProcessor;

/// Standardizes each column to zero mean and unit (population) variance.
///
/// Statistics come from `fit` only; `transform` reuses them so that
/// inference sees the same scaling as the training partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fitted(&self) -> bool {
        !self.means.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect()
    }
}

impl DataProcessor for StandardScaler {
    fn get_name(&self) -> &str {
        "Standard Scaler"
    }

    fn fit(&mut self, data: &DenseMatrix<f64>) {
        let (rows, cols) = data.shape();
        self.means.clear();
        self.scales.clear();

        for j in 0..cols {
            let col: Vec<f64> = (0..rows).map(|i| *data.get((i, j))).collect();
            let mean = col.iter().mean();
            let std = col.iter().population_std_dev();

            self.means.push(if mean.is_finite() { mean } else { 0.0 });
            // constant columns pass through centred but unscaled
            self.scales
                .push(if std.is_finite() && std > 0.0 { std } else { 1.0 });
        }
    }

    fn transform(&self, data: &DenseMatrix<f64>) -> DenseMatrix<f64> {
        let (rows, cols) = data.shape();
        let mut result = data.clone();

        for j in 0..cols.min(self.means.len()) {
            for i in 0..rows {
                let val = (data.get((i, j)) - self.means[j]) / self.scales[j];
                result.set((i, j), val);
            }
        }
        result
    }
}
