use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;

use super::platt::PlattScaling;
use super::{check_width, matrix_rows, IModel, TrainingOutcome};
use crate::error::Result;

const ALPHA_EPS: f64 = 1e-12;
const TAU: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmParams {
    /// Box constraint.
    pub c: f64,
    /// RBF width; `None` uses `1 / (n_features * var(X))`.
    pub gamma: Option<f64>,
    /// Stopping tolerance on the maximal KKT violation.
    pub tol: f64,
    pub max_iter: usize,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            gamma: None,
            tol: 1e-3,
            max_iter: 100_000,
        }
    }
}

/// RBF-kernel C-SVC trained with SMO, with Platt-calibrated probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmClassifier {
    params: SvmParams,
    gamma: f64,
    support_vectors: Vec<Vec<f64>>,
    /// `alpha_i * y_i` for each support vector.
    dual_coef: Vec<f64>,
    intercept: f64,
    platt: PlattScaling,
}

impl SvmClassifier {
    pub fn new(params: SvmParams) -> Self {
        Self {
            params,
            gamma: 1.0,
            support_vectors: Vec::new(),
            dual_coef: Vec::new(),
            intercept: 0.0,
            platt: PlattScaling::default(),
        }
    }

    pub fn n_support(&self) -> usize {
        self.support_vectors.len()
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    fn kernel(&self, a: &[f64], b: &[f64]) -> f64 {
        rbf(self.gamma, a, b)
    }

    /// Signed distance to the separating surface; positive means diseased.
    pub fn decision_function_row(&self, row: &[f64]) -> f64 {
        self.support_vectors
            .iter()
            .zip(&self.dual_coef)
            .map(|(sv, coef)| coef * self.kernel(sv, row))
            .sum::<f64>()
            + self.intercept
    }

    fn scale_gamma(rows: &[Vec<f64>]) -> f64 {
        let values: Vec<f64> = rows.iter().flatten().copied().collect();
        let n_features = rows.first().map_or(0, Vec::len);
        if values.is_empty() || n_features == 0 {
            return 1.0;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        if var > 0.0 {
            1.0 / (n_features as f64 * var)
        } else {
            1.0
        }
    }
}

impl Default for SvmClassifier {
    fn default() -> Self {
        Self::new(SvmParams::default())
    }
}

fn rbf(gamma: f64, a: &[f64], b: &[f64]) -> f64 {
    let dist: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
    (-gamma * dist).exp()
}

impl IModel for SvmClassifier {
    fn get_name(&self) -> &str {
        "Support Vector Machine (RBF)"
    }

    fn train(&mut self, x: &DenseMatrix<f64>, y: &[f64]) -> Result<TrainingOutcome> {
        let rows = matrix_rows(x);
        let n = rows.len();
        let c = self.params.c;
        self.gamma = self.params.gamma.unwrap_or_else(|| Self::scale_gamma(&rows));

        let signs: Vec<f64> = y.iter().map(|&l| if l == 1.0 { 1.0 } else { -1.0 }).collect();

        let mut kernel = vec![0.0; n * n];
        for i in 0..n {
            for j in i..n {
                let k = rbf(self.gamma, &rows[i], &rows[j]);
                kernel[i * n + j] = k;
                kernel[j * n + i] = k;
            }
        }

        let mut alpha = vec![0.0; n];
        // f_k = sum_j alpha_j y_j K(k, j), without intercept
        let mut f = vec![0.0; n];
        let error = |f: &[f64], k: usize| f[k] - signs[k];
        let in_up = |a: f64, s: f64| (s > 0.0 && a < c) || (s < 0.0 && a > 0.0);
        let in_low = |a: f64, s: f64| (s > 0.0 && a > 0.0) || (s < 0.0 && a < c);

        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.params.max_iter {
            // maximal violating pair
            let mut best_up: Option<(usize, f64)> = None;
            let mut best_low: Option<(usize, f64)> = None;
            for k in 0..n {
                let e = error(&f, k);
                if in_up(alpha[k], signs[k]) && best_up.map_or(true, |(_, v)| e < v) {
                    best_up = Some((k, e));
                }
                if in_low(alpha[k], signs[k]) && best_low.map_or(true, |(_, v)| e > v) {
                    best_low = Some((k, e));
                }
            }
            let (Some((i, e_i)), Some((j, e_j))) = (best_up, best_low) else {
                converged = true;
                break;
            };
            if e_j - e_i < self.params.tol {
                converged = true;
                break;
            }
            iterations += 1;

            let (a_i, a_j) = (alpha[i], alpha[j]);
            let (s_i, s_j) = (signs[i], signs[j]);
            let (lo, hi) = if s_i != s_j {
                ((a_j - a_i).max(0.0), (c + a_j - a_i).min(c))
            } else {
                ((a_i + a_j - c).max(0.0), (a_i + a_j).min(c))
            };
            let eta = (kernel[i * n + i] + kernel[j * n + j] - 2.0 * kernel[i * n + j]).max(TAU);

            let new_a_j = (a_j + s_j * (e_i - e_j) / eta).clamp(lo, hi);
            let new_a_i = (a_i + s_i * s_j * (a_j - new_a_j)).clamp(0.0, c);

            let d_i = (new_a_i - a_i) * s_i;
            let d_j = (new_a_j - a_j) * s_j;
            if d_i == 0.0 && d_j == 0.0 {
                break;
            }
            alpha[i] = new_a_i;
            alpha[j] = new_a_j;
            for k in 0..n {
                f[k] += d_i * kernel[i * n + k] + d_j * kernel[j * n + k];
            }
        }

        // intercept from free support vectors, else midpoint of the bounds
        let free: Vec<f64> = (0..n)
            .filter(|&k| alpha[k] > ALPHA_EPS && alpha[k] < c - ALPHA_EPS)
            .map(|k| signs[k] - f[k])
            .collect();
        self.intercept = if !free.is_empty() {
            free.iter().sum::<f64>() / free.len() as f64
        } else {
            let up = (0..n)
                .filter(|&k| in_up(alpha[k], signs[k]))
                .map(|k| error(&f, k))
                .fold(f64::INFINITY, f64::min);
            let low = (0..n)
                .filter(|&k| in_low(alpha[k], signs[k]))
                .map(|k| error(&f, k))
                .fold(f64::NEG_INFINITY, f64::max);
            match (up.is_finite(), low.is_finite()) {
                (true, true) => -(up + low) / 2.0,
                (true, false) => -up,
                (false, true) => -low,
                (false, false) => 0.0,
            }
        };

        self.support_vectors.clear();
        self.dual_coef.clear();
        for k in 0..n {
            if alpha[k] > ALPHA_EPS {
                self.support_vectors.push(rows[k].clone());
                self.dual_coef.push(alpha[k] * signs[k]);
            }
        }

        let decision: Vec<f64> = f.iter().map(|v| v + self.intercept).collect();
        self.platt = PlattScaling::fit(&decision, y);

        Ok(TrainingOutcome {
            iterations,
            converged,
        })
    }

    fn predict_row(&self, row: &[f64]) -> Result<f64> {
        check_width(self, row)?;
        Ok(if self.decision_function_row(row) > 0.0 {
            1.0
        } else {
            0.0
        })
    }

    fn predict_proba_row(&self, row: &[f64]) -> Result<f64> {
        check_width(self, row)?;
        Ok(self.platt.probability(self.decision_function_row(row)))
    }

    fn n_features(&self) -> usize {
        self.support_vectors.first().map_or(0, Vec::len)
    }

    /// At least one support vector, all of one width, each with a coefficient.
    fn is_fitted(&self) -> bool {
        let width = self.n_features();
        width > 0
            && self.dual_coef.len() == self.support_vectors.len()
            && self.support_vectors.iter().all(|sv| sv.len() == width)
    }
}
