//! Platt sigmoid calibration of SVM decision values.
//!
//! Fits `P(y = 1 | d) = 1 / (1 + exp(A * d + B))` with the Newton method and
//! backtracking line search of Lin, Lin & Weng (2007), using the smoothed
//! targets `(N+ + 1) / (N+ + 2)` and `1 / (N- + 2)`.

use serde::{Deserialize, Serialize};

const MAX_ITER: usize = 100;
const MIN_STEP: f64 = 1e-10;
const SIGMA: f64 = 1e-12;
const EPS: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattScaling {
    pub a: f64,
    pub b: f64,
}

impl Default for PlattScaling {
    /// Uncalibrated logistic of the decision value.
    fn default() -> Self {
        Self { a: -1.0, b: 0.0 }
    }
}

impl PlattScaling {
    /// `labels` are 0/1; `decision` are the matching raw SVM outputs.
    pub fn fit(decision: &[f64], labels: &[f64]) -> Self {
        let prior1 = labels.iter().filter(|&&y| y == 1.0).count() as f64;
        let prior0 = labels.len() as f64 - prior1;
        if decision.is_empty() || prior1 == 0.0 || prior0 == 0.0 {
            return Self::default();
        }

        let hi_target = (prior1 + 1.0) / (prior1 + 2.0);
        let lo_target = 1.0 / (prior0 + 2.0);
        let targets: Vec<f64> = labels
            .iter()
            .map(|&y| if y == 1.0 { hi_target } else { lo_target })
            .collect();

        let objective = |a: f64, b: f64| -> f64 {
            decision
                .iter()
                .zip(&targets)
                .map(|(&d, &t)| {
                    let f_apb = d * a + b;
                    if f_apb >= 0.0 {
                        t * f_apb + (1.0 + (-f_apb).exp()).ln()
                    } else {
                        (t - 1.0) * f_apb + (1.0 + f_apb.exp()).ln()
                    }
                })
                .sum()
        };

        let mut a = 0.0;
        let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
        let mut fval = objective(a, b);

        for _ in 0..MAX_ITER {
            let (mut h11, mut h22, mut h21) = (SIGMA, SIGMA, 0.0);
            let (mut g1, mut g2) = (0.0, 0.0);
            for (&d, &t) in decision.iter().zip(&targets) {
                let f_apb = d * a + b;
                let (p, q) = if f_apb >= 0.0 {
                    let e = (-f_apb).exp();
                    (e / (1.0 + e), 1.0 / (1.0 + e))
                } else {
                    let e = f_apb.exp();
                    (1.0 / (1.0 + e), e / (1.0 + e))
                };
                let d2 = p * q;
                h11 += d * d * d2;
                h22 += d2;
                h21 += d * d2;
                let d1 = t - p;
                g1 += d * d1;
                g2 += d1;
            }

            if g1.abs() < EPS && g2.abs() < EPS {
                break;
            }

            let det = h11 * h22 - h21 * h21;
            if det == 0.0 || !det.is_finite() {
                break;
            }
            let da = -(h22 * g1 - h21 * g2) / det;
            let db = -(-h21 * g1 + h11 * g2) / det;
            let gd = g1 * da + g2 * db;

            let mut step = 1.0;
            while step >= MIN_STEP {
                let new_a = a + step * da;
                let new_b = b + step * db;
                let new_f = objective(new_a, new_b);
                if new_f < fval + 1e-4 * step * gd {
                    a = new_a;
                    b = new_b;
                    fval = new_f;
                    break;
                }
                step /= 2.0;
            }
            if step < MIN_STEP {
                tracing::debug!("platt line search failed to improve");
                break;
            }
        }

        Self { a, b }
    }

    pub fn probability(&self, decision: f64) -> f64 {
        let f_apb = decision * self.a + self.b;
        if f_apb >= 0.0 {
            let e = (-f_apb).exp();
            e / (1.0 + e)
        } else {
            1.0 / (1.0 + f_apb.exp())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_decisions_map_to_high_probability() {
        let decision = [-2.0, -1.5, -1.0, -0.2, 0.3, 1.0, 1.4, 2.2];
        let labels = [0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 1.0];
        let platt = PlattScaling::fit(&decision, &labels);

        assert!(platt.a < 0.0);
        assert!(platt.probability(2.0) > 0.5);
        assert!(platt.probability(-2.0) < 0.5);
        assert!(platt.probability(1.0) > platt.probability(0.0));
    }

    #[test]
    fn single_class_falls_back_to_default() {
        let platt = PlattScaling::fit(&[1.0, 2.0], &[1.0, 1.0]);
        assert_eq!(platt, PlattScaling::default());
        assert!((platt.probability(0.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn probabilities_stay_in_unit_interval() {
        let platt = PlattScaling { a: -50.0, b: 0.0 };
        for d in [-1e3, -10.0, 0.0, 10.0, 1e3] {
            let p = platt.probability(d);
            assert!((0.0..=1.0).contains(&p));
        }
    }
}
