use super::metrics::{ConfusionMatrix, EvaluationReport, EvaluationScope};
use crate::data_loading::data_loader::Dataset;
use crate::error::Result;
use crate::models::ClassifierKind;
use crate::pipeline::{ArtifactBundle, ModelRegistry};
use crate::processing::{stratified_split, DataProcessor, SplitConfig};
use smartcore::metrics::{f1, precision, recall};

pub struct ModelEvaluator;

impl ModelEvaluator {
    /// Scores every registered split with both classifiers. Read-only.
    pub fn evaluate(registry: &ModelRegistry, scope: EvaluationScope) -> Result<Vec<EvaluationReport>> {
        let mut reports = Vec::new();
        for (split, bundle) in registry.iter() {
            reports.extend(Self::evaluate_bundle(split, bundle, registry.dataset(), scope)?);
        }
        Ok(reports)
    }

    pub fn evaluate_bundle(
        split: SplitConfig,
        bundle: &ArtifactBundle,
        dataset: &Dataset,
        scope: EvaluationScope,
    ) -> Result<Vec<EvaluationReport>> {
        let held_out;
        let rows = match scope {
            EvaluationScope::FullDataset => dataset,
            EvaluationScope::HeldOut { seed } => {
                let indices = stratified_split(&dataset.y_data, split, seed);
                if indices.test.is_empty() {
                    tracing::warn!(split = %split, "held-out partition is empty, skipping");
                    return Ok(Vec::new());
                }
                held_out = dataset.select(&indices.test)?;
                &held_out
            }
        };

        let x_scaled = bundle.scaler.transform(&rows.x_data);
        ClassifierKind::ALL
            .iter()
            .map(|&kind| {
                let model = bundle.classifier(kind);
                let y_pred = model.predict(&x_scaled)?;
                let y_proba = model.predict_proba(&x_scaled)?;
                Ok(Self::evaluate_classification(
                    &rows.y_data,
                    &y_pred,
                    &y_proba,
                    split,
                    kind,
                    scope,
                ))
            })
            .collect()
    }

    pub fn evaluate_classification(
        y_true: &[f64],
        y_pred: &[f64],
        y_proba: &[f64],
        split: SplitConfig,
        model: ClassifierKind,
        scope: EvaluationScope,
    ) -> EvaluationReport {
        let y_true_vec: Vec<f64> = y_true.to_vec();
        let y_pred_vec: Vec<f64> = y_pred.to_vec();
        let confusion = ConfusionMatrix::from_predictions(y_true, y_pred);

        EvaluationReport {
            split,
            model,
            scope,
            samples: y_true.len(),
            accuracy: confusion.accuracy(),
            precision: finite_or_zero(precision(&y_true_vec, &y_pred_vec)),
            recall: finite_or_zero(recall(&y_true_vec, &y_pred_vec)),
            f1: finite_or_zero(f1(&y_true_vec, &y_pred_vec, 1.0)),
            roc_auc: Self::roc_auc(y_true, y_proba),
            confusion,
        }
    }

    /// Rank-statistic AUC with averaged ranks for tied scores.
    pub fn roc_auc(y_true: &[f64], scores: &[f64]) -> Option<f64> {
        let positives = y_true.iter().filter(|&&y| y == 1.0).count();
        let negatives = y_true.len() - positives;
        if positives == 0 || negatives == 0 {
            return None;
        }

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

        let mut ranks = vec![0.0; scores.len()];
        let mut start = 0;
        while start < order.len() {
            let mut end = start + 1;
            while end < order.len() && scores[order[end]] == scores[order[start]] {
                end += 1;
            }
            // ranks are 1-based; ties share the mean rank
            let mean_rank = (start + end + 1) as f64 / 2.0;
            for &idx in &order[start..end] {
                ranks[idx] = mean_rank;
            }
            start = end;
        }

        let pos_rank_sum: f64 = y_true
            .iter()
            .zip(&ranks)
            .filter(|(&y, _)| y == 1.0)
            .map(|(_, r)| r)
            .sum();
        let p = positives as f64;
        Some((pos_rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64))
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split() -> SplitConfig {
        SplitConfig::from_percent(20).unwrap()
    }

    #[test]
    fn perfect_predictions() {
        let y = [0.0, 1.0, 1.0, 0.0, 1.0];
        let proba = [0.1, 0.9, 0.8, 0.2, 0.7];
        let r = ModelEvaluator::evaluate_classification(
            &y,
            &y,
            &proba,
            split(),
            ClassifierKind::Svm,
            EvaluationScope::FullDataset,
        );
        assert_eq!(r.accuracy, 1.0);
        assert_eq!(r.precision, 1.0);
        assert_eq!(r.recall, 1.0);
        assert_eq!(r.f1, 1.0);
        assert_eq!(r.roc_auc, Some(1.0));
        assert_eq!(r.confusion.off_diagonal(), 0);
        assert_eq!(r.confusion.as_array(), [[2, 0], [0, 3]]);
    }

    #[test]
    fn mixed_predictions() {
        let y_true = [1.0, 1.0, 0.0, 0.0];
        let y_pred = [1.0, 0.0, 1.0, 0.0];
        let r = ModelEvaluator::evaluate_classification(
            &y_true,
            &y_pred,
            &[0.9, 0.4, 0.6, 0.1],
            split(),
            ClassifierKind::Mlp,
            EvaluationScope::HeldOut { seed: 42 },
        );
        assert!((r.accuracy - 0.5).abs() < 1e-12);
        assert!((r.precision - 0.5).abs() < 1e-12);
        assert!((r.recall - 0.5).abs() < 1e-12);
        assert!((r.f1 - 0.5).abs() < 1e-12);
        assert_eq!(r.roc_auc, Some(0.75));
    }

    #[test]
    fn precision_and_recall_differ_when_errors_are_one_sided() {
        // one healthy row flagged as diseased, no missed cases
        let y_true = [0.0, 0.0, 1.0, 1.0];
        let y_pred = [0.0, 1.0, 1.0, 1.0];
        let r = ModelEvaluator::evaluate_classification(
            &y_true,
            &y_pred,
            &[0.2, 0.6, 0.7, 0.9],
            split(),
            ClassifierKind::Svm,
            EvaluationScope::FullDataset,
        );
        assert_eq!(r.confusion.as_array(), [[1, 1], [0, 2]]);
        assert!((r.accuracy - 0.75).abs() < 1e-12);
        assert!((r.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((r.recall - 1.0).abs() < 1e-12);
        assert!((r.f1 - 0.8).abs() < 1e-12);
    }

    #[test]
    fn empty_input_scores_zero() {
        let r = ModelEvaluator::evaluate_classification(
            &[],
            &[],
            &[],
            split(),
            ClassifierKind::Mlp,
            EvaluationScope::FullDataset,
        );
        assert_eq!(r.samples, 0);
        assert_eq!(r.accuracy, 0.0);
        assert_eq!(r.roc_auc, None);
    }

    #[test]
    fn auc_handles_ties_and_single_class() {
        assert_eq!(ModelEvaluator::roc_auc(&[0.0, 1.0], &[0.5, 0.5]), Some(0.5));
        assert_eq!(ModelEvaluator::roc_auc(&[1.0, 1.0], &[0.2, 0.9]), None);
        assert_eq!(
            ModelEvaluator::roc_auc(&[1.0, 0.0, 1.0, 0.0], &[0.1, 0.9, 0.2, 0.8]),
            Some(0.0)
        );
    }
}
