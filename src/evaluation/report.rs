use std::fmt::Write;

use super::metrics::EvaluationReport;
use crate::data_loading::DatasetSummary;

const RULE_WIDTH: usize = 74;

/// Renders the metrics table followed by one confusion matrix per report.
pub fn render_summary(reports: &[EvaluationReport]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10} | {:<5} | {:<7} | {:<7} | {:<7} | {:<7} | {:<7}",
        "SPLIT", "MDL", "ACC", "PRE", "REC", "F1", "AUC"
    );
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));

    for r in reports {
        let auc = r
            .roc_auc
            .map(|v| format!("{v:.4}"))
            .unwrap_or_else(|| "n/a".to_string());
        let _ = writeln!(
            out,
            "{:<10} | {:<5} | {:.4}  | {:.4}  | {:.4}  | {:.4}  | {}",
            r.split.to_string(),
            r.model.to_string(),
            r.accuracy,
            r.precision,
            r.recall,
            r.f1,
            auc
        );
    }

    let _ = writeln!(out, "\nCONFUSION MATRICES (H = healthy, D = diseased):");
    for r in reports {
        let [[tn, fp], [fn_, tp]] = r.confusion.as_array();
        let _ = writeln!(out, "\n[{} - split {}, {} rows]:", r.model, r.split, r.samples);
        let _ = writeln!(out, "        Pred:H   Pred:D");
        let _ = writeln!(out, "Real:H  {tn:<8} {fp:<8}");
        let _ = writeln!(out, "Real:D  {fn_:<8} {tp:<8}");
    }
    out
}

/// Renders per-feature statistics and the class balance.
pub fn render_dataset_summary(summary: &DatasetSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} rows ({} dropped): {} healthy, {} diseased",
        summary.rows, summary.dropped_rows, summary.healthy, summary.diseased
    );
    let _ = writeln!(
        out,
        "{:<28} | {:>10} | {:>10} | {:>12} | {:>10} | {:>10}",
        "FEATURE", "MEAN", "STD", "VAR", "MIN", "MAX"
    );
    let _ = writeln!(out, "{}", "-".repeat(96));
    for f in &summary.features {
        let _ = writeln!(
            out,
            "{:<28} | {:>10.3} | {:>10.3} | {:>12.3} | {:>10.3} | {:>10.3}",
            f.name, f.mean, f.std_dev, f.variance, f.min, f.max
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::metrics::{ConfusionMatrix, EvaluationScope};
    use crate::models::ClassifierKind;
    use crate::processing::SplitConfig;

    fn report(model: ClassifierKind, roc_auc: Option<f64>) -> EvaluationReport {
        EvaluationReport {
            split: SplitConfig::from_percent(30).unwrap(),
            model,
            scope: EvaluationScope::FullDataset,
            samples: 10,
            accuracy: 0.9,
            precision: 0.875,
            recall: 1.0,
            f1: 0.9333,
            roc_auc,
            confusion: ConfusionMatrix {
                true_negatives: 2,
                false_positives: 1,
                false_negatives: 0,
                true_positives: 7,
            },
        }
    }

    #[test]
    fn dataset_summary_lists_each_feature() {
        let ds = crate::test_support::toy_dataset();
        let text = render_dataset_summary(&ds.summary());
        assert!(text.starts_with(&format!("{} rows", ds.num_samples())));
        assert!(text.contains("healthy"));
        for name in crate::data_loading::FEATURE_NAMES {
            assert!(text.contains(name), "{name}");
        }
    }

    #[test]
    fn lists_every_model_and_matrix() {
        let text = render_summary(&[
            report(ClassifierKind::Svm, Some(0.95)),
            report(ClassifierKind::Mlp, None),
        ]);
        assert!(text.starts_with("SPLIT"));
        assert!(text.contains("70/30"));
        assert!(text.contains("SVM"));
        assert!(text.contains("MLP"));
        assert!(text.contains("0.9500"));
        assert!(text.contains("n/a"));
        assert!(text.contains("Real:H  2        1"));
        assert!(text.contains("Real:D  0        7"));
    }
}
