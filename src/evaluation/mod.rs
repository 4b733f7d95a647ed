pub mod evaluator;
pub mod metrics;
pub mod report;

pub use evaluator::ModelEvaluator;
pub use metrics::{ConfusionMatrix, EvaluationReport, EvaluationScope};
pub use report::{render_dataset_summary, render_summary};
