//! Descriptive statistics of a cleaned dataset.

use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::arrays::Array;
use statrs::statistics::Statistics;

use super::data_loader::Dataset;
use super::schema::{DISEASED, FEATURE_NAMES};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSummary {
    pub name: String,
    pub mean: f64,
    /// Sample standard deviation; `NaN` with fewer than two rows.
    pub std_dev: f64,
    /// Sample variance; `NaN` with fewer than two rows.
    pub variance: f64,
    pub min: f64,
    pub max: f64,
}

/// Per-feature statistics plus the class balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub dropped_rows: usize,
    pub healthy: usize,
    pub diseased: usize,
    pub features: Vec<FeatureSummary>,
}

impl DatasetSummary {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let (rows, cols) = dataset.x_data.shape();
        let features = (0..cols)
            .map(|j| {
                let col: Vec<f64> = (0..rows).map(|i| *dataset.x_data.get((i, j))).collect();
                let name = if cols == FEATURE_NAMES.len() {
                    FEATURE_NAMES[j].to_string()
                } else {
                    format!("x{j}")
                };
                FeatureSummary {
                    name,
                    mean: col.iter().mean(),
                    std_dev: col.iter().std_dev(),
                    variance: col.iter().variance(),
                    min: Statistics::min(col.iter()),
                    max: Statistics::max(col.iter()),
                }
            })
            .collect();

        let diseased = dataset.y_data.iter().filter(|&&y| y == DISEASED).count();
        Self {
            rows,
            dropped_rows: dataset.dropped_rows,
            healthy: dataset.y_data.len() - diseased,
            diseased,
            features,
        }
    }
}

impl Dataset {
    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary::from_dataset(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::toy_dataset;

    #[test]
    fn describes_columns_and_classes() {
        let ds = Dataset::from_rows(
            vec![vec![1.0, 10.0], vec![2.0, 10.0], vec![3.0, 10.0], vec![6.0, 10.0]],
            vec![0.0, 1.0, 1.0, 1.0],
        )
        .unwrap();
        let s = ds.summary();

        assert_eq!(s.rows, 4);
        assert_eq!((s.healthy, s.diseased), (1, 3));
        assert_eq!(s.features[0].name, "x0");
        assert_eq!(s.features[0].mean, 3.0);
        assert_eq!(s.features[0].min, 1.0);
        assert_eq!(s.features[0].max, 6.0);
        // sample variance: (4 + 1 + 0 + 9) / 3
        assert!((s.features[0].variance - 14.0 / 3.0).abs() < 1e-12);
        assert!((s.features[0].std_dev - (14.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(s.features[1].variance, 0.0);
    }

    #[test]
    fn ilpd_columns_use_feature_names() {
        let ds = toy_dataset();
        let s = ds.summary();
        assert_eq!(s.features.len(), FEATURE_NAMES.len());
        assert_eq!(s.features[0].name, "age");
        assert_eq!(s.healthy + s.diseased, ds.num_samples());
    }
}
