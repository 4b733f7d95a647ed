use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::error::{HepatoError, Result};

/// Cleaned table: encoded features plus binary labels.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub x_data: DenseMatrix<f64>,
    pub y_data: Vec<f64>,
    /// Rows discarded because a field was missing.
    pub dropped_rows: usize,
}

impl Dataset {
    pub fn new(x_data: DenseMatrix<f64>, y_data: Vec<f64>, dropped_rows: usize) -> Self {
        Self {
            x_data,
            y_data,
            dropped_rows,
        }
    }

    /// Builds a dataset from row vectors.
    pub fn from_rows(rows: Vec<Vec<f64>>, labels: Vec<f64>) -> Result<Self> {
        if rows.len() != labels.len() {
            return Err(HepatoError::data_unavailable(
                "in-memory rows",
                format!("{} feature rows but {} labels", rows.len(), labels.len()),
            ));
        }
        let x_data = dense_from_rows(&rows)
            .map_err(|reason| HepatoError::data_unavailable("in-memory rows", reason))?;
        Ok(Self::new(x_data, labels, 0))
    }

    pub fn num_features(&self) -> usize {
        self.x_data.shape().1
    }

    pub fn num_samples(&self) -> usize {
        self.x_data.shape().0
    }

    pub fn row(&self, i: usize) -> Vec<f64> {
        (0..self.num_features())
            .map(|j| *self.x_data.get((i, j)))
            .collect()
    }

    /// Copies the given rows, in the given order, into a new dataset.
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        let rows: Vec<Vec<f64>> = indices.iter().map(|&i| self.row(i)).collect();
        let labels = indices.iter().map(|&i| self.y_data[i]).collect();
        Self::from_rows(rows, labels)
    }

    /// Share of diseased rows.
    pub fn positive_rate(&self) -> f64 {
        positive_rate(&self.y_data)
    }
}

pub(crate) fn positive_rate(labels: &[f64]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    labels.iter().filter(|&&y| y == 1.0).count() as f64 / labels.len() as f64
}

/// Converts row vectors into a smartcore matrix.
pub fn dense_from_rows(rows: &[Vec<f64>]) -> std::result::Result<DenseMatrix<f64>, String> {
    if rows.is_empty() {
        return Err("no rows".to_string());
    }
    let width = rows[0].len();
    if let Some(idx) = rows.iter().position(|r| r.len() != width) {
        return Err(format!(
            "row {} has {} values, expected {}",
            idx,
            rows[idx].len(),
            width
        ));
    }
    DenseMatrix::from_2d_vec(&rows.to_vec()).map_err(|e| format!("{e}"))
}

/// Where the raw CSV comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    Url(String),
    File(PathBuf),
    Inline(String),
}

impl DatasetSource {
    /// Fetches the raw text. No retries: retry policy belongs to the caller.
    pub fn read_to_string(&self, timeout: Duration) -> Result<String> {
        match self {
            Self::Url(url) => {
                let client = reqwest::blocking::Client::builder()
                    .timeout(timeout)
                    .build()
                    .map_err(|e| HepatoError::data_unavailable(self.to_string(), e.to_string()))?;
                let response = client
                    .get(url)
                    .send()
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| HepatoError::data_unavailable(self.to_string(), e.to_string()))?;
                response
                    .text()
                    .map_err(|e| HepatoError::data_unavailable(self.to_string(), e.to_string()))
            }
            Self::File(path) => std::fs::read_to_string(path)
                .map_err(|e| HepatoError::data_unavailable(self.to_string(), e.to_string())),
            Self::Inline(text) => Ok(text.clone()),
        }
    }
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Inline(_) => write!(f, "inline data"),
        }
    }
}

/// Strategy for turning a source into a cleaned dataset.
pub trait DataLoader: Send + Sync {
    fn get_name(&self) -> &str;

    /// Loads the whole table or fails; never returns a partial table.
    fn load(&self, source: &DatasetSource) -> Result<Dataset>;
}
