use smartcore::linalg::basic::matrix::DenseMatrix;

/// Fit-then-apply feature transformation.
pub trait DataProcessor {
    fn get_name(&self) -> &str;
    fn fit(&mut self, data: &DenseMatrix<f64>);
    fn transform(&self, data: &DenseMatrix<f64>) -> DenseMatrix<f64>;

    fn fit_transform(&mut self, data: &DenseMatrix<f64>) -> DenseMatrix<f64> {
        self.fit(data);
        self.transform(data)
    }
}

pub mod scaler;
pub mod split;

pub use scaler::StandardScaler;
pub use split::{stratified_split, SplitConfig, SplitIndices};
