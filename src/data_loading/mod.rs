pub mod csv_data_loader;
pub mod data_loader;
pub mod schema;
pub mod summary;

pub use csv_data_loader::IlpdCsvLoader;
pub use data_loader::{DataLoader, Dataset, DatasetSource};
pub use schema::{FEATURE_COUNT, FEATURE_NAMES};
pub use summary::{DatasetSummary, FeatureSummary};
