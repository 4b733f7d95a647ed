//! Input checks and result presentation for the screening form.

pub mod patient;
pub mod risk;

pub use patient::{age_from_birth_date, Gender, PatientRecord};
pub use risk::RiskLevel;
