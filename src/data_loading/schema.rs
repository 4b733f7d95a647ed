//! Fixed column layout of the ILPD (Indian Liver Patient Dataset) CSV.

/// Raw CSV columns in file order. The file has no header row.
pub const COLUMN_NAMES: [&str; 11] = [
    "age",
    "gender",
    "total_bilirubin",
    "direct_bilirubin",
    "alkaline_phosphotase",
    "alamine_aminotransferase",
    "aspartate_aminotransferase",
    "total_proteins",
    "albumin",
    "albumin_globulin_ratio",
    "disease",
];

/// Feature order used for training and inference.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "gender",
    "total_bilirubin",
    "direct_bilirubin",
    "alkaline_phosphotase",
    "alamine_aminotransferase",
    "aspartate_aminotransferase",
    "total_proteins",
    "albumin",
    "albumin_globulin_ratio",
];

pub const FEATURE_COUNT: usize = 10;

pub const GENDER_COLUMN: usize = 1;
pub const LABEL_COLUMN: usize = 10;

pub const DISEASED: f64 = 1.0;
pub const HEALTHY: f64 = 0.0;

/// `Female` -> 0, `Male` -> 1.
pub fn encode_gender(raw: &str) -> Option<f64> {
    match raw {
        "Female" => Some(0.0),
        "Male" => Some(1.0),
        _ => None,
    }
}

/// Disease code `1` (patient) -> diseased, `2` (non-patient) -> healthy.
pub fn encode_label(raw: &str) -> Option<f64> {
    match raw.parse::<f64>().ok()? {
        code if code == 1.0 => Some(DISEASED),
        code if code == 2.0 => Some(HEALTHY),
        _ => None,
    }
}
