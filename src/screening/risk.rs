use std::fmt;

use serde::{Deserialize, Serialize};

/// Color-coded risk shown next to a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Low,
}

impl RiskLevel {
    pub fn from_label(label: f64) -> Self {
        if label == 1.0 {
            Self::High
        } else {
            Self::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "HIGH RISK",
            Self::Low => "LOW RISK",
        }
    }

    /// Indicator background color.
    pub fn color(&self) -> &'static str {
        match self {
            Self::High => "red",
            Self::Low => "green",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
