use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::data_loading::FEATURE_COUNT;
use crate::error::{HepatoError, Result};

const MAX_AGE: f64 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    /// Encoding used by the training data.
    pub fn encoded(&self) -> f64 {
        match self {
            Self::Female => 0.0,
            Self::Male => 1.0,
        }
    }
}

impl FromStr for Gender {
    type Err = HepatoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "f" | "female" => Ok(Self::Female),
            "m" | "male" => Ok(Self::Male),
            other => Err(HepatoError::InvalidPatient(format!(
                "unknown gender '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Female => f.write_str("Female"),
            Self::Male => f.write_str("Male"),
        }
    }
}

/// Clinical measurements entered for one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub age: f64,
    pub gender: Gender,
    pub total_bilirubin: f64,
    pub direct_bilirubin: f64,
    pub alkaline_phosphotase: f64,
    pub alamine_aminotransferase: f64,
    pub aspartate_aminotransferase: f64,
    pub total_proteins: f64,
    pub albumin: f64,
    pub albumin_globulin_ratio: f64,
}

impl PatientRecord {
    fn clinical_values(&self) -> [(&'static str, f64); 8] {
        [
            ("total bilirubin", self.total_bilirubin),
            ("direct bilirubin", self.direct_bilirubin),
            ("alkaline phosphotase", self.alkaline_phosphotase),
            ("ALT", self.alamine_aminotransferase),
            ("AST", self.aspartate_aminotransferase),
            ("total proteins", self.total_proteins),
            ("albumin", self.albumin),
            ("A/G ratio", self.albumin_globulin_ratio),
        ]
    }

    /// Range and plausibility checks run before a record reaches a model.
    pub fn validate(&self) -> Result<()> {
        if !self.age.is_finite() || !(0.0..=MAX_AGE).contains(&self.age) {
            return Err(HepatoError::InvalidPatient(format!(
                "age {} is outside 0..=120",
                self.age
            )));
        }

        for (name, value) in self.clinical_values() {
            if !value.is_finite() {
                return Err(HepatoError::InvalidPatient(format!(
                    "{name} must be a number"
                )));
            }
            if value < 0.0 {
                return Err(HepatoError::InvalidPatient(format!(
                    "{name} cannot be negative"
                )));
            }
        }

        if self.direct_bilirubin > self.total_bilirubin {
            return Err(HepatoError::InvalidPatient(
                "direct bilirubin cannot exceed total bilirubin".to_string(),
            ));
        }
        Ok(())
    }

    /// Feature vector in training column order.
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.age,
            self.gender.encoded(),
            self.total_bilirubin,
            self.direct_bilirubin,
            self.alkaline_phosphotase,
            self.alamine_aminotransferase,
            self.aspartate_aminotransferase,
            self.total_proteins,
            self.albumin,
            self.albumin_globulin_ratio,
        ]
    }
}

/// Completed years between a `YYYY-MM-DD` birth date and `today`.
pub fn age_from_birth_date(birth_date: &str, today: NaiveDate) -> Result<u32> {
    let dob = NaiveDate::parse_from_str(birth_date.trim(), "%Y-%m-%d").map_err(|_| {
        HepatoError::InvalidPatient(format!("birth date '{birth_date}' is not YYYY-MM-DD"))
    })?;
    if dob > today {
        return Err(HepatoError::InvalidPatient(format!(
            "birth date {dob} is in the future"
        )));
    }
    let before_birthday = (today.month(), today.day()) < (dob.month(), dob.day());
    let years = today.year() - dob.year() - i32::from(before_birthday);
    Ok(years.max(0) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PatientRecord {
        PatientRecord {
            age: 45.0,
            gender: Gender::Male,
            total_bilirubin: 1.2,
            direct_bilirubin: 0.4,
            alkaline_phosphotase: 210.0,
            alamine_aminotransferase: 35.0,
            aspartate_aminotransferase: 40.0,
            total_proteins: 6.8,
            albumin: 3.3,
            albumin_globulin_ratio: 0.9,
        }
    }

    #[test]
    fn valid_record_passes() {
        assert!(record().validate().is_ok());
        let f = record().features();
        assert_eq!(f.len(), FEATURE_COUNT);
        assert_eq!(f[1], 1.0);
        assert_eq!(f[3], 0.4);
    }

    #[test]
    fn rejects_out_of_range_age() {
        let mut r = record();
        r.age = 130.0;
        assert!(r.validate().is_err());
        r.age = -1.0;
        assert!(r.validate().is_err());
    }

    #[test]
    fn rejects_negative_and_non_finite_values() {
        let mut r = record();
        r.albumin = -0.1;
        assert!(r.validate().is_err());
        let mut r = record();
        r.total_proteins = f64::NAN;
        assert!(r.validate().is_err());
    }

    #[test]
    fn rejects_direct_above_total_bilirubin() {
        let mut r = record();
        r.direct_bilirubin = 2.0;
        let err = r.validate().unwrap_err();
        assert!(err.to_string().contains("direct bilirubin"));
    }

    #[test]
    fn parses_gender() {
        assert_eq!("Male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!("f".parse::<Gender>().unwrap(), Gender::Female);
        assert!("x".parse::<Gender>().is_err());
    }

    #[test]
    fn computes_age_from_birth_date() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert_eq!(age_from_birth_date("1980-10-17", today).unwrap(), 46);
        assert_eq!(age_from_birth_date("1980-10-18", today).unwrap(), 45);
        assert!(age_from_birth_date("17/10/1980", today).is_err());
        assert!(age_from_birth_date("2030-01-01", today).is_err());
    }
}
