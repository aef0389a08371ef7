//! Borrower data structures for loan default scoring

use crate::error::ValidationError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A closed set of category values for one categorical input field.
///
/// The encoder relies on `ALL` to enumerate the values it knows about and
/// on `as_str` for the suffix of the trained one-hot column name.
pub trait Category: Copy + Sized + 'static {
    /// Column prefix used at training time.
    const FIELD: &'static str;
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    /// Case-insensitive lookup against the known values.
    fn parse(value: &str) -> Result<Self, ValidationError> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| ValidationError::UnknownCategory {
                field: Self::FIELD,
                allowed: Self::ALL
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                value: value.to_string(),
            })
    }
}

/// Home ownership status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HomeOwnership {
    Rent,
    Own,
    Mortgage,
    Other,
}

impl Category for HomeOwnership {
    const FIELD: &'static str = "person_home_ownership";
    const ALL: &'static [Self] = &[Self::Rent, Self::Own, Self::Mortgage, Self::Other];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Rent => "RENT",
            Self::Own => "OWN",
            Self::Mortgage => "MORTGAGE",
            Self::Other => "OTHER",
        }
    }
}

/// Purpose of the loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoanIntent {
    Education,
    Medical,
    Venture,
    Personal,
    HomeImprovement,
    DebtConsolidation,
}

impl Category for LoanIntent {
    const FIELD: &'static str = "loan_intent";
    const ALL: &'static [Self] = &[
        Self::Education,
        Self::Medical,
        Self::Venture,
        Self::Personal,
        Self::HomeImprovement,
        Self::DebtConsolidation,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Education => "EDUCATION",
            Self::Medical => "MEDICAL",
            Self::Venture => "VENTURE",
            Self::Personal => "PERSONAL",
            Self::HomeImprovement => "HOMEIMPROVEMENT",
            Self::DebtConsolidation => "DEBTCONSOLIDATION",
        }
    }
}

/// Whether a previous loan default is on file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PriorDefault {
    Yes,
    No,
}

impl Category for PriorDefault {
    const FIELD: &'static str = "previous_loan_defaults_on_file";
    const ALL: &'static [Self] = &[Self::Yes, Self::No];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }
}

macro_rules! impl_display {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

impl_display!(HomeOwnership, LoanIntent, PriorDefault);

/// Raw borrower payload as received from a client, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorrowerInput {
    /// Age in years (18 - 100)
    #[serde(alias = "age", deserialize_with = "whole_number")]
    pub person_age: i64,

    /// Annual income
    #[serde(alias = "annual_income")]
    pub person_income: f64,

    /// Employment experience in years (0 - 50)
    #[serde(alias = "employment_experience", deserialize_with = "whole_number")]
    pub person_emp_exp: i64,

    /// RENT, OWN, MORTGAGE or OTHER (any case)
    #[serde(alias = "home_ownership")]
    pub person_home_ownership: String,

    /// Requested loan amount
    #[serde(alias = "loan_amount")]
    pub loan_amnt: f64,

    /// Interest rate in percent (0 - 30)
    #[serde(alias = "loan_interest_rate")]
    pub loan_int_rate: f64,

    /// Loan purpose (any case)
    pub loan_intent: String,

    /// Credit score (300 - 900)
    #[serde(deserialize_with = "whole_number")]
    pub credit_score: i64,

    /// Credit history length in years (0 - 50)
    #[serde(alias = "credit_history_length", deserialize_with = "whole_number")]
    pub cb_person_cred_hist_length: i64,

    /// "Yes" or "No" (any case)
    #[serde(alias = "prior_default")]
    pub previous_loan_defaults_on_file: String,
}

/// Integer fields also accept whole numbers written with a fraction, e.g. `750.0`.
fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= i64::MAX as f64 / 2.0 {
        Ok(value as i64)
    } else {
        Err(serde::de::Error::custom(format!(
            "expected a whole number, got {}",
            value
        )))
    }
}

/// A validated, normalized borrower record. Only constructed through
/// [`BorrowerRecord::validate`], so every value is inside its domain.
#[derive(Debug, Clone, PartialEq)]
pub struct BorrowerRecord {
    pub age: u32,
    pub annual_income: f64,
    pub employment_experience: u32,
    pub home_ownership: HomeOwnership,
    pub loan_amount: f64,
    pub loan_interest_rate: f64,
    pub loan_intent: LoanIntent,
    pub credit_score: u32,
    pub credit_history_length: u32,
    pub prior_default: PriorDefault,
}

impl BorrowerRecord {
    pub fn validate(input: &BorrowerInput) -> Result<Self, ValidationError> {
        Ok(Self {
            age: int_in_range("person_age", input.person_age, 18, 100)?,
            annual_income: positive("person_income", input.person_income)?,
            employment_experience: int_in_range("person_emp_exp", input.person_emp_exp, 0, 50)?,
            home_ownership: HomeOwnership::parse(&input.person_home_ownership)?,
            loan_amount: positive("loan_amnt", input.loan_amnt)?,
            loan_interest_rate: float_in_range("loan_int_rate", input.loan_int_rate, 0.0, 30.0)?,
            loan_intent: LoanIntent::parse(&input.loan_intent)?,
            credit_score: int_in_range("credit_score", input.credit_score, 300, 900)?,
            credit_history_length: int_in_range(
                "cb_person_cred_hist_length",
                input.cb_person_cred_hist_length,
                0,
                50,
            )?,
            prior_default: PriorDefault::parse(&input.previous_loan_defaults_on_file)?,
        })
    }
}

impl TryFrom<&BorrowerInput> for BorrowerRecord {
    type Error = ValidationError;

    fn try_from(input: &BorrowerInput) -> Result<Self, Self::Error> {
        Self::validate(input)
    }
}

fn int_in_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<u32, ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            min: min as f64,
            max: max as f64,
            value: value as f64,
        });
    }
    // bounds above keep the value well inside u32
    Ok(value as u32)
}

fn float_in_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
    Ok(value)
}

fn positive(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    if value <= 0.0 {
        return Err(ValidationError::NotPositive { field, value });
    }
    Ok(value)
}

#[cfg(test)]
pub(crate) fn sample_input() -> BorrowerInput {
    BorrowerInput {
        person_age: 32,
        person_income: 60000.0,
        person_emp_exp: 8,
        person_home_ownership: "RENT".to_string(),
        loan_amnt: 15000.0,
        loan_int_rate: 11.5,
        loan_intent: "EDUCATION".to_string(),
        credit_score: 750,
        cb_person_cred_hist_length: 9,
        previous_loan_defaults_on_file: "No".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_normalizes_categories() {
        let mut input = sample_input();
        input.person_home_ownership = "rent".to_string();
        input.loan_intent = "homeImprovement".to_string();
        input.previous_loan_defaults_on_file = "YES".to_string();

        let record = BorrowerRecord::validate(&input).unwrap();
        assert_eq!(record.home_ownership, HomeOwnership::Rent);
        assert_eq!(record.loan_intent, LoanIntent::HomeImprovement);
        assert_eq!(record.prior_default, PriorDefault::Yes);
        assert_eq!(record.prior_default.to_string(), "Yes");
    }

    #[test]
    fn test_lowercase_matches_uppercase() {
        let upper = BorrowerRecord::validate(&sample_input()).unwrap();
        let mut input = sample_input();
        input.person_home_ownership = "rent".to_string();
        let lower = BorrowerRecord::validate(&input).unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_unknown_loan_intent_rejected() {
        let mut input = sample_input();
        input.loan_intent = "VACATION".to_string();

        let err = BorrowerRecord::validate(&input).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::UnknownCategory {
                field: "loan_intent",
                ..
            }
        ));
    }

    #[test]
    fn test_numeric_bounds() {
        let mut input = sample_input();
        input.person_age = 17;
        assert!(BorrowerRecord::validate(&input).is_err());

        let mut input = sample_input();
        input.person_income = 0.0;
        assert!(matches!(
            BorrowerRecord::validate(&input),
            Err(ValidationError::NotPositive { .. })
        ));

        let mut input = sample_input();
        input.loan_int_rate = 30.5;
        assert!(BorrowerRecord::validate(&input).is_err());

        let mut input = sample_input();
        input.credit_score = 901;
        assert!(BorrowerRecord::validate(&input).is_err());

        let mut input = sample_input();
        input.loan_amnt = f64::NAN;
        assert!(matches!(
            BorrowerRecord::validate(&input),
            Err(ValidationError::NotFinite { .. })
        ));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let mut input = sample_input();
        input.person_age = 100;
        input.loan_int_rate = 0.0;
        input.credit_score = 300;
        input.cb_person_cred_hist_length = 50;
        assert!(BorrowerRecord::validate(&input).is_ok());
    }

    #[test]
    fn test_input_accepts_readable_aliases() {
        let json = r#"{
            "age": 40, "annual_income": 85000, "employment_experience": 12,
            "home_ownership": "mortgage", "loan_amount": 20000,
            "loan_interest_rate": 9.25, "loan_intent": "personal",
            "credit_score": 690, "credit_history_length": 14, "prior_default": "no"
        }"#;

        let input: BorrowerInput = serde_json::from_str(json).unwrap();
        let record = BorrowerRecord::validate(&input).unwrap();
        assert_eq!(record.home_ownership, HomeOwnership::Mortgage);
        assert_eq!(record.annual_income, 85000.0);
    }

    #[test]
    fn test_integer_fields_accept_whole_floats() {
        let mut json = serde_json::to_value(sample_input()).unwrap();
        json["credit_score"] = serde_json::json!(750.0);
        json["person_age"] = serde_json::json!(32.0);

        let input: BorrowerInput = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(input.credit_score, 750);
        assert_eq!(input.person_age, 32);

        json["credit_score"] = serde_json::json!(750.5);
        let err = serde_json::from_value::<BorrowerInput>(json).unwrap_err();
        assert!(err.to_string().contains("whole number"));
    }
}
