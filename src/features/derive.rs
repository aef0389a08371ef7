//! Derived borrower ratios.

use super::NUMERIC_FEATURE_COUNT;
use crate::types::borrower::BorrowerRecord;

/// Ratios computed from raw borrower fields
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedFeatures {
    pub loan_to_income_ratio: f64,
    /// Same value as `loan_to_income_ratio`; the trained schema carries both.
    pub loan_percent_income: f64,
    pub credit_stability_index: f64,
}

/// A borrower record together with its derived ratios
#[derive(Debug, Clone, Copy)]
pub struct ExtendedRecord<'a> {
    pub record: &'a BorrowerRecord,
    pub derived: DerivedFeatures,
}

/// Income is strictly positive for every validated record, so the
/// divisions cannot fail.
pub fn derive(record: &BorrowerRecord) -> ExtendedRecord<'_> {
    let lti = record.loan_amount / record.annual_income;

    ExtendedRecord {
        record,
        derived: DerivedFeatures {
            loan_to_income_ratio: lti,
            loan_percent_income: lti,
            credit_stability_index: f64::from(record.credit_score)
                / (f64::from(record.credit_history_length) + 1.0),
        },
    }
}

impl ExtendedRecord<'_> {
    /// Raw numeric values in `NUMERIC_FEATURES` order.
    pub fn numeric_columns(&self) -> [f64; NUMERIC_FEATURE_COUNT] {
        let r = self.record;
        [
            f64::from(r.age),
            r.annual_income,
            f64::from(r.employment_experience),
            r.loan_amount,
            r.loan_interest_rate,
            self.derived.loan_percent_income,
            f64::from(r.credit_history_length),
            f64::from(r.credit_score),
            self.derived.loan_to_income_ratio,
            self.derived.credit_stability_index,
        ]
    }
}
