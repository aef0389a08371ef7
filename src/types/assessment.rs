//! Risk assessment data structures

use crate::error::RiskError;
use crate::recommendation::Recommendation;
use crate::types::borrower::{BorrowerRecord, HomeOwnership, LoanIntent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk tier classification. The three tiers partition [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Medium Risk")]
    Medium,
    #[serde(rename = "High Risk")]
    High,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [RiskTier::Low, RiskTier::Medium, RiskTier::High];

    /// Determine the tier for a probability. A probability equal to a
    /// threshold belongs to the higher tier.
    pub fn from_probability(probability: f64, thresholds: &ThresholdConfig) -> Self {
        if probability < thresholds.low {
            RiskTier::Low
        } else if probability < thresholds.high {
            RiskTier::Medium
        } else {
            RiskTier::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low Risk",
            RiskTier::Medium => "Medium Risk",
            RiskTier::High => "High Risk",
        }
    }

    /// Interval of this tier rendered for display
    pub fn threshold_range(&self, thresholds: &ThresholdConfig) -> String {
        match self {
            RiskTier::Low => format!("0.0 - {}", thresholds.low),
            RiskTier::Medium => format!("{} - {}", thresholds.low, thresholds.high),
            RiskTier::High => format!("{} - 1.0", thresholds.high),
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tier boundaries, loaded once from the trained artifacts.
///
/// Invariant: `0 < low < high < 1`, enforced on every construction path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ThresholdFile")]
pub struct ThresholdConfig {
    #[serde(rename = "low_threshold")]
    low: f64,
    #[serde(rename = "high_threshold")]
    high: f64,
}

#[derive(Deserialize)]
struct ThresholdFile {
    low_threshold: f64,
    high_threshold: f64,
}

impl TryFrom<ThresholdFile> for ThresholdConfig {
    type Error = anyhow::Error;

    fn try_from(file: ThresholdFile) -> Result<Self, Self::Error> {
        Self::new(file.low_threshold, file.high_threshold)
    }
}

impl ThresholdConfig {
    pub fn new(low: f64, high: f64) -> anyhow::Result<Self> {
        if !(low > 0.0 && low < 1.0) || !(high > 0.0 && high < 1.0) {
            anyhow::bail!("thresholds must lie in (0, 1): low={}, high={}", low, high);
        }
        if low >= high {
            anyhow::bail!("low threshold {} must be below high threshold {}", low, high);
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }
}

/// Key borrower figures echoed back with an assessment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BorrowerSummary {
    pub age: u32,
    pub annual_income: f64,
    pub loan_amount: f64,
    pub credit_score: u32,
    pub employment_experience: u32,
    pub credit_history_length: u32,
    /// Loan amount as a percentage of annual income
    pub loan_to_income_ratio: f64,
    pub home_ownership: HomeOwnership,
    pub loan_intent: LoanIntent,
}

impl From<&BorrowerRecord> for BorrowerSummary {
    fn from(record: &BorrowerRecord) -> Self {
        Self {
            age: record.age,
            annual_income: record.annual_income,
            loan_amount: record.loan_amount,
            credit_score: record.credit_score,
            employment_experience: record.employment_experience,
            credit_history_length: record.credit_history_length,
            loan_to_income_ratio: round_to(record.loan_amount / record.annual_income * 100.0, 2),
            home_ownership: record.home_ownership,
            loan_intent: record.loan_intent,
        }
    }
}

/// Outcome of scoring one borrower. Deterministic for a given record and
/// set of artifacts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    /// Default probability rounded to 4 decimals
    pub default_probability: f64,
    pub risk_level: RiskTier,
    pub threshold_range: String,
    pub recommendation: Recommendation,
    pub borrower_summary: BorrowerSummary,
}

/// Error category exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    Failure,
}

/// Per-borrower result as sent over the wire
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AssessmentOutcome {
    Ok { assessment: RiskAssessment },
    Error { kind: ErrorKind, message: String },
}

impl AssessmentOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, AssessmentOutcome::Ok { .. })
    }
}

impl From<Result<RiskAssessment, RiskError>> for AssessmentOutcome {
    fn from(result: Result<RiskAssessment, RiskError>) -> Self {
        match result {
            Ok(assessment) => AssessmentOutcome::Ok { assessment },
            Err(e) => AssessmentOutcome::Error {
                kind: if e.is_validation() {
                    ErrorKind::Validation
                } else {
                    ErrorKind::Failure
                },
                message: e.public_message(),
            },
        }
    }
}

/// Response for a single-borrower request
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentEnvelope {
    pub assessment_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: AssessmentOutcome,
}

impl AssessmentEnvelope {
    pub fn new(outcome: AssessmentOutcome) -> Self {
        Self {
            assessment_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            outcome,
        }
    }
}

/// Response for a batch request; `results` follows input order
#[derive(Debug, Clone, Serialize)]
pub struct BatchEnvelope {
    pub batch_id: String,
    pub timestamp: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<AssessmentOutcome>,
}

impl BatchEnvelope {
    pub fn new(results: Vec<AssessmentOutcome>) -> Self {
        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        Self {
            batch_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn thresholds() -> ThresholdConfig {
        ThresholdConfig::new(0.3, 0.7).unwrap()
    }

    #[test]
    fn test_tier_boundaries() {
        let t = thresholds();

        assert_eq!(RiskTier::from_probability(0.0, &t), RiskTier::Low);
        assert_eq!(RiskTier::from_probability(0.2999, &t), RiskTier::Low);
        assert_eq!(RiskTier::from_probability(0.3, &t), RiskTier::Medium);
        assert_eq!(RiskTier::from_probability(0.6999, &t), RiskTier::Medium);
        assert_eq!(RiskTier::from_probability(0.7, &t), RiskTier::High);
        assert_eq!(RiskTier::from_probability(1.0, &t), RiskTier::High);
    }

    #[test]
    fn test_tiers_partition_unit_interval() {
        let t = thresholds();
        let mut previous = RiskTier::Low;

        // tiers must be monotonic in probability with no gaps
        for i in 0..=10_000 {
            let p = i as f64 / 10_000.0;
            let tier = RiskTier::from_probability(p, &t);
            let expected = if p < 0.3 {
                RiskTier::Low
            } else if p < 0.7 {
                RiskTier::Medium
            } else {
                RiskTier::High
            };
            assert_eq!(tier, expected, "p = {}", p);
            assert!(tier as u8 >= previous as u8);
            previous = tier;
        }
    }

    #[test]
    fn test_threshold_range_text() {
        let t = thresholds();
        assert_eq!(RiskTier::Low.threshold_range(&t), "0.0 - 0.3");
        assert_eq!(RiskTier::Medium.threshold_range(&t), "0.3 - 0.7");
        assert_eq!(RiskTier::High.threshold_range(&t), "0.7 - 1.0");
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        assert!(ThresholdConfig::new(0.7, 0.3).is_err());
        assert!(ThresholdConfig::new(0.5, 0.5).is_err());
        assert!(ThresholdConfig::new(0.0, 0.5).is_err());
        assert!(ThresholdConfig::new(0.2, 1.0).is_err());
        assert!(ThresholdConfig::new(f64::NAN, 0.5).is_err());
    }

    #[test]
    fn test_thresholds_deserialize_and_validate() {
        let t: ThresholdConfig =
            serde_json::from_str(r#"{"low_threshold": 0.25, "high_threshold": 0.6}"#).unwrap();
        assert_eq!(t.low(), 0.25);
        assert_eq!(t.high(), 0.6);

        let bad = serde_json::from_str::<ThresholdConfig>(
            r#"{"low_threshold": 0.8, "high_threshold": 0.6}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_tier_serialization() {
        let json = serde_json::to_string(&RiskTier::Medium).unwrap();
        assert_eq!(json, "\"Medium Risk\"");
    }

    #[test]
    fn test_error_outcome_hides_internals() {
        let outcome: AssessmentOutcome =
            Err(RiskError::Inference("session poisoned".to_string())).into();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["kind"], "failure");
        assert!(!json["message"].as_str().unwrap().contains("poisoned"));

        let outcome: AssessmentOutcome = Err(RiskError::Validation(ValidationError::NotFinite {
            field: "loan_amnt",
        }))
        .into();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["kind"], "validation");
    }

    #[test]
    fn test_batch_envelope_counts() {
        let results = vec![
            AssessmentOutcome::Error {
                kind: ErrorKind::Validation,
                message: "bad".to_string(),
            },
            AssessmentOutcome::Error {
                kind: ErrorKind::Failure,
                message: "bad".to_string(),
            },
        ];
        let batch = BatchEnvelope::new(results);
        assert_eq!(batch.total, 2);
        assert_eq!(batch.succeeded, 0);
        assert_eq!(batch.failed, 2);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(25.0, 2), 25.0);
    }
}
