//! Risk scoring engine.
//!
//! `RiskEngine` owns the trained artifacts for the life of the process and
//! is shared read-only between requests. Scoring a record touches no
//! mutable state, so identical records always produce identical results.

use crate::error::RiskError;
use crate::feature_extractor::FeatureExtractor;
use crate::features::{FeatureSchema, NUMERIC_FEATURE_COUNT};
use crate::models::{Classifier, TrainedArtifacts};
use crate::recommendation::Recommendation;
use crate::types::assessment::{round_to, BorrowerSummary, RiskAssessment, RiskTier, ThresholdConfig};
use crate::types::borrower::{BorrowerInput, BorrowerRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// Descriptive model and policy information
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub model_name: String,
    pub features_count: usize,
    pub numeric_features_count: usize,
    pub thresholds: TierRanges,
}

#[derive(Debug, Clone, Serialize)]
pub struct TierRanges {
    pub low_risk: String,
    pub medium_risk: String,
    pub high_risk: String,
}

/// Liveness report answered on the health subject
#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub model_loaded: bool,
    pub scaler_loaded: bool,
    pub model_name: String,
    pub features: usize,
    pub timestamp: DateTime<Utc>,
}

pub struct RiskEngine {
    extractor: FeatureExtractor,
    classifier: Box<dyn Classifier>,
    thresholds: ThresholdConfig,
}

impl RiskEngine {
    /// Bind the artifacts together, verifying they agree with each other.
    pub fn new(artifacts: TrainedArtifacts) -> Result<Self, RiskError> {
        let schema = FeatureSchema::new(artifacts.feature_columns)?;
        let extractor = FeatureExtractor::new(schema, artifacts.scaler)
            .inspect_err(|e| error!(error = %e, "Trained artifacts disagree with feature pipeline"))?;

        info!(
            model = %artifacts.classifier.name(),
            features = extractor.feature_count(),
            low = artifacts.thresholds.low(),
            high = artifacts.thresholds.high(),
            "Risk engine initialized"
        );

        Ok(Self {
            extractor,
            classifier: artifacts.classifier,
            thresholds: artifacts.thresholds,
        })
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    /// Default probability for a record, unrounded.
    pub fn predict_probability(&self, record: &BorrowerRecord) -> Result<f64, RiskError> {
        let features = self.extractor.extract(record)?;
        debug!(features = ?features.values(), "Feature vector built");

        self.classifier
            .predict_proba(features.values())
            .inspect_err(|e| match e {
                RiskError::SchemaMismatch(_) => error!(error = %e, "Feature schema mismatch"),
                _ => warn!(error = %e, model = %self.classifier.name(), "Inference failed"),
            })
    }

    /// Score one validated record.
    pub fn compute_risk(&self, record: &BorrowerRecord) -> Result<RiskAssessment, RiskError> {
        let probability = self.predict_probability(record)?;
        let tier = RiskTier::from_probability(probability, &self.thresholds);

        info!(
            probability = format!("{:.4}", probability),
            risk_level = %tier,
            "Prediction completed"
        );

        Ok(RiskAssessment {
            default_probability: round_to(probability, 4),
            risk_level: tier,
            threshold_range: tier.threshold_range(&self.thresholds),
            recommendation: *Recommendation::for_tier(tier),
            borrower_summary: BorrowerSummary::from(record),
        })
    }

    /// Validate a raw payload, then score it.
    pub fn assess(&self, input: &BorrowerInput) -> Result<RiskAssessment, RiskError> {
        let record = BorrowerRecord::validate(input)?;
        self.compute_risk(&record)
    }

    /// Score each record independently. One result per record, in order;
    /// a failing record does not affect its neighbours.
    pub fn compute_risk_batch(
        &self,
        records: &[BorrowerRecord],
    ) -> Vec<Result<RiskAssessment, RiskError>> {
        records.iter().map(|r| self.compute_risk(r)).collect()
    }

    /// An engine only exists once every artifact has loaded, so a live
    /// engine always reports itself healthy.
    pub fn health(&self) -> Health {
        Health {
            status: "healthy",
            model_loaded: true,
            scaler_loaded: true,
            model_name: self.classifier.name().to_string(),
            features: self.extractor.feature_count(),
            timestamp: Utc::now(),
        }
    }

    pub fn model_info(&self) -> ModelInfo {
        let t = &self.thresholds;
        ModelInfo {
            model_name: self.classifier.name().to_string(),
            features_count: self.extractor.feature_count(),
            numeric_features_count: NUMERIC_FEATURE_COUNT,
            thresholds: TierRanges {
                low_risk: format!("< {}", t.low()),
                medium_risk: format!("{} - {}", t.low(), t.high()),
                high_risk: format!(">= {}", t.high()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::feature_extractor::tests::{trained_columns, unit_scaler};
    use crate::types::borrower::sample_input;

    /// Deterministic stand-in for the ONNX model: probability rises with
    /// the prior-default flag and the loan-to-income ratio.
    struct StubClassifier {
        expected_len: usize,
        prior_slot: usize,
        lti_slot: usize,
    }

    impl Classifier for StubClassifier {
        fn name(&self) -> &str {
            "stub"
        }

        fn predict_proba(&self, features: &[f32]) -> Result<f64, RiskError> {
            if features.len() != self.expected_len {
                return Err(RiskError::Inference("shape mismatch".to_string()));
            }
            let p = 0.1 + 0.6 * features[self.prior_slot] as f64 + features[self.lti_slot] as f64;
            crate::models::inference::check_probability("stub", p)
        }
    }

    struct FailingClassifier;

    impl Classifier for FailingClassifier {
        fn name(&self) -> &str {
            "failing"
        }

        fn predict_proba(&self, _features: &[f32]) -> Result<f64, RiskError> {
            Err(RiskError::Inference("session corrupted".to_string()))
        }
    }

    fn artifacts(classifier: Box<dyn Classifier>) -> TrainedArtifacts {
        TrainedArtifacts {
            classifier,
            scaler: unit_scaler(),
            feature_columns: trained_columns(),
            thresholds: ThresholdConfig::new(0.3, 0.7).unwrap(),
        }
    }

    fn engine() -> RiskEngine {
        let columns = trained_columns();
        let slot = |name: &str| columns.iter().position(|c| c == name).unwrap();
        let stub = StubClassifier {
            expected_len: columns.len(),
            prior_slot: slot("previous_loan_defaults_on_file_Yes"),
            lti_slot: slot("LTI_Ratio"),
        };
        RiskEngine::new(artifacts(Box::new(stub))).unwrap()
    }

    fn record() -> BorrowerRecord {
        BorrowerRecord::validate(&sample_input()).unwrap()
    }

    #[test]
    fn test_compute_risk_low_tier() {
        // 0.1 + 0.25 lti = 0.35 -> Medium; shrink the loan for Low
        let mut record = record();
        record.loan_amount = 6000.0;

        let assessment = engine().compute_risk(&record).unwrap();
        assert_eq!(assessment.default_probability, 0.2);
        assert_eq!(assessment.risk_level, RiskTier::Low);
        assert_eq!(assessment.threshold_range, "0.0 - 0.3");
        assert_eq!(assessment.recommendation.priority, "Normal");
        assert_eq!(assessment.borrower_summary.loan_to_income_ratio, 10.0);
    }

    #[test]
    fn test_compute_risk_high_tier() {
        let mut record = record();
        record.prior_default = crate::types::borrower::PriorDefault::Yes;

        let assessment = engine().compute_risk(&record).unwrap();
        assert_eq!(assessment.default_probability, 0.95);
        assert_eq!(assessment.risk_level, RiskTier::High);
        assert_eq!(assessment.recommendation.timeline, "Within 24-48 hours");
    }

    #[test]
    fn test_compute_risk_is_idempotent() {
        let engine = engine();
        let record = record();
        assert_eq!(
            engine.compute_risk(&record).unwrap(),
            engine.compute_risk(&record).unwrap()
        );
    }

    #[test]
    fn test_lowercase_category_scores_identically() {
        let engine = engine();
        let mut lower = sample_input();
        lower.person_home_ownership = "rent".to_string();

        assert_eq!(
            engine.assess(&lower).unwrap(),
            engine.assess(&sample_input()).unwrap()
        );
    }

    #[test]
    fn test_unknown_intent_is_validation_error() {
        let mut input = sample_input();
        input.loan_intent = "GAMBLING".to_string();

        let err = engine().assess(&input).unwrap_err();
        assert!(matches!(
            err,
            RiskError::Validation(ValidationError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_batch_preserves_order_and_matches_single_calls() {
        let engine = engine();
        let mut r2 = record();
        r2.prior_default = crate::types::borrower::PriorDefault::Yes;
        let mut r3 = record();
        r3.loan_amount = 1200.0;
        let records = vec![record(), r2, r3];

        let batch = engine.compute_risk_batch(&records);
        assert_eq!(batch.len(), 3);
        for (result, record) in batch.iter().zip(&records) {
            assert_eq!(result.as_ref().unwrap(), &engine.compute_risk(record).unwrap());
        }
    }

    #[test]
    fn test_inference_failure_is_terminal() {
        let engine = RiskEngine::new(artifacts(Box::new(FailingClassifier))).unwrap();
        let err = engine.compute_risk(&record()).unwrap_err();
        assert!(matches!(err, RiskError::Inference(_)));
    }

    #[test]
    fn test_mismatched_artifacts_rejected() {
        let mut artifacts = artifacts(Box::new(FailingClassifier));
        artifacts.feature_columns.retain(|c| c != "person_income");

        assert!(matches!(
            RiskEngine::new(artifacts),
            Err(RiskError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_model_info() {
        let info = engine().model_info();
        assert_eq!(info.model_name, "stub");
        assert_eq!(info.features_count, trained_columns().len());
        assert_eq!(info.thresholds.medium_risk, "0.3 - 0.7");
        assert_eq!(info.thresholds.high_risk, ">= 0.7");
    }

    #[test]
    fn test_health() {
        let before = Utc::now();
        let health = engine().health();

        assert_eq!(health.status, "healthy");
        assert!(health.model_loaded && health.scaler_loaded);
        assert_eq!(health.model_name, "stub");
        assert_eq!(health.features, trained_columns().len());
        assert!(health.timestamp >= before);

        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["status"], "healthy");
        assert!(json["timestamp"].is_string());
    }
}
