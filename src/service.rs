//! Request handling shared by the service binary.
//!
//! This is the only place a `RiskError` is turned into something a caller
//! sees: validation detail is passed through, everything else becomes a
//! generic failure while the detail stays in the logs.

use crate::consumer::AssessmentRequest;
use crate::engine::RiskEngine;
use crate::error::{RiskError, ValidationError};
use crate::metrics::AssessmentMetrics;
use crate::types::assessment::{AssessmentEnvelope, AssessmentOutcome, BatchEnvelope, RiskAssessment};
use crate::types::borrower::{BorrowerInput, BorrowerRecord};
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{error, info};

/// Wire response for one request message
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AssessmentResponse {
    Single(AssessmentEnvelope),
    Batch(BatchEnvelope),
}

/// Decode, score and wrap one request payload.
pub fn handle_payload(
    engine: &RiskEngine,
    metrics: &AssessmentMetrics,
    payload: &[u8],
) -> AssessmentResponse {
    match AssessmentRequest::decode(payload) {
        Ok(AssessmentRequest::Single(input)) => {
            let start = Instant::now();
            let result = engine.assess(&input);
            let outcome = record(metrics, start.elapsed(), result);
            AssessmentResponse::Single(AssessmentEnvelope::new(outcome))
        }
        Ok(AssessmentRequest::Batch(items)) => {
            info!(count = items.len(), "Received batch prediction request");
            let batch = BatchEnvelope::new(score_batch(engine, metrics, items));
            info!(
                batch_id = %batch.batch_id,
                total = batch.total,
                failed = batch.failed,
                "Batch prediction completed"
            );
            AssessmentResponse::Batch(batch)
        }
        Err(e) => {
            let outcome = record(metrics, Duration::ZERO, Err(RiskError::from(e)));
            AssessmentResponse::Single(AssessmentEnvelope::new(outcome))
        }
    }
}

/// Validate every item, score the valid ones together, then put each
/// result back in its input position.
fn score_batch(
    engine: &RiskEngine,
    metrics: &AssessmentMetrics,
    items: Vec<Result<BorrowerInput, ValidationError>>,
) -> Vec<AssessmentOutcome> {
    let start = Instant::now();
    let total = items.len();

    let mut records = Vec::with_capacity(total);
    let mut rejected: Vec<Option<RiskError>> = Vec::with_capacity(total);
    for item in items {
        match item.and_then(|input| BorrowerRecord::validate(&input)) {
            Ok(valid) => {
                records.push(valid);
                rejected.push(None);
            }
            Err(e) => rejected.push(Some(e.into())),
        }
    }

    let mut scored = engine.compute_risk_batch(&records).into_iter();
    let per_item = start.elapsed() / total.max(1) as u32;

    rejected
        .into_iter()
        .map(|rejection| {
            let result = match rejection {
                Some(e) => Err(e),
                None => scored.next().unwrap_or_else(|| {
                    Err(RiskError::Inference("batch result missing".to_string()))
                }),
            };
            record(metrics, per_item, result)
        })
        .collect()
}

fn record(
    metrics: &AssessmentMetrics,
    elapsed: Duration,
    result: Result<RiskAssessment, RiskError>,
) -> AssessmentOutcome {
    match &result {
        Ok(assessment) => {
            metrics.record_assessment(elapsed, assessment.default_probability, assessment.risk_level)
        }
        Err(e) => {
            if !e.is_validation() {
                error!(kind = e.kind(), error = %e, "Prediction error");
            }
            metrics.record_failure(elapsed, e);
        }
    }

    result.into()
}

/// Wait for every spawned request handler to finish. Returns how many
/// panicked or were cancelled.
pub async fn drain(handlers: &mut JoinSet<()>) -> usize {
    let mut failed = 0;
    while let Some(result) = handlers.join_next().await {
        if let Err(e) = result {
            error!(error = %e, "Request handler task failed");
            failed += 1;
        }
    }
    failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GENERIC_FAILURE_MESSAGE;
    use crate::feature_extractor::tests::{trained_columns, unit_scaler};
    use crate::models::{Classifier, TrainedArtifacts};
    use crate::types::assessment::{RiskTier, ThresholdConfig};
    use crate::types::borrower::sample_input;

    struct FixedClassifier(f64);

    impl Classifier for FixedClassifier {
        fn name(&self) -> &str {
            "fixed"
        }

        fn predict_proba(&self, _features: &[f32]) -> Result<f64, RiskError> {
            crate::models::inference::check_probability("fixed", self.0)
        }
    }

    fn engine(probability: f64) -> RiskEngine {
        RiskEngine::new(TrainedArtifacts {
            classifier: Box::new(FixedClassifier(probability)),
            scaler: unit_scaler(),
            feature_columns: trained_columns(),
            thresholds: ThresholdConfig::new(0.3, 0.7).unwrap(),
        })
        .unwrap()
    }

    #[test]
    fn test_single_request() {
        let metrics = AssessmentMetrics::new();
        let payload = serde_json::to_vec(&sample_input()).unwrap();

        let response = handle_payload(&engine(0.3), &metrics, &payload);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "ok");
        assert_eq!(json["assessment"]["risk_level"], "Medium Risk");
        assert_eq!(json["assessment"]["default_probability"], 0.3);
        assert!(json["assessment_id"].is_string());
        assert_eq!(metrics.tier_count(RiskTier::Medium), 1);
    }

    #[test]
    fn test_batch_request_isolates_failures() {
        let metrics = AssessmentMetrics::new();
        let mut bad = sample_input();
        bad.person_home_ownership = "CASTLE".to_string();
        let payload = serde_json::to_vec(&vec![sample_input(), bad]).unwrap();

        let response = handle_payload(&engine(0.8), &metrics, &payload);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["total"], 2);
        assert_eq!(json["succeeded"], 1);
        assert_eq!(json["results"][0]["assessment"]["risk_level"], "High Risk");
        assert_eq!(json["results"][1]["kind"], "validation");
        assert!(json["results"][1]["message"]
            .as_str()
            .unwrap()
            .contains("person_home_ownership"));
    }

    #[test]
    fn test_undecodable_batch_item_fails_alone() {
        let metrics = AssessmentMetrics::new();
        let mut bad = serde_json::to_value(sample_input()).unwrap();
        bad["person_income"] = serde_json::json!("lots");
        let good = serde_json::to_value(sample_input()).unwrap();
        let payload = serde_json::to_vec(&serde_json::json!([good, bad, good])).unwrap();

        let response = handle_payload(&engine(0.1), &metrics, &payload);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["total"], 3);
        assert_eq!(json["failed"], 1);
        assert_eq!(json["results"][0]["status"], "ok");
        assert_eq!(json["results"][2]["status"], "ok");
        assert_eq!(json["results"][1]["status"], "error");
        assert_eq!(json["results"][1]["kind"], "validation");
        assert!(json["results"][1]["message"].as_str().unwrap().contains("lots"));
        assert_eq!(metrics.tier_count(RiskTier::Low), 2);
        assert_eq!(metrics.failure_count(), 1);
    }

    #[test]
    fn test_batch_matches_single_requests() {
        let mut risky = sample_input();
        risky.previous_loan_defaults_on_file = "Yes".to_string();
        let inputs = vec![sample_input(), risky];
        let engine = engine(0.5);

        let payload = serde_json::to_vec(&inputs).unwrap();
        let json = serde_json::to_value(handle_payload(&engine, &AssessmentMetrics::new(), &payload)).unwrap();

        for (i, input) in inputs.iter().enumerate() {
            let expected = serde_json::to_value(engine.assess(input).unwrap()).unwrap();
            assert_eq!(json["results"][i]["assessment"], expected);
        }
    }

    #[test]
    fn test_invalid_probability_reported_generically() {
        let metrics = AssessmentMetrics::new();
        let payload = serde_json::to_vec(&sample_input()).unwrap();

        let response = handle_payload(&engine(f64::NAN), &metrics, &payload);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "error");
        assert_eq!(json["kind"], "failure");
        assert_eq!(json["message"], GENERIC_FAILURE_MESSAGE);
        assert_eq!(metrics.failure_count(), 1);
    }

    #[tokio::test]
    async fn test_drain_waits_for_in_flight_handlers() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let replied = Arc::new(AtomicUsize::new(0));
        let mut handlers = JoinSet::new();
        for _ in 0..3 {
            let replied = replied.clone();
            handlers.spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                replied.fetch_add(1, Ordering::SeqCst);
            });
        }
        handlers.spawn(async { panic!("handler crashed") });

        assert_eq!(drain(&mut handlers).await, 1);
        assert_eq!(replied.load(Ordering::SeqCst), 3);
        assert!(handlers.is_empty());
    }

    #[test]
    fn test_malformed_payload() {
        let metrics = AssessmentMetrics::new();
        let response = handle_payload(&engine(0.1), &metrics, b"not json");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "error");
        assert_eq!(json["kind"], "validation");
    }
}
