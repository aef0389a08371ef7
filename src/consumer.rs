//! NATS consumer for incoming assessment requests

use crate::error::ValidationError;
use crate::types::borrower::BorrowerInput;
use anyhow::Result;
use async_nats::{Client, Subscriber};
use serde_json::Value;
use tracing::info;

/// A decoded request payload: one borrower or an ordered batch.
///
/// Batch items are decoded one at a time, so a malformed item only fails
/// its own slot.
#[derive(Debug, Clone)]
pub enum AssessmentRequest {
    Single(BorrowerInput),
    Batch(Vec<Result<BorrowerInput, ValidationError>>),
}

impl AssessmentRequest {
    pub fn decode(payload: &[u8]) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_slice(payload)
            .map_err(|e| ValidationError::Malformed(format!("invalid JSON: {}", e)))?;

        match value {
            Value::Array(items) => Ok(AssessmentRequest::Batch(
                items.into_iter().map(decode_borrower).collect(),
            )),
            Value::Object(_) => decode_borrower(value).map(AssessmentRequest::Single),
            _ => Err(ValidationError::Malformed(
                "expected a borrower object or an array of borrower objects".to_string(),
            )),
        }
    }
}

fn decode_borrower(value: Value) -> Result<BorrowerInput, ValidationError> {
    serde_json::from_value(value).map_err(|e| ValidationError::Malformed(e.to_string()))
}

/// Consumer for receiving assessment requests from NATS
pub struct RequestConsumer {
    client: Client,
    subject: String,
}

impl RequestConsumer {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Subscribe to the request subject
    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = self.client.subscribe(self.subject.clone()).await?;
        info!(subject = %self.subject, "Subscribed to request subject");
        Ok(subscriber)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}
