//! Error types for the risk scoring core.
//!
//! The core never panics on bad input and never substitutes a default
//! probability. Every failure is one of three kinds and the service boundary
//! is the only place these get translated into a response.

use thiserror::Error;

/// Message returned to callers for any non-validation failure.
pub const GENERIC_FAILURE_MESSAGE: &str = "Prediction failed. Please try again later.";

/// Reasons a raw borrower payload is rejected before entering the pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("{field} must be greater than 0, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must be one of: {allowed}, got '{value}'")]
    UnknownCategory {
        field: &'static str,
        allowed: String,
        value: String,
    },

    #[error("malformed request payload: {0}")]
    Malformed(String),
}

/// Result type for every fallible core operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Computed features disagree with the trained artifacts.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("inference error: {0}")]
    Inference(String),
}

impl RiskError {
    /// Short label used in logs and responses.
    pub fn kind(&self) -> &'static str {
        match self {
            RiskError::Validation(_) => "validation",
            RiskError::SchemaMismatch(_) => "schema_mismatch",
            RiskError::Inference(_) => "inference",
        }
    }

    /// Text safe to return to a caller. Only validation detail is exposed.
    pub fn public_message(&self) -> String {
        match self {
            RiskError::Validation(e) => e.to_string(),
            RiskError::SchemaMismatch(_) | RiskError::Inference(_) => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, RiskError::Validation(_))
    }
}
