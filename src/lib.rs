//! CreditPath Risk Library
//!
//! Loan default probability scoring with tiered collection
//! recommendations, served from pre-trained model artifacts.

pub mod config;
pub mod consumer;
pub mod engine;
pub mod error;
pub mod feature_extractor;
pub mod features;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod recommendation;
pub mod service;
pub mod types;

pub use crate::config::AppConfig;
pub use engine::RiskEngine;
pub use error::{RiskError, ValidationError};
pub use feature_extractor::FeatureExtractor;
pub use models::{ArtifactLoader, Classifier, TrainedArtifacts};
pub use recommendation::Recommendation;
pub use types::{BorrowerInput, BorrowerRecord, RiskAssessment, RiskTier, ThresholdConfig};
