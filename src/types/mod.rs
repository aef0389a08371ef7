//! Type definitions for the risk scoring pipeline

pub mod assessment;
pub mod borrower;

pub use assessment::{RiskAssessment, RiskTier, ThresholdConfig};
pub use borrower::{BorrowerInput, BorrowerRecord};
