//! Inference-time feature engineering.
//!
//! Stages run in a fixed order: derive ratios, one-hot encode categoricals,
//! scale numerics, then reconcile into the trained column order.

pub mod derive;
pub mod encoder;
pub mod scaler;
pub mod schema;

pub use derive::{derive, DerivedFeatures, ExtendedRecord};
pub use encoder::CategoricalEncoder;
pub use scaler::FittedScaler;
pub use schema::{FeatureSchema, FeatureVector};

pub const PERSON_AGE: &str = "person_age";
pub const PERSON_INCOME: &str = "person_income";
pub const PERSON_EMP_EXP: &str = "person_emp_exp";
pub const LOAN_AMNT: &str = "loan_amnt";
pub const LOAN_INT_RATE: &str = "loan_int_rate";
pub const LOAN_PERCENT_INCOME: &str = "loan_percent_income";
pub const CRED_HIST_LENGTH: &str = "cb_person_cred_hist_length";
pub const CREDIT_SCORE: &str = "credit_score";
pub const LTI_RATIO: &str = "LTI_Ratio";
pub const CREDIT_STABILITY_INDEX: &str = "Credit_Stability_Index";

pub const NUMERIC_FEATURE_COUNT: usize = 10;

/// Numeric columns in the order the scaler was fitted on.
pub const NUMERIC_FEATURES: [&str; NUMERIC_FEATURE_COUNT] = [
    PERSON_AGE,
    PERSON_INCOME,
    PERSON_EMP_EXP,
    LOAN_AMNT,
    LOAN_INT_RATE,
    LOAN_PERCENT_INCOME,
    CRED_HIST_LENGTH,
    CREDIT_SCORE,
    LTI_RATIO,
    CREDIT_STABILITY_INDEX,
];
