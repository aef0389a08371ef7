//! Feature extraction for loan default model inference.
//!
//! Turns a validated borrower record into the exact row the trained model
//! expects, matching the preprocessing used by the training pipeline.

use crate::error::RiskError;
use crate::features::{
    derive, CategoricalEncoder, FeatureSchema, FeatureVector, FittedScaler, NUMERIC_FEATURES,
    NUMERIC_FEATURE_COUNT,
};
use crate::types::borrower::BorrowerRecord;
use tracing::{error, info};

/// Feature extractor bound to one set of trained artifacts.
///
/// All column positions are resolved in [`FeatureExtractor::new`], so a
/// version skew between code and artifacts is caught at startup rather
/// than on the first request.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    schema: FeatureSchema,
    scaler: FittedScaler,
    encoder: CategoricalEncoder,
    /// Schema position of each entry of `NUMERIC_FEATURES`
    numeric_slots: [usize; NUMERIC_FEATURE_COUNT],
}

impl FeatureExtractor {
    pub fn new(schema: FeatureSchema, scaler: FittedScaler) -> Result<Self, RiskError> {
        scaler.validate()?;

        if scaler.feature_names != NUMERIC_FEATURES {
            return Err(RiskError::SchemaMismatch(format!(
                "scaler fitted on {:?}, expected {:?}",
                scaler.feature_names, NUMERIC_FEATURES
            )));
        }

        let mut numeric_slots = [0; NUMERIC_FEATURE_COUNT];
        for (slot, name) in numeric_slots.iter_mut().zip(NUMERIC_FEATURES) {
            *slot = schema.require(name)?;
        }

        let encoder = CategoricalEncoder::new(&schema);

        info!(
            features = schema.len(),
            numeric = NUMERIC_FEATURE_COUNT,
            indicators = encoder.mapped_count(),
            "Feature extractor initialized"
        );

        Ok(Self {
            schema,
            scaler,
            encoder,
            numeric_slots,
        })
    }

    /// Build the model input row for a record.
    pub fn extract(&self, record: &BorrowerRecord) -> Result<FeatureVector<'_>, RiskError> {
        let extended = derive(record);
        let scaled = self
            .scaler
            .transform(&extended.numeric_columns())
            .inspect_err(|e| error!(error = %e, "Scaling failed"))?;

        let mut vector = self.schema.zeroed();
        for (&slot, value) in self.numeric_slots.iter().zip(scaled) {
            vector.set(slot, value);
        }
        for slot in self.encoder.hot_slots(record) {
            vector.set(slot, 1.0);
        }

        Ok(vector)
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        self.schema.len()
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }
}
