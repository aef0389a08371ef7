//! Pre-fitted standard scaler.

use crate::error::RiskError;
use serde::Deserialize;

/// Per-column affine transform `(x - mean) / scale`, exported from the
/// training pipeline as JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FittedScaler {
    /// Column order the scaler was fitted on
    #[serde(alias = "feature_names_in_")]
    pub feature_names: Vec<String>,
    #[serde(alias = "mean_")]
    pub mean: Vec<f64>,
    #[serde(alias = "scale_")]
    pub scale: Vec<f64>,
}

impl FittedScaler {
    pub fn new(feature_names: Vec<String>, mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, RiskError> {
        let scaler = Self {
            feature_names,
            mean,
            scale,
        };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Check the fitted parameters are internally consistent.
    pub fn validate(&self) -> Result<(), RiskError> {
        let n = self.feature_names.len();
        if n == 0 || self.mean.len() != n || self.scale.len() != n {
            return Err(RiskError::SchemaMismatch(format!(
                "scaler has {} names, {} means and {} scales",
                n,
                self.mean.len(),
                self.scale.len()
            )));
        }

        if let Some(i) = self
            .mean
            .iter()
            .chain(self.scale.iter())
            .position(|v| !v.is_finite())
        {
            return Err(RiskError::SchemaMismatch(format!(
                "scaler parameter {} is not finite",
                i
            )));
        }

        Ok(())
    }

    /// Number of columns the scaler was fitted on
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Scale one row. The row must have exactly the fitted dimensionality.
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, RiskError> {
        if row.len() != self.n_features() {
            return Err(RiskError::SchemaMismatch(format!(
                "scaler fitted on {} columns, got {}",
                self.n_features(),
                row.len()
            )));
        }

        Ok(row
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(&x, (&mean, &scale))| {
                // zero variance columns are left unscaled, as at fit time
                let scale = if scale == 0.0 { 1.0 } else { scale };
                (x - mean) / scale
            })
            .collect())
    }
}
