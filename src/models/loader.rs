//! Trained artifact loader

use crate::config::ArtifactsConfig;
use crate::features::FittedScaler;
use crate::models::inference::{Classifier, OnnxClassifier};
use crate::types::assessment::ThresholdConfig;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::info;

/// Loaded ONNX model with metadata
pub struct LoadedModel {
    /// Model name
    pub name: String,
    /// ONNX Runtime session
    pub session: Session,
    /// Input name for the model
    pub input_name: String,
    /// Output name for probabilities
    pub output_name: String,
}

/// Everything produced by training that inference depends on.
/// Loaded once at startup and never modified.
pub struct TrainedArtifacts {
    pub classifier: Box<dyn Classifier>,
    pub scaler: FittedScaler,
    pub feature_columns: Vec<String>,
    pub thresholds: ThresholdConfig,
}

/// Loader for trained artifacts
pub struct ArtifactLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ArtifactLoader {
    /// Create a new artifact loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load every artifact. Any failure here must stop the process.
    pub fn load_all(&self, config: &ArtifactsConfig) -> Result<TrainedArtifacts> {
        let dir = Path::new(&config.dir);

        let model = self.load_model(dir.join(&config.model_file), &config.model_name)?;
        let scaler: FittedScaler = read_json(dir.join(&config.scaler_file))?;
        scaler
            .validate()
            .context("Scaler artifact is inconsistent")?;
        info!(columns = scaler.n_features(), "Scaler loaded");

        let feature_columns = parse_feature_columns(&fs::read_to_string(
            dir.join(&config.feature_columns_file),
        )
        .with_context(|| format!("Failed to read {}", config.feature_columns_file))?)?;
        info!(features = feature_columns.len(), "Feature columns loaded");

        let thresholds: ThresholdConfig = read_json(dir.join(&config.thresholds_file))?;
        info!(
            low = thresholds.low(),
            high = thresholds.high(),
            "Thresholds loaded"
        );

        Ok(TrainedArtifacts {
            classifier: Box::new(OnnxClassifier::new(model)),
            scaler,
            feature_columns,
            thresholds,
        })
    }

    /// Load a single ONNX model from file
    pub fn load_model<P: AsRef<Path>>(&self, path: P, name: &str) -> Result<LoadedModel> {
        let path = path.as_ref();

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .context("Model declares no inputs")?;

        // Prefer the probability output over the label output
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.iter().find(|o| !o.name.contains("label")))
            .map(|o| o.name.clone())
            .context("Model declares no probability output")?;

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            name: name.to_string(),
            session,
            input_name,
            output_name,
        })
    }
}

fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Parse the ordered feature-name list exported at training time.
pub fn parse_feature_columns(raw: &str) -> Result<Vec<String>> {
    let columns: Vec<String> =
        serde_json::from_str(raw).context("Feature columns must be a JSON array of strings")?;
    if columns.is_empty() {
        anyhow::bail!("Feature column list is empty");
    }
    Ok(columns)
}
