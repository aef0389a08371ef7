//! Default-probability inference

use crate::error::RiskError;
use crate::models::loader::LoadedModel;
use ort::memory::Allocator;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, Tensor};
use std::sync::RwLock;
use tracing::debug;

/// A trained binary classifier producing the probability of default.
///
/// Implementations must be deterministic for a given row and safe to call
/// from many requests at once.
pub trait Classifier: Send + Sync {
    /// Model identifier for logs and model info
    fn name(&self) -> &str;

    /// Probability mass of the default class (index 1) for one row.
    fn predict_proba(&self, features: &[f32]) -> Result<f64, RiskError>;
}

/// Reject anything that is not a probability.
pub(crate) fn check_probability(model: &str, probability: f64) -> Result<f64, RiskError> {
    if probability.is_finite() && (0.0..=1.0).contains(&probability) {
        Ok(probability)
    } else {
        Err(RiskError::Inference(format!(
            "model {} returned invalid probability {}",
            model, probability
        )))
    }
}

/// Classifier backed by an ONNX Runtime session
pub struct OnnxClassifier {
    /// ONNX sessions need exclusive access to run
    model: RwLock<LoadedModel>,
    name: String,
}

impl OnnxClassifier {
    pub fn new(model: LoadedModel) -> Self {
        let name = model.name.clone();
        Self {
            model: RwLock::new(model),
            name,
        }
    }

    fn run(&self, features: &[f32]) -> Result<f64, RiskError> {
        if let Some(i) = features.iter().position(|v| !v.is_finite()) {
            return Err(RiskError::Inference(format!(
                "feature {} is not finite",
                i
            )));
        }

        let mut model = self
            .model
            .write()
            .map_err(|e| RiskError::Inference(format!("Lock error: {}", e)))?;

        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .map_err(|e| RiskError::Inference(format!("Failed to create input tensor: {}", e)))?;

        let input_name = model.input_name.clone();
        let output_name = model.output_name.clone();

        let outputs = model
            .session
            .run(ort::inputs![input_name.as_str() => input_tensor])
            .map_err(|e| RiskError::Inference(e.to_string()))?;

        extract_probability(&outputs, &output_name, &self.name)
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_proba(&self, features: &[f32]) -> Result<f64, RiskError> {
        let probability = self.run(features)?;
        check_probability(&self.name, probability)
    }
}

/// Extract the default-class probability from model output.
///
/// Handles plain tensor outputs and the seq(map) form produced by
/// gradient-boosting exporters with zipmap enabled.
fn extract_probability(
    outputs: &ort::session::SessionOutputs,
    output_name: &str,
    model_name: &str,
) -> Result<f64, RiskError> {
    if let Some(output) = outputs.get(output_name) {
        if let Some(prob) = try_extract(&output, model_name) {
            return Ok(prob);
        }
    }

    // Fall back to any non-label output
    for (name, output) in outputs.iter() {
        if name.contains("label") {
            continue;
        }
        if let Some(prob) = try_extract(&output, model_name) {
            debug!(model = %model_name, output = %name, "Extracted from fallback output");
            return Ok(prob);
        }
    }

    Err(RiskError::Inference(format!(
        "model {} produced no readable probability output",
        model_name
    )))
}

fn try_extract(output: &ort::value::DynValue, model_name: &str) -> Option<f64> {
    if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        let dims: Vec<i64> = shape.iter().copied().collect();
        let prob = default_class_from_tensor(&dims, data);
        debug!(model = %model_name, prob = ?prob, "Extracted from tensor");
        return prob;
    }

    let dtype = output.dtype();
    if DynSequenceValueType::can_downcast(&dtype) {
        return extract_from_sequence_map(output, model_name).ok();
    }

    None
}

/// Extract probability from seq(map(int64, float)) format
fn extract_from_sequence_map(output: &ort::value::DynValue, model_name: &str) -> Result<f64, RiskError> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| RiskError::Inference(format!("Failed to downcast to sequence: {}", e)))?;

    let maps = sequence
        .try_extract_sequence::<DynMapValueType>(&allocator)
        .map_err(|e| RiskError::Inference(e.to_string()))?;

    // batch size is always 1
    let map_value = maps
        .first()
        .ok_or_else(|| RiskError::Inference("Empty sequence".to_string()))?;

    let kv_pairs = map_value
        .try_extract_key_values::<i64, f32>()
        .map_err(|e| RiskError::Inference(e.to_string()))?;

    kv_pairs
        .iter()
        .find(|(class_id, _)| *class_id == 1)
        .map(|&(_, prob)| {
            debug!(model = %model_name, prob = prob, "Extracted from seq(map)");
            prob as f64
        })
        .ok_or_else(|| RiskError::Inference("No default-class entry in probability map".to_string()))
}

/// Default-class probability from a `[batch, classes]` or `[classes]` tensor
fn default_class_from_tensor(dims: &[i64], data: &[f32]) -> Option<f64> {
    if dims.is_empty() || dims.len() > 2 {
        return None;
    }
    match dims[dims.len() - 1] {
        c if c >= 2 => data.get(1).map(|&v| v as f64),
        // single sigmoid output
        1 => data.first().map(|&v| v as f64),
        _ => None,
    }
}
