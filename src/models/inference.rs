//! ONNX Runtime implementation of the fraud model

use crate::config::ModelConfig;
use crate::models::loader::{LoadedModel, ModelLoader};
use crate::models::FraudModel;
use crate::types::features::{FeatureFrame, FEATURE_COUNT, FEATURE_NAMES};
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::{SessionInputValue, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, Tensor};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

/// How frame columns are fed to the session
#[derive(Debug, Clone, PartialEq, Eq)]
enum InputBinding {
    /// One `[1, 1]` input per column, matched by column name
    Named,
    /// A single `[1, 31]` tensor in training column order
    Positional(String),
}

impl InputBinding {
    fn for_inputs(input_names: &[String]) -> Self {
        let named = input_names.len() == FEATURE_COUNT
            && FEATURE_NAMES
                .iter()
                .all(|column| input_names.iter().any(|name| name == column));

        if named {
            InputBinding::Named
        } else {
            InputBinding::Positional(
                input_names
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "float_input".to_string()),
            )
        }
    }
}

/// Pre-trained classifier exported to ONNX.
///
/// Sessions need exclusive access to run, so concurrent callers are
/// serialized on a mutex. The session itself is never replaced after load.
pub struct OnnxModel {
    name: String,
    binding: InputBinding,
    model: Mutex<LoadedModel>,
}

impl OnnxModel {
    /// Load the model artifact named in the configuration
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let loader = ModelLoader::with_threads(config.onnx_threads)?;
        let model = loader.load_model(&config.path, &config.name)?;
        Ok(Self::from_loaded(model))
    }

    pub fn from_loaded(model: LoadedModel) -> Self {
        let binding = InputBinding::for_inputs(&model.input_names);

        info!(
            model = %model.name,
            binding = ?binding,
            "Fraud model ready"
        );

        Self {
            name: model.name.clone(),
            binding,
            model: Mutex::new(model),
        }
    }

    fn build_inputs(&self, frame: &FeatureFrame) -> Result<Vec<(String, SessionInputValue<'static>)>> {
        match &self.binding {
            InputBinding::Named => frame
                .iter()
                .map(|(column, value)| {
                    let tensor = Tensor::from_array((vec![1_i64, 1], vec![value as f32]))
                        .with_context(|| format!("Failed to create input tensor for {}", column))?;
                    Ok((column.to_string(), tensor.into()))
                })
                .collect(),
            InputBinding::Positional(input_name) => {
                let shape = vec![1_i64, FEATURE_COUNT as i64];
                let tensor = Tensor::from_array((shape, frame.row_f32()))
                    .context("Failed to create input tensor")?;
                Ok(vec![(input_name.clone(), tensor.into())])
            }
        }
    }
}

impl FraudModel for OnnxModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_probability(&self, frame: &FeatureFrame) -> Result<f64> {
        let inputs = self.build_inputs(frame)?;

        // A panic while holding the lock leaves the session itself intact.
        let mut model = self.model.lock().unwrap_or_else(PoisonError::into_inner);
        let output_name = model.output_name.clone();

        let outputs = model
            .session
            .run(inputs)
            .with_context(|| format!("Model {} failed to run", self.name))?;

        extract_probability(&outputs, &output_name, &self.name)
    }
}

/// Extract the fraud probability from model outputs.
///
/// Handles tensor outputs (XGBoost, Random Forest) and seq(map) outputs
/// (CatBoost, LightGBM, sklearn classifiers with zipmap).
fn extract_probability(outputs: &SessionOutputs, output_name: &str, model_name: &str) -> Result<f64> {
    if let Some(output) = outputs.get(output_name) {
        let dtype = output.dtype();

        if let Ok(tensor) = output.try_extract_tensor::<f32>() {
            let (shape, data) = tensor;
            let prob = fraud_prob_from_tensor(shape, data)?;
            debug!(model = %model_name, prob = prob, "Extracted from tensor");
            return Ok(prob);
        }

        if DynSequenceValueType::can_downcast(&dtype) {
            return extract_from_sequence_map(output, model_name);
        }
    }

    // Fall back to any non-label output
    for (name, output) in outputs.iter() {
        if name.contains("label") {
            continue;
        }

        let dtype = output.dtype();

        if let Ok(tensor) = output.try_extract_tensor::<f32>() {
            let (shape, data) = tensor;
            let prob = fraud_prob_from_tensor(shape, data)?;
            debug!(model = %model_name, output = %name, prob = prob, "Extracted from tensor (fallback)");
            return Ok(prob);
        }

        if DynSequenceValueType::can_downcast(&dtype) {
            if let Ok(prob) = extract_from_sequence_map(&output, model_name) {
                return Ok(prob);
            }
        }
    }

    anyhow::bail!("Model {} produced no probability output", model_name)
}

/// Extract the class-1 probability from seq(map(int64, float))
fn extract_from_sequence_map(output: &ort::value::DynValue, model_name: &str) -> Result<f64> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;

    // Single-row frame, so only the first map matters
    let map_value = maps
        .first()
        .ok_or_else(|| anyhow::anyhow!("Empty probability sequence"))?;

    let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

    if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 1) {
        debug!(model = %model_name, prob = *prob, "Extracted from seq(map)");
        return Ok(*prob as f64);
    }

    if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 0) {
        return Ok(1.0 - *prob as f64);
    }

    Err(anyhow::anyhow!("No class probability found in map"))
}

/// Extract the fraud probability from tensor data
fn fraud_prob_from_tensor(shape: &[i64], data: &[f32]) -> Result<f64> {
    let num_classes = match shape {
        [_, classes] | [classes] => *classes,
        _ => anyhow::bail!("Unexpected probability tensor shape {:?}", shape),
    };

    let value = match num_classes {
        // [batch, 2] or [2] - fraud is class 1
        n if n >= 2 => data.get(1),
        // [batch, 1] or [1] - single probability
        1 => data.first(),
        _ => None,
    };

    value
        .map(|&v| v as f64)
        .ok_or_else(|| anyhow::anyhow!("Probability tensor of shape {:?} is empty", shape))
}
