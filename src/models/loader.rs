//! ONNX model loader

use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::info;

/// Loaded ONNX session with its input/output metadata
pub struct LoadedModel {
    /// Model name
    pub name: String,
    /// ONNX Runtime session
    pub session: Session,
    /// Declared input names, in model order
    pub input_names: Vec<String>,
    /// Output name for probabilities
    pub output_name: String,
}

/// Loader for ONNX models
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load a single ONNX model from file
    pub fn load_model<P: AsRef<Path>>(&self, path: P, name: &str) -> Result<LoadedModel> {
        let path = path.as_ref();

        if !path.exists() {
            anyhow::bail!("Model file not found: {}", path.display());
        }

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {:?}", path))?;

        let input_names: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();
        if input_names.is_empty() {
            anyhow::bail!("Model {} declares no inputs", name);
        }

        let output_name = select_output_name(session.outputs.iter().map(|o| o.name.as_str()));

        info!(
            model = %name,
            inputs = input_names.len(),
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            name: name.to_string(),
            session,
            input_names,
            output_name,
        })
    }
}

/// Prefer a probability output over the predicted-label output
fn select_output_name<'a>(outputs: impl Iterator<Item = &'a str>) -> String {
    let outputs: Vec<&str> = outputs.collect();
    outputs
        .iter()
        .find(|name| name.contains("prob"))
        .or_else(|| outputs.iter().find(|name| !name.contains("label")))
        .or_else(|| outputs.last())
        .copied()
        .unwrap_or("probabilities")
        .to_string()
}
