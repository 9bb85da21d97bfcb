//! Model artifact abstraction and its ONNX Runtime implementation

pub mod inference;
pub mod loader;

use crate::types::features::FeatureFrame;
use anyhow::Result;

pub use inference::OnnxModel;
pub use loader::{LoadedModel, ModelLoader};

/// A pre-trained binary classifier.
///
/// Implementations are loaded once and only read afterwards, so one instance
/// may be shared by every concurrent scoring call.
pub trait FraudModel: Send + Sync {
    /// Model name for logs and health checks
    fn name(&self) -> &str;

    /// Probability of the positive (fraud) class for a single-row frame
    fn predict_probability(&self, frame: &FeatureFrame) -> Result<f64>;
}
