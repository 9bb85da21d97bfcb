//! Error types raised by the scoring pipeline

use thiserror::Error;

/// Failure of a single `score` call.
///
/// Validation variants are the caller's fault and map to client errors at the
/// HTTP boundary; `Inference` is a server-side failure of the model artifact.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    /// Wrong number of features in the request
    #[error("Model expects {expected} features, but received {actual}. Please check the feature engineering.")]
    Validation { expected: usize, actual: usize },

    /// A feature value was NaN or infinite
    #[error("Feature '{name}' at position {index} is not a finite number")]
    NonFiniteFeature { name: &'static str, index: usize },

    /// The model failed to produce a probability for a well-formed input
    #[error("{0}")]
    Inference(String),
}

impl ScoringError {
    /// Whether the error was caused by a malformed request
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ScoringError::Validation { .. } | ScoringError::NonFiniteFeature { .. }
        )
    }

    pub(crate) fn inference(err: anyhow::Error) -> Self {
        ScoringError::Inference(format!("{:#}", err))
    }
}
