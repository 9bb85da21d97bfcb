//! Request and response payloads of the scoring endpoint

use serde::{Deserialize, Serialize};
use std::fmt;

use super::features::FeatureVector;

/// Final action for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Allow,
    Block,
}

impl Decision {
    /// BLOCK when the probability reaches the threshold (inclusive)
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        if probability >= threshold {
            Decision::Block
        } else {
            Decision::Allow
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Decision::Block)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "ALLOW",
            Decision::Block => "BLOCK",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of scoring one transaction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    /// Fraud probability (0.0 - 1.0)
    pub probability: f64,
    /// Threshold chosen by the amount policy
    pub threshold_used: f64,
    /// Action derived from probability vs threshold
    pub decision: Decision,
}

/// Body of `POST /predict`. Carries features only, never the label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub features: Vec<f64>,
}

impl From<&FeatureVector> for PredictRequest {
    fn from(vector: &FeatureVector) -> Self {
        Self {
            features: vector.to_vec(),
        }
    }
}

/// Error body returned for rejected or failed requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}
