//! Transaction records on the driver side of the scoring boundary

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::features::FeatureVector;
use super::scoring::{Decision, PredictRequest, ScoringResult};

/// Ground-truth label of a fraudulent transaction
pub const FRAUD_LABEL: u8 = 1;

/// One row of the historical reference set: features plus the known answer.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledTransaction {
    pub features: FeatureVector,
    /// 1 = fraud, 0 = normal
    pub label: u8,
}

impl LabeledTransaction {
    pub fn new(features: FeatureVector, label: u8) -> Self {
        Self { features, label }
    }

    pub fn is_fraud(&self) -> bool {
        self.label == FRAUD_LABEL
    }

    /// Split off the label, leaving a payload that can cross the scoring boundary
    pub fn strip_label(&self) -> (PredictRequest, u8) {
        (PredictRequest::from(&self.features), self.label)
    }
}

/// Monitoring record for one scored transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalLogEntry {
    pub timestamp: DateTime<Utc>,
    pub amount: f64,
    pub probability: f64,
    pub threshold_used: f64,
    pub action: Decision,
    pub ground_truth_label: u8,
}

impl HistoricalLogEntry {
    pub fn new(amount: f64, result: &ScoringResult, ground_truth_label: u8) -> Self {
        Self {
            timestamp: Utc::now(),
            amount,
            probability: result.probability,
            threshold_used: result.threshold_used,
            action: result.decision,
            ground_truth_label,
        }
    }

    /// A BLOCK on a transaction that really was fraud
    pub fn is_true_positive(&self) -> bool {
        self.action.is_block() && self.ground_truth_label == FRAUD_LABEL
    }
}
