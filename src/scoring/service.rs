//! Stateless scoring of one transaction

use crate::error::ScoringError;
use crate::models::FraudModel;
use crate::scoring::threshold::ThresholdPolicy;
use crate::types::features::FeatureVector;
use crate::types::scoring::ScoringResult;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::debug;

/// Turns a feature vector into a probability and an ALLOW/BLOCK decision.
///
/// Holds no per-call state: every call is independent, so clones may be used
/// from any number of threads at once.
#[derive(Clone)]
pub struct ScoringService {
    model: Arc<dyn FraudModel>,
    policy: ThresholdPolicy,
}

impl ScoringService {
    pub fn new(model: Arc<dyn FraudModel>, policy: ThresholdPolicy) -> Self {
        Self { model, policy }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn policy(&self) -> &ThresholdPolicy {
        &self.policy
    }

    /// Validate raw features and score them.
    ///
    /// A malformed vector is rejected before the model is called.
    pub fn score(&self, features: &[f64]) -> Result<ScoringResult, ScoringError> {
        let features = FeatureVector::try_from_slice(features)?;
        self.score_vector(&features)
    }

    pub fn score_vector(&self, features: &FeatureVector) -> Result<ScoringResult, ScoringError> {
        let probability = self.infer(features)?;
        let (threshold_used, decision) = self.policy.decide(probability, features.amount());

        debug!(
            model = %self.model.name(),
            amount = features.amount(),
            probability = probability,
            threshold = threshold_used,
            decision = %decision,
            "Transaction scored"
        );

        Ok(ScoringResult {
            probability,
            threshold_used,
            decision,
        })
    }

    fn infer(&self, features: &FeatureVector) -> Result<f64, ScoringError> {
        let frame = features.to_frame();

        let probability =
            match panic::catch_unwind(AssertUnwindSafe(|| self.model.predict_probability(&frame))) {
                Ok(Ok(probability)) => probability,
                Ok(Err(e)) => return Err(ScoringError::inference(e)),
                Err(payload) => {
                    return Err(ScoringError::Inference(format!(
                        "Model panicked: {}",
                        panic_message(payload.as_ref())
                    )))
                }
            };

        if !(0.0..=1.0).contains(&probability) {
            return Err(ScoringError::Inference(format!(
                "Model returned probability {} outside [0, 1]",
                probability
            )));
        }

        Ok(probability)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
