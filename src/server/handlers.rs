//! Request handlers for the scoring endpoints

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::scoring::{ScoringService, ThresholdPolicy};
use crate::types::features::FEATURE_COUNT;
use crate::types::scoring::{PredictRequest, ScoringResult};

use super::error::HttpError;

#[derive(Clone)]
pub struct AppState {
    pub service: ScoringService,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
    pub features: usize,
}

pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<ScoringResult>, HttpError> {
    let service = state.service.clone();
    let outcome = tokio::task::spawn_blocking(move || service.score(&request.features))
        .await
        .map_err(|e| HttpError::Internal(format!("Scoring task failed: {}", e)))?;

    match outcome {
        Ok(result) => {
            debug!(
                decision = %result.decision,
                probability = result.probability,
                threshold = result.threshold_used,
                "Scored transaction"
            );
            Ok(Json(result))
        }
        Err(err) => {
            if err.is_client_error() {
                warn!(error = %err, "Rejected scoring request");
            } else {
                error!(error = %err, "Inference failed");
            }
            Err(err.into())
        }
    }
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model: state.service.model_name().to_string(),
        features: FEATURE_COUNT,
    })
}

pub async fn threshold_policy(State(state): State<AppState>) -> Json<ThresholdPolicy> {
    Json(*state.service.policy())
}
