//! Clients that submit feature vectors to the scoring service

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::scoring::ScoringService;
use crate::types::scoring::{ErrorDetail, PredictRequest, ScoringResult};

/// Failure to obtain a scoring result
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Scoring call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Scoring service returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("Failed to decode scoring response: {0}")]
    Decode(String),
}

/// One blocking request/response exchange per transaction
#[async_trait]
pub trait ScoringClient: Send + Sync {
    async fn score(&self, request: &PredictRequest) -> Result<ScoringResult, TransportError>;
}

/// Scoring client for the HTTP+JSON endpoint
pub struct HttpScoringClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpScoringClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl ScoringClient for HttpScoringClient {
    async fn score(&self, request: &PredictRequest) -> Result<ScoringResult, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorDetail>(&body)
                .map(|e| e.detail)
                .unwrap_or(body);
            return Err(TransportError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        response
            .json::<ScoringResult>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// Calls a scoring service in the same process, skipping the network
pub struct LocalScoringClient {
    service: ScoringService,
}

impl LocalScoringClient {
    pub fn new(service: ScoringService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ScoringClient for LocalScoringClient {
    async fn score(&self, request: &PredictRequest) -> Result<ScoringResult, TransportError> {
        self.service
            .score(&request.features)
            .map_err(|e| TransportError::Status {
                status: if e.is_client_error() { 400 } else { 500 },
                detail: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing::{FailingModel, FixedModel};
    use crate::scoring::ThresholdPolicy;
    use crate::types::scoring::Decision;
    use std::sync::Arc;

    fn request(len: usize, amount: f64) -> PredictRequest {
        let mut features = vec![0.0; len];
        if len > 29 {
            features[29] = amount;
        }
        PredictRequest { features }
    }

    #[tokio::test]
    async fn test_local_client_scores() {
        let service = ScoringService::new(Arc::new(FixedModel::new(0.3)), ThresholdPolicy::default());
        let client = LocalScoringClient::new(service);

        let result = client.score(&request(31, 6.0)).await.unwrap();
        assert_eq!(result.decision, Decision::Block);
    }

    #[tokio::test]
    async fn test_local_client_maps_errors() {
        let service = ScoringService::new(Arc::new(FixedModel::new(0.3)), ThresholdPolicy::default());
        let client = LocalScoringClient::new(service);
        let err = client.score(&request(30, 0.0)).await.unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 400, .. }));

        let service = ScoringService::new(Arc::new(FailingModel), ThresholdPolicy::default());
        let client = LocalScoringClient::new(service);
        let err = client.score(&request(31, 0.0)).await.unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_http_client_unreachable_endpoint() {
        // Port 9 (discard) is not expected to run an HTTP server
        let client =
            HttpScoringClient::new("http://127.0.0.1:9/predict", Duration::from_millis(500)).unwrap();
        let err = client.score(&request(31, 1.0)).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::Request(_) | TransportError::Timeout(_)
        ));
    }
}
