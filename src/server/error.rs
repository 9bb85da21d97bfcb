//! HTTP error responses carrying a `{ "detail": ... }` body

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::ScoringError;
use crate::types::scoring::ErrorDetail;

#[derive(Debug)]
pub enum HttpError {
    BadRequest(String),
    Internal(String),
}

impl From<ScoringError> for HttpError {
    fn from(value: ScoringError) -> Self {
        if value.is_client_error() {
            HttpError::BadRequest(value.to_string())
        } else {
            HttpError::Internal(value.to_string())
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            HttpError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorDetail { detail })).into_response()
    }
}
