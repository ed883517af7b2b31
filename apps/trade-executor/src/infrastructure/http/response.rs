//! HTTP response DTOs and error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::application::TradeError;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Error body returned for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Error code.
    pub error: String,
    /// Error message.
    pub message: String,
}

/// Handler error carrying its HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ApiErrorResponse,
}

impl ApiError {
    /// 400 with a caller-facing message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ApiErrorResponse {
                error: "INVALID_INPUT".to_string(),
                message: message.into(),
            },
        }
    }

    /// HTTP status of this error.
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<TradeError> for ApiError {
    fn from(err: TradeError) -> Self {
        let (status, code) = match &err {
            TradeError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            TradeError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            TradeError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            TradeError::Interrupted { .. } => (StatusCode::SERVICE_UNAVAILABLE, "INTERRUPTED"),
        };
        Self {
            status,
            body: ApiErrorResponse {
                error: code.to_string(),
                message: err.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
