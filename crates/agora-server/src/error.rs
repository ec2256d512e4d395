//! HTTP error mapping.
//!
//! Service failures map to status codes one-to-one; every error body is
//! the same JSON shape `{error, code}` so clients never parse HTML.

use agora_service::ServiceError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing x-caller-identity header")]
    MissingIdentity,

    #[error("Invalid caller identity: {0}")]
    InvalidIdentity(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Result type alias for the HTTP boundary.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::MissingIdentity | Self::InvalidIdentity(_) => {
                (StatusCode::UNAUTHORIZED, "unauthorized")
            }
            Self::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config"),
            Self::Service(e) => match e {
                ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
                ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                ServiceError::Authorization(_) => (StatusCode::FORBIDDEN, "forbidden"),
                // Terminal-state violations are caller mistakes, not
                // retryable races.
                ServiceError::Conflict(_) => (StatusCode::BAD_REQUEST, "conflict"),
                ServiceError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            error!(error = %self, code, "Request failed");
        }
        let body = ErrorBody {
            error: self.to_string(),
            code,
        };
        (status, Json(body)).into_response()
    }
}
