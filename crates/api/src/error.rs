//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use catalog_store::StoreError;
use coordinator::WriteError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Coordinated write failed.
    Write(WriteError),
    /// Catalog read failed.
    Store(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Write(err) => write_error_to_response(err),
            ApiError::Store(err) => {
                tracing::error!(error = %err, "catalog store error");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn write_error_to_response(err: WriteError) -> (StatusCode, String) {
    match &err {
        WriteError::ValidationFailed(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        WriteError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        WriteError::CompensatedFailure { .. } => (StatusCode::BAD_GATEWAY, err.to_string()),
        WriteError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
        WriteError::FinalizeFailed { .. } | WriteError::Store(_) => {
            tracing::error!(error = %err, "catalog write failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<WriteError> for ApiError {
    fn from(err: WriteError) -> Self {
        ApiError::Write(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}
