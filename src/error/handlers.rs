//! Error handlers
//!
//! Maps gateway errors onto HTTP status codes and JSON error bodies.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use serde_json::json;

use crate::error::types::{DecodeError, GatewayError, StorageError};

/// Log a gateway error that is about to be returned to the caller
pub fn handle_error(err: &GatewayError) {
    match err {
        GatewayError::Storage(StorageError::IoError(_)) => error!("Gateway error: {}", err),
        _ => log::debug!("Request rejected: {}", err),
    }
}

/// Convert error to HTTP status code
pub fn error_to_status(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        GatewayError::Decode(DecodeError::FetchFailed(_)) => StatusCode::BAD_GATEWAY,
        GatewayError::Decode(_) => StatusCode::BAD_REQUEST,
        GatewayError::Storage(StorageError::DirectoryMissing(_)) => StatusCode::BAD_REQUEST,
        GatewayError::Storage(StorageError::InvalidPath(_)) => StatusCode::BAD_REQUEST,
        GatewayError::Storage(StorageError::Forbidden(_)) => StatusCode::FORBIDDEN,
        GatewayError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
        GatewayError::Storage(StorageError::IoError(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        handle_error(&self);
        let status = error_to_status(&self);
        let body = Json(json!({ "success": false, "error": self.to_string() }));
        (status, body).into_response()
    }
}
