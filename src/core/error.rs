//! Error types and handling for the gateway.
//!
//! This module provides a unified error type [`AppError`] that maps each
//! request-routing failure onto its HTTP response. Discovery failures are
//! deliberately absent: they are retried and absorbed inside
//! [`crate::services::discovery`] and never reach a caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

const ERROR_TYPE_API: &str = "api_error";

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum AppError {
    /// Server-side configuration errors (missing proxy secret, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication failures (missing or invalid bearer token)
    #[error("Unauthorized")]
    Unauthorized,

    /// Client provided invalid data
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Requested model id is not in the catalog
    #[error("Model '{0}' not found")]
    ModelNotFound(String),

    /// Transport failure while forwarding to an upstream source
    #[error("Failed to forward request: {0}")]
    Upstream(#[from] reqwest::Error),

    /// JSON serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal consistency errors (catalog points at an unknown source)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ModelNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "type": ERROR_TYPE_API,
                "code": status.as_u16()
            }
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results using [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
