use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::error::AppError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Serialize, Clone)]
pub enum ApiError {
    #[error("Internal server error")]
    InternalError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Server configuration error: {0}")]
    Misconfigured(String),

    #[error("Upstream service failed: {0}")]
    UpstreamFailed(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Database(_) => {
                tracing::error!("Internal error: {:?}", err);
                Self::InternalError("Internal server error".to_string())
            }
            AppError::NotFound(msg) => Self::NotFound(msg),
            AppError::Validation(msg) => Self::ValidationError(msg),
            AppError::Extraction(msg) => Self::ExtractionFailed(msg),
            AppError::Configuration(msg) => Self::Misconfigured(msg),
            AppError::Upstream(msg) => Self::UpstreamFailed(msg),
            _ => {
                tracing::error!("Internal error: {:?}", err);
                Self::InternalError("Internal server error".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            Self::InternalError(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: message,
                    status: "error".to_string(),
                },
            ),
            Self::ValidationError(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: message,
                    status: "error".to_string(),
                },
            ),
            Self::NotFound(message) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: message,
                    status: "error".to_string(),
                },
            ),
            Self::ExtractionFailed(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse {
                    error: message,
                    status: "error".to_string(),
                },
            ),
            Self::Misconfigured(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: format!("Server configuration error: {message}"),
                    status: "error".to_string(),
                },
            ),
            Self::UpstreamFailed(message) => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse {
                    error: format!("Upstream service failed: {message}"),
                    status: "error".to_string(),
                },
            ),
            Self::PayloadTooLarge(message) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorResponse {
                    error: message,
                    status: "error".to_string(),
                },
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

#[derive(Serialize, Debug)]
struct ErrorResponse {
    error: String,
    status: String,
}
