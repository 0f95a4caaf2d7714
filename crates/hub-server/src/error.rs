//! Server-wide error type
//!
//! Feature slices map their own error enums to responses. `AppError` covers
//! the handlers that live outside a slice (health, stats, principal
//! extraction) and anything that only needs a status code and a message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::response::ErrorResponse;

/// Result type alias for server operations
pub type AppResult<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Hub error: {0}")]
    Hub(#[from] hub_common::HubError),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Database(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            },
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::Hub(hub_common::HubError::Io(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            },
            AppError::Hub(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                "A database error occurred".to_string()
            },
            AppError::Internal(ref message) => {
                tracing::error!("Internal error: {}", message);
                "An internal error occurred".to_string()
            },
            AppError::Hub(hub_common::HubError::Io(ref e)) => {
                tracing::error!("IO error: {:?}", e);
                "An IO error occurred".to_string()
            },
            AppError::Hub(ref e) => e.to_string(),
            AppError::NotFound(message)
            | AppError::Validation(message)
            | AppError::Unauthorized(message)
            | AppError::Forbidden(message) => message,
        };

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Unauthorized("x".into()).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("x".into()).into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Hub(hub_common::HubError::UnknownDatasetType("uvl".into()))
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
