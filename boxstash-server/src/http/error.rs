//! API error types with IntoResponse
//!
//! Errors are converted to failure envelopes with appropriate status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::response::Envelope;
use crate::db::DbError;
use crate::models::ValidationError;
use crate::uploads::UploadError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Body could not be parsed (400)
    BadRequest(String),

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Uniqueness or ownership conflict (400)
    Conflict(String),

    /// Rejected upload (400)
    Upload(UploadError),

    /// Database error (500, logged)
    Database(DbError),

    /// Internal error (500)
    Internal { message: String },
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::Validation(e) => (StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, "bad_request", message.clone()),
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("{} '{}' not found", resource, id),
            ),
            Self::Conflict(message) => (StatusCode::BAD_REQUEST, "conflict", message.clone()),
            Self::Upload(e) => (StatusCode::BAD_REQUEST, "upload_error", e.to_string()),
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "an internal error occurred".to_owned(),
                )
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "an internal error occurred".to_owned(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        Envelope::failure(status, code, message).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Conflict(message) => Self::Conflict(message),
            DbError::Invalid(v) => Self::Validation(v),
            DbError::Sqlx(_) => Self::Database(e),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(e: UploadError) -> Self {
        if e.is_client_error() {
            Self::Upload(e)
        } else {
            Self::Internal {
                message: e.to_string(),
            }
        }
    }
}
