//! Unified API error handling
//!
//! Provides consistent error responses across all endpoints.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::validation::{ErrorKind, ValidationError, ValidationResult};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Superseded by a newer request")]
    Superseded,

    #[error("Validation failed")]
    Validation(Vec<ValidationError>),

    #[error("Unsupported file type: {0}")]
    FileType(String),

    #[error("File too large: {0}")]
    FileSize(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationError>>,
}

impl ApiError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(anyhow::anyhow!(msg.into()))
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// `Ok(())` for a valid result, `Validation` otherwise
    pub fn check(result: ValidationResult) -> Result<(), Self> {
        result.into_result().map_err(Self::Validation)
    }

    /// Like [`ApiError::check`], but upload problems map to their own codes
    pub fn check_upload(result: ValidationResult) -> Result<(), Self> {
        let errors = match result.into_result() {
            Ok(()) => return Ok(()),
            Err(errors) => errors,
        };

        if let Some(e) = errors.iter().find(|e| e.kind == ErrorKind::FileType) {
            return Err(Self::FileType(e.message.clone()));
        }
        if let Some(e) = errors.iter().find(|e| e.kind == ErrorKind::FileSize) {
            return Err(Self::FileSize(e.message.clone()));
        }
        Err(Self::Validation(errors))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) | Self::Superseded => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::FileType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::FileSize(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RateLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Storage(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Conflict(_) => "CONFLICT",
            Self::Superseded => "SUPERSEDED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::FileType(_) => "FILE_TYPE",
            Self::FileSize(_) => "FILE_SIZE",
            Self::RateLimitExceeded(_) => "RATE_LIMIT_EXCEEDED",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg)
            | Self::FileType(msg)
            | Self::FileSize(msg) => msg.clone(),
            Self::Superseded => "A newer search replaced this one".to_string(),
            Self::Validation(_) => "Please correct the highlighted fields".to_string(),
            Self::RateLimitExceeded(msg) => msg.clone(),
            // Don't leak internal error details
            Self::Storage(_) => "Image storage is unavailable, please try again later".to_string(),
            Self::Internal(_) | Self::Database(_) => "An internal error occurred".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Log internal errors
        match &self {
            Self::Internal(e) => {
                tracing::error!(error = ?e, "Internal server error");
            }
            Self::Database(e) => {
                tracing::error!(error = ?e, "Database error");
            }
            Self::Storage(e) => {
                tracing::error!(error = %e, "Storage error");
            }
            _ => {
                tracing::warn!(error = %self, "API error");
            }
        }

        let status = self.status_code();
        let code = self.error_code().to_string();
        let message = self.public_message();
        let errors = match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        };

        (status, Json(ErrorResponse { code, message, errors })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_has_distinct_code() {
        let err = ApiError::RateLimitExceeded("Daily message limit reached".into());
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.error_code(), "RATE_LIMIT_EXCEEDED");
    }

    #[test]
    fn check_maps_validation_result() {
        assert!(ApiError::check(ValidationResult::new()).is_ok());

        let mut result = ValidationResult::new();
        result.add_error("bio", ErrorKind::Required, "Bio is required");
        match ApiError::check(result) {
            Err(ApiError::Validation(errors)) => assert_eq!(errors[0].field, "bio"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn upload_errors_get_specific_codes() {
        let mut result = ValidationResult::new();
        result.add_error("file", ErrorKind::FileSize, "too big");
        let err = ApiError::check_upload(result).unwrap_err();
        assert_eq!(err.error_code(), "FILE_SIZE");
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);

        let mut result = ValidationResult::new();
        result.add_error("file", ErrorKind::FileType, "not an image");
        assert_eq!(ApiError::check_upload(result).unwrap_err().error_code(), "FILE_TYPE");
    }

    #[test]
    fn internal_details_are_hidden() {
        let err = ApiError::internal("connection string leaked");
        assert_eq!(err.public_message(), "An internal error occurred");
    }
}
