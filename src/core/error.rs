//! Error type system for the LMS backend
//!
//! This module provides the crate-wide error type with:
//! - HTTP status code mapping per error class
//! - Structured JSON error bodies (`success: false` + message)
//! - Per-field validation detail where available

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Main error type for the LMS backend
#[derive(Debug, thiserror::Error)]
pub enum LmsError {
    // System-level errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Email delivery failed: {0}")]
    EmailError(String),

    #[error("Task error: {0}")]
    TaskError(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    // Request-level errors
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Validation error: {}", .0.join("; "))]
    ValidationErrors(Vec<String>),

    // Duplicate unique keys surface as 400, matching the external contract
    #[error("{0}")]
    Conflict(String),

    // Authentication / authorization
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Token expired: {0}")]
    TokenExpired(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),
}

impl LmsError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            LmsError::ValidationError(_)
            | LmsError::ValidationErrors(_)
            | LmsError::Conflict(_) => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            LmsError::AuthenticationError(_) | LmsError::TokenExpired(_) => {
                StatusCode::UNAUTHORIZED
            }

            // 403 Forbidden
            LmsError::PermissionDenied(_) => StatusCode::FORBIDDEN,

            // 404 Not Found
            LmsError::NotFound(_) => StatusCode::NOT_FOUND,

            // 500 Internal Server Error
            LmsError::ConfigError(_)
            | LmsError::DatabaseError(_)
            | LmsError::IoError(_)
            | LmsError::EmailError(_)
            | LmsError::TaskError(_)
            | LmsError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type name for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            LmsError::ConfigError(_) => "ConfigError",
            LmsError::DatabaseError(_) => "DatabaseError",
            LmsError::IoError(_) => "IoError",
            LmsError::EmailError(_) => "EmailError",
            LmsError::TaskError(_) => "TaskError",
            LmsError::Internal(_) => "Internal",
            LmsError::ValidationError(_) => "ValidationError",
            LmsError::ValidationErrors(_) => "ValidationError",
            LmsError::Conflict(_) => "Conflict",
            LmsError::AuthenticationError(_) => "AuthenticationError",
            LmsError::TokenExpired(_) => "TokenExpired",
            LmsError::PermissionDenied(_) => "PermissionDenied",
            LmsError::NotFound(_) => "NotFound",
        }
    }

    /// Whether the public response body may carry this error's message.
    ///
    /// Unexpected storage/IO failures are reduced to a generic message so
    /// internals never leak to callers.
    fn is_public(&self) -> bool {
        !matches!(
            self.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        )
    }
}

/// Error response structure for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false for error responses
    pub success: bool,
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Per-field validation problems, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: String, message: String) -> Self {
        Self {
            success: false,
            error,
            message,
            errors: None,
        }
    }

    /// Create an error response from an LmsError
    pub fn from_error(error: &LmsError) -> Self {
        let message = if error.is_public() {
            error.to_string()
        } else {
            "Internal server error".to_string()
        };

        let errors = match error {
            LmsError::ValidationErrors(list) => Some(list.clone()),
            _ => None,
        };

        Self {
            success: false,
            error: error.error_type().to_string(),
            message,
            errors,
        }
    }
}

/// Implement IntoResponse for LmsError to enable automatic error handling in Axum
impl IntoResponse for LmsError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_response = ErrorResponse::from_error(&self);

        if status_code.is_server_error() {
            tracing::error!(
                error_type = self.error_type(),
                status_code = %status_code,
                "Request failed: {}",
                self
            );
        } else {
            tracing::warn!(
                error_type = self.error_type(),
                status_code = %status_code,
                "Request rejected: {}",
                self
            );
        }

        (status_code, Json(error_response)).into_response()
    }
}

/// Result type alias for operations that can fail with LmsError
pub type Result<T> = std::result::Result<T, LmsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            LmsError::ValidationError("test".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LmsError::Conflict("duplicate email".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LmsError::AuthenticationError("test".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            LmsError::TokenExpired("test".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            LmsError::PermissionDenied("test".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            LmsError::NotFound("test".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            LmsError::DatabaseError(rusqlite::Error::InvalidQuery).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_expired_distinguishable_from_malformed() {
        // Both are 401, but the error type tells the caller which happened
        let expired = LmsError::TokenExpired("token has expired".into());
        let malformed = LmsError::AuthenticationError("invalid token format".into());

        assert_eq!(expired.status_code(), malformed.status_code());
        assert_ne!(expired.error_type(), malformed.error_type());
    }

    #[test]
    fn test_error_response_carries_success_false() {
        let error = LmsError::NotFound("Employee not found".into());
        let response = ErrorResponse::from_error(&error);

        assert!(!response.success);
        assert_eq!(response.error, "NotFound");
        assert!(response.message.contains("Employee not found"));
        assert!(response.errors.is_none());
    }

    #[test]
    fn test_validation_errors_enumerated() {
        let error = LmsError::ValidationErrors(vec![
            "name is required".to_string(),
            "email is required".to_string(),
        ]);
        let response = ErrorResponse::from_error(&error);

        assert_eq!(response.errors.as_ref().map(|e| e.len()), Some(2));
        assert!(response.message.contains("name is required"));
    }

    #[test]
    fn test_internal_errors_do_not_leak() {
        let error = LmsError::Internal("connection pool exhausted at 10.0.0.3".into());
        let response = ErrorResponse::from_error(&error);

        assert_eq!(response.message, "Internal server error");
    }
}
