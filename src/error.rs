//! Application error types and result alias.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application result type alias
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
///
/// Variants fall into four kinds: invalid input (400), not found (404),
/// unavailable (500, retryable) and internal (500, invariant violation).
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    /// Referenced role key, permission id or entity does not exist.
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Message bus error: {0}")]
    Bus(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invariant violation, e.g. malformed data reaching the scope algebra.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Map error variant to an HTTP status code.
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Json(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Config(_)
            | Self::Database(_)
            | Self::Sqlx(_)
            | Self::Migration(_)
            | Self::Bus(_)
            | Self::Io(_)
            | Self::AddrParse(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Return a user-facing message. Internal details are hidden for
    /// wrapped foreign errors (Sqlx, Io, etc.) to avoid leaking internals.
    fn user_message(&self) -> String {
        match self {
            Self::Sqlx(_) | Self::Database(_) => "storage unavailable".to_string(),
            Self::Migration(_) => "database migration failed".to_string(),
            Self::Io(_) => "io operation failed".to_string(),
            Self::AddrParse(_) => "invalid address".to_string(),
            Self::Json(_) => "invalid payload".to_string(),
            other => other.to_string(),
        }
    }

    /// True for errors a caller may retry (transient storage or bus failures).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Sqlx(_) | Self::Bus(_) | Self::Io(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.user_message();

        tracing::error!(error = %self, status = %status, "Request error");

        // Single wire code throughout; the HTTP status is the vocabulary.
        let body = Json(json!({
            "error": {
                "code": "RBAC_ERROR",
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Database("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_foreign_errors_are_masked() {
        let err = AppError::Database("connection refused to 10.0.0.1".into());
        assert_eq!(err.user_message(), "storage unavailable");

        let err = AppError::NotFound("role not found".into());
        assert_eq!(err.user_message(), "Resource not found: role not found");
    }

    #[test]
    fn test_retryable() {
        assert!(AppError::Database("x".into()).is_retryable());
        assert!(AppError::Bus("x".into()).is_retryable());
        assert!(!AppError::Validation("x".into()).is_retryable());
        assert!(!AppError::NotFound("x".into()).is_retryable());
    }
}
