//! Error types for Pattern Portal
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// This enum represents all possible errors that can occur
/// in the application. It implements `IntoResponse` to
/// automatically convert errors to appropriate HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication required (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Session cookie could not be issued (500)
    #[error("Session error: {0}")]
    Session(String),

    /// HTTP client error (502)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Identity provider rejected a request (502)
    #[error("{operation} failed with status {status}: {detail}")]
    Provider {
        operation: &'static str,
        status: u16,
        detail: String,
    },

    /// Authorization callback could not be completed (500, plain text)
    #[error("Login failed: {0}")]
    LoginFailed(String),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    fn error_type(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::Session(_) => "session",
            AppError::HttpClient(_) => "http_client",
            AppError::Provider { .. } => "provider",
            AppError::LoginFailed(_) => "login_failed",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to appropriate HTTP status code
    /// and JSON error body. Login failures are reported as plain text.
    fn into_response(self) -> Response {
        use axum::Json;

        crate::metrics::ERRORS_TOTAL
            .with_label_values(&[self.error_type()])
            .inc();

        let (status, error_message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::LoginFailed(_) => {
                return (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response();
            }
            AppError::HttpClient(_) | AppError::Provider { .. } => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::Session(_) | AppError::Config(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(serde_json::json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
