//! Error type returned by the authentication handlers

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Malformed or invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Credentials were missing or wrong
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Too many failed login attempts
    #[error("Too many login attempts")]
    TooManyRequests,

    /// Unknown route parameter such as an unsupported provider
    #[error("Not found: {0}")]
    NotFound(String),

    /// The OAuth provider failed or is not configured
    #[error("OAuth provider error: {0}")]
    Provider(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] common::error::DatabaseError),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AuthError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AuthError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many login attempts, try again later".to_string(),
            ),
            AuthError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AuthError::Provider(msg) => {
                error!("OAuth provider failure: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to authenticate with provider".to_string(),
                )
            }
            AuthError::Database(e) => {
                error!("Database failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AuthError::Internal(msg) => {
                error!("Internal failure: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for authentication results
pub type AuthResult<T> = Result<T, AuthError>;
