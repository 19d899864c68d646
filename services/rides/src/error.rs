//! Custom error types for the rides service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::booking::{BookingError, BookingRejection};

/// Custom error type for the rides service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or invalid bearer token
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but not allowed, such as a non-driver editing a ride
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// More seats requested than the ride has left
    #[error("Not enough seats: {available} available, {requested} requested")]
    InsufficientSeats { available: i32, requested: i32 },

    /// A third-party API failed
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] common::error::DatabaseError),
}

impl From<BookingRejection> for ApiError {
    fn from(rejection: BookingRejection) -> Self {
        match rejection {
            BookingRejection::OwnRide => ApiError::Forbidden(rejection.to_string()),
            BookingRejection::InsufficientSeats {
                available,
                requested,
            } => ApiError::InsufficientSeats {
                available,
                requested,
            },
            BookingRejection::InvalidPassengers | BookingRejection::NotAvailable => {
                ApiError::BadRequest(rejection.to_string())
            }
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            BookingError::Rejected(rejection) => rejection.into(),
            BookingError::AlreadyHandled => {
                ApiError::BadRequest(BookingError::AlreadyHandled.to_string())
            }
            BookingError::NotDriver => ApiError::Forbidden(BookingError::NotDriver.to_string()),
            BookingError::Database(db) => ApiError::Database(db),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::InsufficientSeats {
            available,
            requested,
        } = self
        {
            let body = Json(json!({
                "error": BookingRejection::InsufficientSeats { available, requested }.to_string(),
                "available_seats": available,
                "requested_seats": requested,
                "excess_seats": requested - available,
            }));
            return (StatusCode::BAD_REQUEST, body).into_response();
        }

        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Upstream(msg) => {
                error!("Upstream failure: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Upstream service error".to_string(),
                )
            }
            ApiError::InternalServerError | ApiError::InsufficientSeats { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            ApiError::Database(e) => {
                error!("Database failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
