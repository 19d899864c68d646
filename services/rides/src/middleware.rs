//! Authentication middleware for bearer token validation

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::warn;
use uuid::Uuid;

use crate::{error::ApiError, models::Passenger, state::AppState};

/// Authenticated user information
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub profile_image: Option<String>,
}

impl AuthUser {
    /// The user as a passenger on a booking or request
    pub fn passenger(&self) -> Passenger {
        Passenger {
            id: self.id,
            name: self.name.clone(),
            profile_pic: self.profile_image.clone().unwrap_or_default(),
        }
    }
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(ApiError::Unauthorized)?;

    let claims = state
        .jwt_service
        .validate_token(bearer.token())
        .map_err(|e| {
            warn!("Rejected bearer token: {}", e);
            ApiError::Unauthorized
        })?;

    req.extensions_mut().insert(AuthUser {
        id: claims.id,
        email: claims.email,
        name: claims.name,
        profile_image: claims.profile_image,
    });

    Ok(next.run(req).await)
}
