//! Authentication for the ride share backend
//!
//! Email/password accounts, Google and Facebook OAuth, and the HS256 tokens
//! the rest of the backend trusts. The crate exposes an axum router that the
//! rides binary merges into its server.

pub mod error;
pub mod jwt;
pub mod models;
pub mod oauth;
pub mod rate_limiter;
pub mod repositories;
pub mod routes;
pub mod validation;

use common::cache::RedisPool;

use crate::{
    jwt::JwtService, oauth::OAuthProviders, rate_limiter::RateLimiter,
    repositories::UserRepository,
};

pub use routes::create_router;

/// State shared by the authentication handlers
#[derive(Clone)]
pub struct AuthState {
    pub user_repository: UserRepository,
    pub jwt_service: JwtService,
    pub rate_limiter: RateLimiter,
    pub redis_pool: RedisPool,
    pub oauth: OAuthProviders,
    /// Where OAuth logins are redirected with their token
    pub frontend_url: String,
}

/// Read `FRONTEND_URL` (default: "http://localhost:4200")
pub fn frontend_url_from_env() -> String {
    std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:4200".to_string())
}
