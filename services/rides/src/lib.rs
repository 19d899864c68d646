//! Ride share HTTP API
//!
//! Drivers post rides, passengers search and book them directly or send a
//! request the driver approves. Seats are accounted inside one database
//! transaction per booking; a ride whose last seat is taken moves to
//! `ride_history`. [`build_app`] serves these routes together with the
//! authentication routes from the `auth` crate.

pub mod booking;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod places;
pub mod repositories;
pub mod routes;
pub mod state;

use anyhow::Result;
use auth::AuthState;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use config::ServerConfig;
pub use state::AppState;

/// CORS policy for the single browser frontend
pub fn cors_layer(origin: &str) -> Result<CorsLayer> {
    let origin: HeaderValue = origin
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid CORS origin {}: {}", origin, e))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

/// Merge the ride and auth routers and add CORS and request tracing
pub fn build_app(state: AppState, auth_state: AuthState, config: &ServerConfig) -> Result<Router> {
    let app = Router::new()
        .merge(routes::create_router(state))
        .merge(auth::create_router(auth_state))
        .layer(cors_layer(&config.cors_origin)?)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}
