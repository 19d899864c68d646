use anyhow::Result;
use std::net::SocketAddr;
use tokio::{
    net::TcpListener,
    signal::{self, ctrl_c},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use auth::{
    AuthState, frontend_url_from_env,
    jwt::{JwtConfig, JwtService},
    oauth::OAuthProviders,
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::UserRepository,
};
use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
};
use rides::{
    AppState, ServerConfig, build_app,
    places::{PlacesConfig, PlacesService},
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting ride share service");

    let server_config = ServerConfig::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    // Redis only holds OAuth login state, so email auth and rides work without it
    let redis_pool = RedisPool::new(&RedisConfig::from_env()?)?;
    match redis_pool.health_check().await {
        Ok(true) => info!("Redis connection successful"),
        _ => warn!("Redis is unreachable; OAuth logins will fail until it is available"),
    }

    let jwt_service = JwtService::new(JwtConfig::from_env()?)?;

    let auth_state = AuthState {
        user_repository: UserRepository::new(pool.clone()),
        jwt_service: jwt_service.clone(),
        rate_limiter: RateLimiter::new(RateLimiterConfig::default()),
        redis_pool,
        oauth: OAuthProviders::from_env()?,
        frontend_url: frontend_url_from_env(),
    };

    let places = PlacesService::new(PlacesConfig::from_env());
    let app_state = AppState::new(pool, jwt_service, places);

    let app = build_app(app_state, auth_state, &server_config)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], server_config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Ride share service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Ride share service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
