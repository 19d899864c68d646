//! Spawns the full application on an ephemeral port for black-box tests

#![allow(dead_code)]

use auth::{
    AuthState,
    jwt::{JwtConfig, JwtService},
    models::User,
    oauth::OAuthProviders,
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::UserRepository,
};
use chrono::Utc;
use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, lazy_pool},
};
use rides::{
    AppState, ServerConfig, build_app,
    places::{PlacesConfig, PlacesService},
};
use sqlx::PgPool;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret";
pub const FRONTEND_ORIGIN: &str = "http://localhost:4200";

pub struct TestServer {
    pub base_url: String,
    pub jwt: JwtService,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Serve the app over a pool that never connects, for paths rejected before any query
    pub async fn spawn() -> Self {
        let pool = lazy_pool(&DatabaseConfig {
            database_url: "postgresql://postgres@127.0.0.1:1/ride_share_test".to_string(),
            max_connections: 1,
            min_connections: 0,
            connection_timeout: 1,
        })
        .expect("lazy pool");

        Self::spawn_with_pool(pool).await
    }

    pub async fn spawn_with_pool(pool: PgPool) -> Self {
        let jwt = JwtService::new(JwtConfig {
            secret: JWT_SECRET.to_string(),
            expiry_seconds: 600,
        })
        .expect("jwt service");

        let redis_pool = RedisPool::new(&RedisConfig {
            url: "redis://127.0.0.1:1".to_string(),
        })
        .expect("redis client");

        let auth_state = AuthState {
            user_repository: UserRepository::new(pool.clone()),
            jwt_service: jwt.clone(),
            rate_limiter: RateLimiter::new(RateLimiterConfig::default()),
            redis_pool,
            oauth: OAuthProviders::default(),
            frontend_url: FRONTEND_ORIGIN.to_string(),
        };

        let state = AppState::new(pool, jwt.clone(), PlacesService::new(PlacesConfig::default()));
        let config = ServerConfig {
            port: 0,
            cors_origin: FRONTEND_ORIGIN.to_string(),
        };
        let app = build_app(state, auth_state, &config).expect("app");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            jwt,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Token for a user who need not exist in the database
    pub fn token_for(&self, id: Uuid, name: &str) -> String {
        let user = User {
            id,
            email: format!("{}@example.com", id.simple()),
            name: name.to_string(),
            password_hash: None,
            provider: "email".to_string(),
            profile_image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.jwt.generate_token(&user).expect("token")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
