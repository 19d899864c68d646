//! User repository for database operations

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use common::error::DatabaseResult;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::{NewUser, User};

const USER_COLUMNS: &str =
    "id, email, name, password_hash, provider, profile_image, created_at, updated_at";

/// Hash a plaintext password with argon2
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();
    Ok(hash)
}

/// Verify a plaintext password against a stored argon2 hash
pub fn verify_password(password_hash: &str, password: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user
    pub async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        info!("Creating new {} user: {}", new_user.provider, new_user.email);

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, name, password_hash, provider, profile_image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(&new_user.password_hash)
        .bind(&new_user.provider)
        .bind(&new_user.profile_image)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by email
    pub async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Return the user registered under the email, creating it on first login.
    ///
    /// Existing accounts are returned unchanged whatever provider they were
    /// created with.
    pub async fn find_or_create_oauth(&self, new_user: &NewUser) -> DatabaseResult<User> {
        let inserted = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, name, password_hash, provider, profile_image)
            VALUES ($1, $2, NULL, $3, $4)
            ON CONFLICT (email) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(&new_user.provider)
        .bind(&new_user.profile_image)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(user) = inserted {
            info!("Created {} user on first login: {}", user.provider, user.email);
            return Ok(user);
        }

        let existing = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(&new_user.email)
        .fetch_one(&self.pool)
        .await?;

        Ok(existing)
    }
}
