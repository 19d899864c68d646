//! Authentication routes: email signup/login and OAuth redirects

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use oauth2::PkceCodeVerifier;
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info, warn};

use crate::{
    AuthState,
    error::{AuthError, AuthResult},
    models::{AuthResponse, EMAIL_PROVIDER, LoginCredentials, NewUser, SignupRequest, User},
    oauth::{OAUTH_SESSION_TTL_SECONDS, OAuthProvider, OAuthSession},
    repositories::{hash_password, verify_password},
    validation::{normalize_email, validate_email, validate_signup},
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const EMAIL_TAKEN: &str = "Email already exists";

/// Query parameters the provider appends to the callback URL
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Create the router for the authentication endpoints
pub fn create_router(state: AuthState) -> Router {
    Router::new()
        .route("/auth/email/signup", post(signup))
        .route("/auth/email/login", post(login))
        .route("/auth/:provider/login", get(oauth_login))
        .route("/auth/:provider/callback", get(oauth_callback))
        .with_state(state)
}

fn issue_token(state: &AuthState, user: &User) -> AuthResult<String> {
    state.jwt_service.generate_token(user).map_err(|e| {
        error!("Failed to generate token: {}", e);
        AuthError::Internal("Failed to generate token".to_string())
    })
}

fn parse_provider(provider: &str) -> AuthResult<OAuthProvider> {
    provider.parse().map_err(AuthError::NotFound)
}

/// Email signup endpoint
pub async fn signup(
    State(state): State<AuthState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> AuthResult<Json<AuthResponse>> {
    let Json(payload) = payload.map_err(|e| AuthError::BadRequest(e.body_text()))?;

    validate_signup(&payload).map_err(AuthError::BadRequest)?;

    let email = normalize_email(&payload.email);
    info!("Signup attempt for {}", email);

    if state.user_repository.find_by_email(&email).await?.is_some() {
        return Err(AuthError::BadRequest(EMAIL_TAKEN.to_string()));
    }

    let password_hash = hash_password(&payload.password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        AuthError::Internal("Failed to hash password".to_string())
    })?;

    let new_user = NewUser {
        email,
        name: payload.name.trim().to_string(),
        password_hash: Some(password_hash),
        provider: EMAIL_PROVIDER.to_string(),
        profile_image: None,
    };

    // a concurrent signup can still win the race to the unique index
    let user = state.user_repository.create(&new_user).await.map_err(|e| {
        if e.is_unique_violation() {
            AuthError::BadRequest(EMAIL_TAKEN.to_string())
        } else {
            AuthError::Database(e)
        }
    })?;

    let token = issue_token(&state, &user)?;

    Ok(Json(AuthResponse {
        token,
        user: (&user).into(),
    }))
}

/// Email login endpoint
pub async fn login(
    State(state): State<AuthState>,
    payload: Result<Json<LoginCredentials>, JsonRejection>,
) -> AuthResult<Json<AuthResponse>> {
    let Json(payload) = payload.map_err(|e| AuthError::BadRequest(e.body_text()))?;

    validate_email(payload.email.trim()).map_err(AuthError::BadRequest)?;
    if payload.password.is_empty() {
        return Err(AuthError::BadRequest("Password is required".to_string()));
    }

    let email = normalize_email(&payload.email);

    if let Err(retry_after) = state.rate_limiter.check(&email).await {
        warn!(
            "Rate limited login for {}, retry in {}s",
            email,
            retry_after.as_secs()
        );
        return Err(AuthError::TooManyRequests);
    }

    let user = state
        .user_repository
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AuthError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    // OAuth-only accounts have no password to check against
    let verified = user
        .password_hash
        .as_deref()
        .is_some_and(|hash| verify_password(hash, &payload.password));

    if !verified {
        info!("Failed login for {}", email);
        return Err(AuthError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    state.rate_limiter.reset(&email).await;
    let token = issue_token(&state, &user)?;

    info!("User {} logged in", user.id);

    Ok(Json(AuthResponse {
        token,
        user: (&user).into(),
    }))
}

/// Redirect the browser to the provider's consent page
pub async fn oauth_login(
    State(state): State<AuthState>,
    Path(provider): Path<String>,
) -> AuthResult<impl IntoResponse> {
    let provider = parse_provider(&provider)?;
    let client = state
        .oauth
        .get(provider)
        .ok_or_else(|| AuthError::Provider(format!("{} OAuth is not configured", provider)))?;

    let (auth_url, csrf_token, pkce_verifier) = client.generate_auth_url();

    let created_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AuthError::Internal(e.to_string()))?
        .as_secs();
    let session = OAuthSession::new(provider, pkce_verifier.secret().clone(), created_at);

    state
        .redis_pool
        .set_json(
            &OAuthSession::key(csrf_token.secret()),
            &session,
            OAUTH_SESSION_TTL_SECONDS,
        )
        .await
        .map_err(|e| {
            error!("Failed to store OAuth state in Redis: {}", e);
            AuthError::Internal("Failed to start OAuth login".to_string())
        })?;

    Ok(Redirect::temporary(&auth_url))
}

/// Finish an OAuth login and hand the token to the frontend
pub async fn oauth_callback(
    State(state): State<AuthState>,
    Path(provider): Path<String>,
    Query(params): Query<OAuthCallbackParams>,
) -> AuthResult<impl IntoResponse> {
    let provider = parse_provider(&provider)?;

    let csrf_state = params
        .state
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AuthError::BadRequest("Missing OAuth state".to_string()))?;

    let client = state
        .oauth
        .get(provider)
        .ok_or_else(|| AuthError::Provider(format!("{} OAuth is not configured", provider)))?;

    let session: OAuthSession = state
        .redis_pool
        .take_json(&OAuthSession::key(&csrf_state))
        .await
        .map_err(|e| {
            error!("Failed to read OAuth state from Redis: {}", e);
            AuthError::Internal("Failed to complete OAuth login".to_string())
        })?
        .ok_or_else(|| AuthError::BadRequest("Invalid or expired OAuth state".to_string()))?;

    if session.provider != provider {
        return Err(AuthError::BadRequest(
            "Invalid or expired OAuth state".to_string(),
        ));
    }

    if let Some(reason) = params.error {
        return Err(AuthError::BadRequest(format!("OAuth login failed: {}", reason)));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::BadRequest("Missing authorization code".to_string()))?;

    let access_token = client
        .exchange_code(code, PkceCodeVerifier::new(session.pkce_verifier))
        .await
        .map_err(|e| AuthError::Provider(e.to_string()))?;

    let profile = client
        .get_user_profile(&access_token)
        .await
        .map_err(|e| AuthError::Provider(e.to_string()))?;

    let new_user = NewUser {
        email: normalize_email(&profile.email),
        name: profile.name,
        password_hash: None,
        provider: provider.as_str().to_string(),
        profile_image: profile.picture,
    };
    let user = state.user_repository.find_or_create_oauth(&new_user).await?;

    let token = issue_token(&state, &user)?;
    info!("User {} logged in with {}", user.id, provider);

    Ok(Redirect::temporary(&format!(
        "{}/login?token={}",
        state.frontend_url.trim_end_matches('/'),
        token
    )))
}
