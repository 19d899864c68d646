//! OAuth2 integration for Google and Facebook providers

use anyhow::Result;
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl, basic::BasicClient,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Seconds an OAuth login may take between redirect and callback
pub const OAUTH_SESSION_TTL_SECONDS: u64 = 600;

/// OAuth2 provider types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Facebook,
}

impl OAuthProvider {
    /// Get the provider name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Facebook => "facebook",
        }
    }

    fn auth_url(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "https://accounts.google.com/o/oauth2/auth",
            OAuthProvider::Facebook => "https://www.facebook.com/v3.2/dialog/oauth",
        }
    }

    fn token_url(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "https://oauth2.googleapis.com/token",
            OAuthProvider::Facebook => "https://graph.facebook.com/v3.2/oauth/access_token",
        }
    }

    /// Scopes requested at authorization time
    pub fn scopes(&self) -> &'static [&'static str] {
        match self {
            OAuthProvider::Google => &[
                "https://www.googleapis.com/auth/userinfo.email",
                "https://www.googleapis.com/auth/userinfo.profile",
            ],
            OAuthProvider::Facebook => &["email", "public_profile"],
        }
    }

    /// Endpoint returning the signed-in user's profile
    pub fn userinfo_url(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "https://www.googleapis.com/oauth2/v2/userinfo",
            OAuthProvider::Facebook => "https://graph.facebook.com/me?fields=id,name,email",
        }
    }

    fn env_prefix(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "GOOGLE",
            OAuthProvider::Facebook => "FACEBOOK",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(OAuthProvider::Google),
            "facebook" => Ok(OAuthProvider::Facebook),
            other => Err(format!("Unsupported OAuth provider: {}", other)),
        }
    }
}

/// OAuth2 configuration for a provider
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub provider: OAuthProvider,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

impl OAuthConfig {
    /// Read a provider's credentials from the environment.
    ///
    /// Returns `None` when `{PROVIDER}_CLIENT_ID` or `{PROVIDER}_CLIENT_SECRET`
    /// is unset or empty. The callback URL is
    /// `{OAUTH_REDIRECT_BASE_URL}/auth/{provider}/callback`, with the base
    /// defaulting to `http://localhost:8080`.
    pub fn from_env(provider: OAuthProvider) -> Option<Self> {
        let prefix = provider.env_prefix();
        let client_id = std::env::var(format!("{prefix}_CLIENT_ID"))
            .ok()
            .filter(|v| !v.is_empty())?;
        let client_secret = std::env::var(format!("{prefix}_CLIENT_SECRET"))
            .ok()
            .filter(|v| !v.is_empty())?;

        let base = std::env::var("OAUTH_REDIRECT_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());
        let redirect_url = format!(
            "{}/auth/{}/callback",
            base.trim_end_matches('/'),
            provider.as_str()
        );

        Some(OAuthConfig {
            provider,
            client_id,
            client_secret,
            redirect_url,
        })
    }

    pub fn google_from_env() -> Option<Self> {
        Self::from_env(OAuthProvider::Google)
    }

    pub fn facebook_from_env() -> Option<Self> {
        Self::from_env(OAuthProvider::Facebook)
    }
}

/// OAuth2 client wrapper
#[derive(Clone)]
pub struct OAuthClient {
    provider: OAuthProvider,
    client: BasicClient,
    http: reqwest::Client,
}

impl OAuthClient {
    /// Create a new OAuth2 client for the configured provider
    pub fn new(config: OAuthConfig) -> Result<Self> {
        let provider = config.provider;
        let client = BasicClient::new(
            ClientId::new(config.client_id),
            Some(ClientSecret::new(config.client_secret)),
            AuthUrl::new(provider.auth_url().to_string())?,
            Some(TokenUrl::new(provider.token_url().to_string())?),
        )
        .set_auth_type(AuthType::RequestBody)
        .set_redirect_uri(RedirectUrl::new(config.redirect_url)?);

        Ok(Self {
            provider,
            client,
            http: reqwest::Client::new(),
        })
    }

    /// Generate authorization URL with PKCE
    pub fn generate_auth_url(&self) -> (String, CsrfToken, PkceCodeVerifier) {
        info!("Generating authorization URL for {}", self.provider);

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut request = self
            .client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge);

        for scope in self.provider.scopes() {
            request = request.add_scope(Scope::new(scope.to_string()));
        }

        let (auth_url, csrf_token) = request.url();

        (auth_url.to_string(), csrf_token, pkce_verifier)
    }

    /// Exchange authorization code for an access token
    pub async fn exchange_code(&self, code: String, pkce_verifier: PkceCodeVerifier) -> Result<String> {
        info!("Exchanging authorization code with {}", self.provider);

        let token_response = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| anyhow::anyhow!("Token exchange with {} failed: {}", self.provider, e))?;

        Ok(token_response.access_token().secret().clone())
    }

    /// Get user profile information from the provider
    pub async fn get_user_profile(&self, access_token: &str) -> Result<OAuthUserProfile> {
        info!("Getting user profile from {}", self.provider);

        let response = self
            .http
            .get(self.provider.userinfo_url())
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to get {} user profile: {}",
                self.provider,
                response.status()
            );
        }

        match self.provider {
            OAuthProvider::Google => {
                let user: GoogleUser = response.json().await?;
                Ok(user.into())
            }
            OAuthProvider::Facebook => {
                let user: FacebookUser = response.json().await?;
                OAuthUserProfile::try_from(user)
            }
        }
    }

    /// Get the provider
    pub fn provider(&self) -> OAuthProvider {
        self.provider
    }
}

/// Google user profile response
#[derive(Debug, Deserialize)]
struct GoogleUser {
    id: String,
    email: String,
    #[serde(default)]
    name: String,
    picture: Option<String>,
}

impl From<GoogleUser> for OAuthUserProfile {
    fn from(user: GoogleUser) -> Self {
        OAuthUserProfile {
            provider_id: user.id,
            email: user.email,
            name: user.name,
            picture: user.picture,
            provider: OAuthProvider::Google,
        }
    }
}

/// Facebook Graph `me` response
#[derive(Debug, Deserialize)]
struct FacebookUser {
    id: String,
    #[serde(default)]
    name: String,
    email: Option<String>,
}

impl TryFrom<FacebookUser> for OAuthUserProfile {
    type Error = anyhow::Error;

    fn try_from(user: FacebookUser) -> Result<Self> {
        let email = user
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Facebook account {} has no email", user.id))?;

        Ok(OAuthUserProfile {
            picture: Some(format!(
                "https://graph.facebook.com/{}/picture?type=large",
                user.id
            )),
            provider_id: user.id,
            email,
            name: user.name,
            provider: OAuthProvider::Facebook,
        })
    }
}

/// OAuth user profile information
#[derive(Debug, Clone)]
pub struct OAuthUserProfile {
    pub provider_id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub provider: OAuthProvider,
}

/// OAuth login state kept in Redis between redirect and callback
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct OAuthSession {
    pub provider: OAuthProvider,
    pub pkce_verifier: String,
    pub created_at: u64,
}

impl OAuthSession {
    /// Create a new OAuth session
    pub fn new(provider: OAuthProvider, pkce_verifier: String, created_at: u64) -> Self {
        Self {
            provider,
            pkce_verifier,
            created_at,
        }
    }

    /// Redis key for the session, derived from the CSRF state parameter
    pub fn key(state: &str) -> String {
        format!("oauth_state:{}", state)
    }
}

/// The OAuth clients that have credentials configured
#[derive(Clone, Default)]
pub struct OAuthProviders {
    pub google: Option<OAuthClient>,
    pub facebook: Option<OAuthClient>,
}

impl OAuthProviders {
    /// Build clients for every provider whose credentials are present
    pub fn from_env() -> Result<Self> {
        let google = OAuthConfig::google_from_env()
            .map(OAuthClient::new)
            .transpose()?;
        let facebook = OAuthConfig::facebook_from_env()
            .map(OAuthClient::new)
            .transpose()?;

        for (provider, client) in [
            (OAuthProvider::Google, &google),
            (OAuthProvider::Facebook, &facebook),
        ] {
            if client.is_none() {
                info!("{} OAuth login disabled: credentials not configured", provider);
            }
        }

        Ok(Self { google, facebook })
    }

    /// Look up the client for a provider
    pub fn get(&self, provider: OAuthProvider) -> Option<&OAuthClient> {
        match provider {
            OAuthProvider::Google => self.google.as_ref(),
            OAuthProvider::Facebook => self.facebook.as_ref(),
        }
    }
}
