//! Google Places autocomplete proxy

use anyhow::Result;
use tracing::info;

const AUTOCOMPLETE_URL: &str = "https://maps.googleapis.com/maps/api/place/autocomplete/json";

/// Places API configuration
#[derive(Debug, Clone, Default)]
pub struct PlacesConfig {
    pub api_key: Option<String>,
}

impl PlacesConfig {
    /// Create a new PlacesConfig from environment variables
    ///
    /// # Environment Variables
    /// - `GOOGLE_MAPS_API_KEY`: Places API key (autocomplete fails without it)
    pub fn from_env() -> Self {
        let api_key = std::env::var("GOOGLE_MAPS_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());

        PlacesConfig { api_key }
    }
}

/// Client for the Places autocomplete endpoint
#[derive(Clone)]
pub struct PlacesService {
    http: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl PlacesService {
    pub fn new(config: PlacesConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key,
            endpoint: AUTOCOMPLETE_URL.to_string(),
        }
    }

    /// Point the client at another autocomplete endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Fetch US geocode suggestions for `input`, returning Google's JSON untouched
    pub async fn autocomplete(&self, input: &str) -> Result<serde_json::Value> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("GOOGLE_MAPS_API_KEY is not configured"))?;

        info!("Fetching place suggestions for {:?}", input);

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("input", input),
                ("types", "geocode"),
                ("components", "country:us"),
                ("key", api_key),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Places API returned {}", response.status());
        }

        Ok(response.json().await?)
    }
}
