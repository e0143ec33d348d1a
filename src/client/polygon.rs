//! Polygon.io client module
//!
//! Provides `PolygonClient`, a plain HTTP client that fetches API pages.
//! URLs (including the `apiKey` parameter) are built by the caller.

use crate::polygon::PageSource;
use eyre::{Context, Result, eyre};
use reqwest::Client;
use url::Url;

/// Default Polygon.io REST API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";

/// Polygon.io API settings
#[derive(Clone, Debug)]
pub struct PolygonConfig {
    /// Checked when the first request is built, not at load time
    pub api_key: Option<String>,
    pub base_url: Url,
}

impl PolygonConfig {
    pub fn new(api_key: impl Into<String>, base_url: Url) -> Self {
        Self {
            api_key: Some(api_key.into()),
            base_url,
        }
    }

    /// Load settings from environment variables
    ///
    /// Expected environment variables:
    /// - POLYGON_API_KEY: API key (required by the first request)
    /// - POLYGON_BASE_URL: API base URL (optional, defaults to https://api.polygon.io)
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("POLYGON_API_KEY")
            .ok()
            .filter(|v| !v.is_empty());
        let base_str =
            std::env::var("POLYGON_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&base_str)
            .with_context(|| format!("Invalid POLYGON_BASE_URL: {}", base_str))?;
        Ok(Self { api_key, base_url })
    }
}

/// HTTP client for Polygon.io
///
/// No request timeout is set: a stalled response blocks the run.
#[derive(Clone, Debug)]
pub struct PolygonClient {
    client: Client,
    config: PolygonConfig,
}

impl PolygonClient {
    /// Create a new client
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn try_new(config: PolygonConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::ACCEPT, "application/json".parse()?);
        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self { client, config })
    }

    /// Get the base URL.
    pub fn url(&self) -> &Url {
        &self.config.base_url
    }

    /// Send a GET request and return the response body
    async fn get_text(&self, url: &Url) -> Result<String> {
        log::trace!("GET {}{}", url.origin().ascii_serialization(), url.path());

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| eyre!("Failed to send request: {}", e.without_url()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            eyre::bail!("Polygon request failed ({}): {}", status, body);
        }

        response
            .text()
            .await
            .with_context(|| "Failed to read Polygon response")
    }
}

impl PageSource for PolygonClient {
    async fn get_page(&self, url: &Url) -> Result<String> {
        self.get_text(url).await
    }
}

impl std::fmt::Display for PolygonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.config.base_url)
    }
}
