//! URL construction for the reference tickers endpoint

use crate::client::PolygonConfig;

use eyre::{Context, Result, eyre};
use url::Url;

/// Page size requested from the provider
pub const DEFAULT_LIMIT: u32 = 1000;

const TICKERS_PATH: &str = "v3/reference/tickers";

/// Query for all active stock tickers, ascending by symbol
#[derive(Clone, Debug)]
pub struct TickersQuery {
    base_url: Url,
    api_key: Option<String>,
    limit: u32,
}

/// Base URLs are directories: `http://proxy/polygon` joins as `http://proxy/polygon/`
fn as_directory(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

impl TickersQuery {
    /// Create a query against the given API base URL
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            base_url: as_directory(base_url),
            api_key: Some(api_key.into()),
            limit: DEFAULT_LIMIT,
        }
    }

    /// Create a query from client settings
    ///
    /// A missing API key is reported when the first URL is built.
    pub fn from_config(config: &PolygonConfig) -> Self {
        Self {
            base_url: as_directory(config.base_url.clone()),
            api_key: config.api_key.clone(),
            limit: DEFAULT_LIMIT,
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| eyre!("POLYGON_API_KEY environment variable not set"))
    }

    /// Set the page size limit (default: 1000)
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// URL of the first page
    pub fn first_page(&self) -> Result<Url> {
        let api_key = self.api_key()?;
        let mut url = self
            .base_url
            .join(TICKERS_PATH)
            .with_context(|| format!("Invalid Polygon base URL: {}", self.base_url))?;
        url.query_pairs_mut()
            .append_pair("market", "stocks")
            .append_pair("active", "true")
            .append_pair("order", "asc")
            .append_pair("limit", &self.limit.to_string())
            .append_pair("sort", "ticker")
            .append_pair("apiKey", api_key);
        Ok(url)
    }

    /// URL for a provider-returned `next_url`, with the API key re-appended
    pub fn continuation(&self, next_url: &str) -> Result<Url> {
        let api_key = self.api_key()?;
        let mut url =
            Url::parse(next_url).with_context(|| format!("Invalid next_url: {}", next_url))?;
        url.query_pairs_mut().append_pair("apiKey", api_key);
        Ok(url)
    }
}
