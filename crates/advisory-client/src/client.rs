//! HTTP client for `GET /isigmet` and `GET /airsigmet`.

use std::sync::Arc;
use std::time::Duration;

use advisory_common::{Category, FeatureCollection};
use futures::future::join_all;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::error::{ClientError, ClientResult};

/// Proxy location used when none is configured.
pub const DEFAULT_PROXY_URL: &str = "http://localhost:3001";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Proxy base URL, without trailing slash.
    pub base_url: String,
    /// Whole-request timeout.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PROXY_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Defaults with the base URL taken from `ADVISORY_PROXY_URL` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("ADVISORY_PROXY_URL") {
            if !url.is_empty() {
                config.base_url = url;
            }
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Fetches advisory datasets from the proxy.
#[derive(Debug, Clone)]
pub struct AdvisoryClient {
    http: Client,
    base_url: String,
}

impl AdvisoryClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self::with_client(http, config.base_url))
    }

    /// Use an existing `reqwest` client.
    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL serving `category`.
    pub fn url_for(&self, category: Category) -> String {
        format!("{}/{}", self.base_url, category.spec().endpoint)
    }

    /// Fetch one category, reporting failures.
    #[instrument(skip(self), fields(category = %category))]
    pub async fn try_fetch(&self, category: Category) -> ClientResult<FeatureCollection> {
        let url = self.url_for(category);
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                category,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let collection = FeatureCollection::from_slice(&body)?;
        debug!(features = collection.len(), bytes = body.len(), "Fetched advisories");
        Ok(collection)
    }

    /// Fetch one category; any failure yields an empty collection.
    pub async fn fetch(&self, category: Category) -> FeatureCollection {
        match self.try_fetch(category).await {
            Ok(collection) => collection,
            Err(e) => {
                warn!(category = %category, error = %e, "Advisory fetch failed; using empty collection");
                FeatureCollection::new()
            }
        }
    }

    /// Fetch every category concurrently.
    pub async fn fetch_all(&self) -> Vec<(Category, Arc<FeatureCollection>)> {
        let fetches = Category::ALL.map(|category| async move {
            (category, Arc::new(self.fetch(category).await))
        });
        join_all(fetches).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_category() {
        let client = AdvisoryClient::with_client(Client::new(), "http://proxy:3001/");
        assert_eq!(client.url_for(Category::Sigmet), "http://proxy:3001/isigmet");
        assert_eq!(client.url_for(Category::Airsigmet), "http://proxy:3001/airsigmet");
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default().with_base_url("http://example");
        assert_eq!(config.base_url, "http://example");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_unreachable_proxy_degrades_to_empty() {
        // Port 9 (discard) is not expected to serve HTTP
        let config = ClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(1),
        };
        let client = AdvisoryClient::new(config).unwrap();
        let collection = client.fetch(Category::Sigmet).await;
        assert!(collection.is_empty());
    }
}
