//! Upstream advisory source.

use std::time::Duration;

use advisory_common::{Category, FeatureCollection};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::error::{ProxyError, ProxyResult};

/// Source of raw advisory payloads.
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    /// Fetch the GeoJSON payload for `category`.
    async fn fetch(&self, category: Category) -> ProxyResult<Bytes>;
}

/// The aviation weather data API.
pub struct AwcUpstream {
    client: Client,
    base_url: String,
}

impl AwcUpstream {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ProxyResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ProxyError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, category: Category) -> String {
        format!("{}/{}", self.base_url, category.spec().endpoint)
    }
}

#[async_trait]
impl UpstreamSource for AwcUpstream {
    #[instrument(skip(self), fields(category = %category))]
    async fn fetch(&self, category: Category) -> ProxyResult<Bytes> {
        let url = self.url_for(category);
        let response = self
            .client
            .get(&url)
            .query(&[("format", "geojson")])
            .send()
            .await
            .map_err(|source| ProxyError::Upstream { category, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::UpstreamStatus {
                category,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| ProxyError::Upstream { category, source })?;

        let collection = FeatureCollection::from_slice(&body).map_err(|e| ProxyError::InvalidPayload {
            category,
            message: e.to_string(),
        })?;
        debug!(features = collection.len(), bytes = body.len(), "Fetched upstream advisories");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_category() {
        let upstream = AwcUpstream::new("https://aviationweather.gov/api/data/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            upstream.url_for(Category::Sigmet),
            "https://aviationweather.gov/api/data/isigmet"
        );
        assert_eq!(
            upstream.url_for(Category::Airsigmet),
            "https://aviationweather.gov/api/data/airsigmet"
        );
    }
}
