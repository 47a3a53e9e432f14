//! Application state for the advisory proxy.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::cache::ResponseCache;
use crate::config::ProxyConfig;
use crate::upstream::{AwcUpstream, UpstreamSource};

/// Shared application state.
pub struct AppState {
    /// Path-keyed payload cache.
    pub cache: ResponseCache,

    /// Where cache misses are fetched from.
    pub upstream: Arc<dyn UpstreamSource>,

    /// Renders `/metrics`; absent when no recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Create state talking to the configured upstream API.
    pub fn new(config: &ProxyConfig, prometheus: Option<PrometheusHandle>) -> Result<Self> {
        let upstream = AwcUpstream::new(&config.upstream_base_url, config.upstream_timeout())
            .context("Failed to create upstream client")?;
        Ok(Self {
            cache: ResponseCache::new(config.cache_ttl()),
            upstream: Arc::new(upstream),
            prometheus,
        })
    }

    /// Create state around any upstream source.
    pub fn with_upstream(upstream: Arc<dyn UpstreamSource>, ttl: Duration) -> Self {
        Self {
            cache: ResponseCache::new(ttl),
            upstream,
            prometheus: None,
        }
    }
}
