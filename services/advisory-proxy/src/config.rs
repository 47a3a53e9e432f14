//! Proxy configuration.

use std::time::Duration;

use clap::Parser;

/// Aviation Weather Center data API.
pub const DEFAULT_UPSTREAM_URL: &str = "https://aviationweather.gov/api/data";

/// Cache entries stay fresh for one hour.
pub const DEFAULT_CACHE_TTL_MS: u64 = 3_600_000;

/// Advisory proxy server
#[derive(Parser, Debug, Clone)]
#[command(name = "advisory-proxy")]
#[command(about = "Caching proxy for SIGMET and AIRSIGMET advisories")]
pub struct ProxyConfig {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:3001", env = "PROXY_LISTEN_ADDR")]
    pub listen: String,

    /// Upstream data API base URL
    #[arg(long, default_value = DEFAULT_UPSTREAM_URL, env = "AWC_API_BASE_URL")]
    pub upstream_base_url: String,

    /// Cache time-to-live in milliseconds
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_MS, env = "PROXY_CACHE_TTL_MS")]
    pub cache_ttl_ms: u64,

    /// Upstream request timeout in seconds
    #[arg(long, default_value_t = 30, env = "PROXY_UPSTREAM_TIMEOUT_SECS")]
    pub upstream_timeout_secs: u64,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Number of worker threads
    #[arg(long, env = "PROXY_WORKER_THREADS")]
    pub worker_threads: Option<usize>,
}

impl ProxyConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3001".to_string(),
            upstream_base_url: DEFAULT_UPSTREAM_URL.to_string(),
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            upstream_timeout_secs: 30,
            log_level: "info".to_string(),
            worker_threads: None,
        }
    }
}
