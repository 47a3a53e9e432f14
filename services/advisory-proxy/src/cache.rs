//! Response caching keyed by request path.
//!
//! Each entry holds the payload bytes and the instant they were stored. An
//! entry is served while its age is below the TTL; stale entries are simply
//! overwritten by the next successful fetch. There is no other eviction.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Cached payload with store timestamp.
struct CachedResponse {
    payload: Bytes,
    stored_at: Instant,
}

/// Path-keyed TTL cache of upstream payloads.
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CachedResponse>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        info!(ttl_ms = ttl.as_millis() as u64, "Initializing response cache");
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Cached payload for `key` if still fresh.
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        let guard = self.entries.read().await;
        let cached = guard.get(key)?;
        if cached.stored_at.elapsed() < self.ttl {
            debug!(key = key, "Cache hit");
            return Some(cached.payload.clone());
        }
        debug!(key = key, "Cache entry expired");
        None
    }

    /// Store `payload` under `key`, stamped now.
    pub async fn insert(&self, key: impl Into<String>, payload: Bytes) {
        let key = key.into();
        debug!(key = %key, bytes = payload.len(), "Caching response");
        let mut guard = self.entries.write().await;
        guard.insert(
            key,
            CachedResponse {
                payload,
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of stored entries, fresh or stale.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
