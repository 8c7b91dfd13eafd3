//! Most recent plot URL per session, for clients that poll instead of reading
//! tool results.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

/// Retention and size limits for [`PlotUrlCache`].
#[derive(Debug, Clone, Copy)]
pub struct PlotUrlCacheConfig {
    pub ttl: Duration,
    pub max_entries: usize,
    pub sweep_interval: Duration,
}

impl PlotUrlCacheConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            max_entries: 1024,
            sweep_interval: Duration::from_secs(60),
        }
    }

    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub const fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    #[must_use]
    pub const fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }
}

impl Default for PlotUrlCacheConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// One cached URL, serialized as the body of the polling endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlotUrlEntry {
    pub session_id: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl PlotUrlEntry {
    fn expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        (now - self.created_at).to_std().unwrap_or_default() > ttl
    }
}

/// Session id to latest plot URL, with expiry checked on every access.
#[derive(Clone)]
pub struct PlotUrlCache {
    inner: Arc<PlotUrlCacheInner>,
}

struct PlotUrlCacheInner {
    entries: RwLock<HashMap<String, PlotUrlEntry>>,
    config: PlotUrlCacheConfig,
}

impl PlotUrlCache {
    #[must_use]
    pub fn new(config: PlotUrlCacheConfig) -> Self {
        Self {
            inner: Arc::new(PlotUrlCacheInner {
                entries: RwLock::new(HashMap::new()),
                config,
            }),
        }
    }

    /// Stores `url` as the latest plot for `session_id`.
    pub async fn record(&self, session_id: &str, url: &str) -> PlotUrlEntry {
        let now = Utc::now();
        let config = self.inner.config;
        let entry = PlotUrlEntry {
            session_id: session_id.to_string(),
            url: url.to_string(),
            created_at: now,
        };
        let mut map = self.inner.entries.write().await;
        map.retain(|_, entry| !entry.expired(now, config.ttl));
        if !map.contains_key(session_id) && map.len() >= config.max_entries {
            let oldest = map
                .values()
                .min_by_key(|entry| entry.created_at)
                .map(|entry| entry.session_id.clone());
            if let Some(oldest) = oldest {
                map.remove(&oldest);
            }
        }
        if config.max_entries > 0 {
            map.insert(session_id.to_string(), entry.clone());
        }
        entry
    }

    /// Latest unexpired entry for `session_id`.
    pub async fn get(&self, session_id: &str) -> Option<PlotUrlEntry> {
        let now = Utc::now();
        let ttl = self.inner.config.ttl;
        {
            let map = self.inner.entries.read().await;
            match map.get(session_id) {
                None => return None,
                Some(entry) if !entry.expired(now, ttl) => return Some(entry.clone()),
                Some(_) => {}
            }
        }
        let mut map = self.inner.entries.write().await;
        if map.get(session_id).is_some_and(|entry| entry.expired(now, ttl)) {
            map.remove(session_id);
        }
        None
    }

    pub async fn len(&self) -> usize {
        self.inner.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn evict_expired(&self) -> usize {
        let now = Utc::now();
        let ttl = self.inner.config.ttl;
        let mut map = self.inner.entries.write().await;
        let before = map.len();
        map.retain(|_, entry| !entry.expired(now, ttl));
        before.saturating_sub(map.len())
    }

    /// Periodically drops expired entries until the runtime shuts down.
    #[must_use]
    pub fn spawn_sweeper(self) -> tokio::task::JoinHandle<()> {
        let interval = self.inner.config.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let evicted = self.evict_expired().await;
                if evicted > 0 {
                    tracing::debug!(evicted, "swept expired plot URLs");
                }
            }
        })
    }
}

impl Default for PlotUrlCache {
    fn default() -> Self {
        Self::new(PlotUrlCacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn latest_url_wins() {
        let cache = PlotUrlCache::default();
        cache.record("alpha", "http://host/a.png").await;
        cache.record("alpha", "http://host/b.png").await;
        let entry = cache.get("alpha").await.expect("entry");
        assert_eq!(entry.url, "http://host/b.png");
        assert_eq!(cache.len().await, 1);
        assert!(cache.get("beta").await.is_none());
    }

    #[tokio::test]
    async fn expired_entries_vanish_on_read() {
        let cache = PlotUrlCache::new(PlotUrlCacheConfig::new().with_ttl(Duration::from_millis(1)));
        cache.record("alpha", "http://host/a.png").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(cache.get("alpha").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn sweeping_counts_evictions() {
        let cache = PlotUrlCache::new(PlotUrlCacheConfig::new().with_ttl(Duration::from_millis(1)));
        cache.record("alpha", "http://host/a.png").await;
        cache.record("beta", "http://host/b.png").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(cache.evict_expired().await, 2);
    }

    #[tokio::test]
    async fn capacity_drops_the_oldest_session() {
        let cache = PlotUrlCache::new(PlotUrlCacheConfig::new().with_max_entries(2));
        cache.record("first", "http://host/1.png").await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        cache.record("second", "http://host/2.png").await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        cache.record("third", "http://host/3.png").await;
        assert_eq!(cache.len().await, 2);
        assert!(cache.get("first").await.is_none());
        assert!(cache.get("third").await.is_some());
    }
}
