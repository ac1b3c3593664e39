//! In-memory response cache in front of a transport.
//!
//! Entries go through three ages: fresh (served directly), stale (served while
//! a single background refresh runs) and expired (dropped on lookup).

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use reqwest::Method;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use crate::domain::entities::{HttpRequest, ResponseEnvelope};
use crate::domain::ports::TransportPort;
use crate::infrastructure::config::CacheConfig;

type CacheKey = (Method, String);
type Entries = Arc<Mutex<LruCache<CacheKey, CacheEntry>>>;

#[derive(Debug, Clone)]
struct CacheEntry {
    envelope: ResponseEnvelope,
    stored_at: Instant,
    refreshing: bool,
}

enum Lookup {
    Fresh(ResponseEnvelope),
    Stale {
        envelope: ResponseEnvelope,
        refresh: bool,
    },
    Expired,
}

/// Caching decorator for any [`TransportPort`].
///
/// Only successful GET and HEAD requests without a body are stored, keyed by
/// method and URL without fragment. Requests carrying cookies always reach the
/// inner transport so the cookies land in its jar. A cached response is judged
/// again against the success rules of the request it is served to.
pub struct ResponseCache {
    inner: Arc<dyn TransportPort>,
    entries: Entries,
    fresh_ttl: Duration,
    stale_grace: Duration,
    disabled: bool,
    update_url: Option<String>,
    hits: AtomicU64,
    stale_hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    /// Wraps `inner` with the configured cache policy.
    ///
    /// Requests to `update_url` always reach the network.
    #[must_use]
    pub fn new(inner: Arc<dyn TransportPort>, config: &CacheConfig, update_url: Option<&Url>) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
            fresh_ttl: config.fresh_ttl(),
            stale_grace: config.stale_grace(),
            disabled: config.disabled,
            update_url: update_url.map(cache_url),
            hits: AtomicU64::new(0),
            stale_hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Drops every cached response for `url`, whatever the method.
    pub fn invalidate(&self, url: &Url) {
        let target = cache_url(url);
        let mut entries = self.entries.lock();
        let keys: Vec<CacheKey> = entries
            .iter()
            .filter(|((_, cached), _)| *cached == target)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &keys {
            entries.pop(key);
        }

        if !keys.is_empty() {
            debug!(url = %target, count = keys.len(), "Invalidated cached responses");
        }
    }

    /// Drops every cached response.
    pub fn clear(&self) {
        self.entries.lock().clear();
        debug!("Cleared response cache");
    }

    /// Number of cached responses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns cache statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let stale_hits = self.stale_hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + stale_hits + misses;
        let hit_rate = if total > 0 {
            ((hits + stale_hits) as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        CacheStats {
            hits,
            stale_hits,
            misses,
            hit_rate,
            size: self.len(),
        }
    }

    fn lookup(&self, key: &CacheKey) -> Option<Lookup> {
        let mut entries = self.entries.lock();
        let age_limit = self.fresh_ttl + self.stale_grace;

        let lookup = entries.get_mut(key).map(|entry| {
            let age = entry.stored_at.elapsed();
            if age < self.fresh_ttl {
                Lookup::Fresh(entry.envelope.clone())
            } else if age < age_limit {
                let refresh = !entry.refreshing;
                entry.refreshing = true;
                Lookup::Stale {
                    envelope: entry.envelope.clone(),
                    refresh,
                }
            } else {
                Lookup::Expired
            }
        });

        if matches!(lookup, Some(Lookup::Expired)) {
            entries.pop(key);
        }

        lookup
    }

    fn spawn_refresh(&self, key: CacheKey, request: HttpRequest) {
        let inner = Arc::clone(&self.inner);
        let entries = Arc::clone(&self.entries);
        // The caller's token must not cut the refresh short.
        let request = request.with_cancellation(CancellationToken::new());

        tokio::spawn(async move {
            let envelope = inner.send(request).await;
            let mut entries = entries.lock();
            if envelope.is_ok() {
                debug!(url = %key.1, "Refreshed cached response");
                entries.put(key, CacheEntry::new(envelope));
            } else if let Some(entry) = entries.get_mut(&key) {
                entry.refreshing = false;
            }
        });
    }

    async fn fetch_and_store(&self, key: CacheKey, request: HttpRequest) -> ResponseEnvelope {
        let envelope = self.inner.send(request).await;
        if envelope.is_ok() {
            self.entries.lock().put(key, CacheEntry::new(envelope.clone()));
        }
        envelope
    }
}

impl CacheEntry {
    fn new(envelope: ResponseEnvelope) -> Self {
        Self {
            envelope,
            stored_at: Instant::now(),
            refreshing: false,
        }
    }
}

#[async_trait]
impl TransportPort for ResponseCache {
    async fn send(&self, request: HttpRequest) -> ResponseEnvelope {
        if self.disabled || !request.is_idempotent_read() || !request.cookies().is_empty() {
            return self.inner.send(request).await;
        }

        let key: CacheKey = (request.method().clone(), cache_url(request.url()));

        if self.update_url.as_deref() == Some(key.1.as_str()) {
            self.invalidate(request.url());
        }

        match self.lookup(&key) {
            Some(Lookup::Fresh(envelope)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(url = %key.1, "Response cache hit");
                envelope.judged_by(&request)
            }
            Some(Lookup::Stale { envelope, refresh }) => {
                self.stale_hits.fetch_add(1, Ordering::Relaxed);
                trace!(url = %key.1, refresh, "Serving stale response");
                let envelope = envelope.judged_by(&request);
                if refresh {
                    self.spawn_refresh(key, request);
                }
                envelope
            }
            Some(Lookup::Expired) | None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                trace!(url = %key.1, "Response cache miss");
                self.fetch_and_store(key, request).await
            }
        }
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Responses served fresh.
    pub hits: u64,
    /// Responses served stale while refreshing.
    pub stale_hits: u64,
    /// Lookups that went to the network.
    pub misses: u64,
    /// Hit rate as a percentage, stale hits included.
    pub hit_rate: f64,
    /// Current number of cached responses.
    pub size: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} responses, {:.1}% hit rate ({} hits, {} stale, {} misses)",
            self.size, self.hit_rate, self.hits, self.stale_hits, self.misses
        )
    }
}

fn cache_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.into()
}
