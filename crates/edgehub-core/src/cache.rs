//! Edge response cache keyed by normalized request URL.
//!
//! The gateway reads the cache before any upstream call and writes to it only
//! after a provider chain resolves successfully. Writes are fire-and-forget:
//! see [`spawn_store`].

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

/// TTL classes used by the aggregation routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTier {
    Generic,
    WeatherNow,
    DailyForecast,
    ExchangeRates,
}

impl CacheTier {
    pub const fn ttl(self) -> Duration {
        match self {
            Self::Generic => Duration::from_secs(30),
            Self::WeatherNow => Duration::from_secs(120),
            Self::DailyForecast => Duration::from_secs(900),
            Self::ExchangeRates => Duration::from_secs(21_600),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::WeatherNow => "weather_now",
            Self::DailyForecast => "daily_forecast",
            Self::ExchangeRates => "exchange_rates",
        }
    }

    /// `Cache-Control` value advertised to clients; must match the stored TTL.
    pub fn cache_control(self) -> String {
        cache_control_value(self.ttl())
    }
}

pub fn cache_control_value(ttl: Duration) -> String {
    format!("public, max-age={}", ttl.as_secs())
}

/// Canonical request URL: scheme, lower-cased host, path and query in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(scheme: &str, host: &str, path: &str, query: Option<&str>) -> Self {
        let mut key = format!(
            "{}://{}{}",
            scheme.to_ascii_lowercase(),
            host.to_ascii_lowercase(),
            if path.is_empty() { "/" } else { path }
        );
        if let Some(query) = query.filter(|query| !query.is_empty()) {
            key.push('?');
            key.push_str(query);
        }
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A complete response exactly as it was sent to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl CachedResponse {
    /// JSON response carrying the `Cache-Control` header for `tier`.
    pub fn json(status: u16, body: impl Into<Bytes>, tier: CacheTier) -> Self {
        Self {
            status,
            headers: vec![
                (String::from("content-type"), String::from("application/json")),
                (String::from("cache-control"), tier.cache_control()),
            ],
            body: body.into(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache is full ({capacity} entries)")]
    Full { capacity: usize },
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

pub type LookupFuture<'a> = Pin<Box<dyn Future<Output = Option<CachedResponse>> + Send + 'a>>;
pub type StoreFuture<'a> = Pin<Box<dyn Future<Output = Result<(), CacheError>> + Send + 'a>>;

/// Cache facade contract. Implementations must be safe to share across requests.
pub trait EdgeCache: Send + Sync {
    /// Returns a non-expired entry. Never revalidates upstream.
    fn lookup<'a>(&'a self, key: &'a CacheKey) -> LookupFuture<'a>;

    fn store<'a>(&'a self, key: CacheKey, response: CachedResponse, ttl: Duration) -> StoreFuture<'a>;
}

/// Schedules a store on the runtime without waiting for it.
///
/// Failures are logged and otherwise ignored, so the client-facing response
/// is never delayed or altered by the cache backend.
pub fn spawn_store(
    cache: Arc<dyn EdgeCache>,
    key: CacheKey,
    response: CachedResponse,
    ttl: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let key_text = key.to_string();
        match cache.store(key, response, ttl).await {
            Ok(()) => debug!(key = %key_text, ttl_secs = ttl.as_secs(), "cache populated"),
            Err(error) => warn!(key = %key_text, %error, "cache store failed"),
        }
    })
}

#[derive(Debug, Clone)]
struct CacheEntry {
    response: CachedResponse,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<CacheKey, CacheEntry>,
    capacity: usize,
}

impl CacheInner {
    fn get(&self, key: &CacheKey) -> Option<CachedResponse> {
        self.map.get(key).and_then(|entry| {
            if Instant::now() < entry.expires_at {
                Some(entry.response.clone())
            } else {
                None
            }
        })
    }

    fn put(&mut self, key: CacheKey, response: CachedResponse, ttl: Duration) -> Result<(), CacheError> {
        if !self.map.contains_key(&key) && self.map.len() >= self.capacity {
            self.purge_expired();
            if self.map.len() >= self.capacity {
                return Err(CacheError::Full {
                    capacity: self.capacity,
                });
            }
        }

        let expires_at = Instant::now() + ttl;
        self.map.insert(key, CacheEntry { response, expires_at });
        Ok(())
    }

    fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.map.len();
        self.map.retain(|_, entry| entry.expires_at > now);
        before - self.map.len()
    }
}

/// In-process edge cache with per-entry TTL and a bounded entry count.
#[derive(Debug, Clone)]
pub struct MemoryEdgeCache {
    inner: Arc<tokio::sync::RwLock<CacheInner>>,
}

impl MemoryEdgeCache {
    pub const DEFAULT_CAPACITY: usize = 4_096;

    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner {
                map: HashMap::new(),
                capacity,
            })),
        }
    }

    /// Remove expired entries, returning how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let mut store = self.inner.write().await;
        store.purge_expired()
    }

    /// Number of entries held (including expired ones not yet purged).
    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Periodically purge expired entries until the runtime shuts down.
    pub fn spawn_sweeper(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = cache.purge_expired().await;
                if purged > 0 {
                    debug!(purged, "purged expired cache entries");
                }
            }
        })
    }
}

impl Default for MemoryEdgeCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl EdgeCache for MemoryEdgeCache {
    fn lookup<'a>(&'a self, key: &'a CacheKey) -> LookupFuture<'a> {
        Box::pin(async move { self.inner.read().await.get(key) })
    }

    fn store<'a>(&'a self, key: CacheKey, response: CachedResponse, ttl: Duration) -> StoreFuture<'a> {
        Box::pin(async move {
            if ttl.is_zero() {
                return Ok(());
            }
            self.inner.write().await.put(key, response, ttl)
        })
    }
}
