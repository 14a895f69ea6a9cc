//! In-memory response cache with a time-bounded dedup window.
//!
//! Caches decoded backend responses keyed by [`RequestKey`]. Uses [`moka`]
//! for async-friendly caching: the TTL equals the dedup window, capacity is
//! bounded, and `try_get_with` gives single-flight coalescing — N concurrent
//! fetches for one key within the window issue at most one underlying call.
//! Failures are never stored, so a failed key stays eligible for immediate
//! retry.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache;

use crate::error::{ClientError, Result};
use crate::key::RequestKey;

/// Maximum number of cached responses per resource kind.
const MAX_CACHE_ENTRIES: u64 = 256;

/// A resolved response held by the cache.
///
/// Entries are superseded by a fresh insert, never mutated in place, and
/// evicted automatically once the dedup window elapses.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The decoded response payload.
    pub payload: T,
    /// When the payload was fetched.
    pub fetched_at: Instant,
}

/// A typed response cache for one resource kind.
pub struct ResponseCache<T> {
    entries: Cache<RequestKey, CacheEntry<T>>,
    window: Duration,
}

impl<T> ResponseCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a cache whose entries are reused for `window` after fetch.
    pub fn new(window: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(MAX_CACHE_ENTRIES)
                .time_to_live(window)
                .build(),
            window,
        }
    }

    /// Look up the entry for a key, if one is still within the window.
    pub async fn get(&self, key: &RequestKey) -> Option<CacheEntry<T>> {
        self.entries.get(key).await
    }

    /// Store a resolved payload, stamping its fetch time.
    pub async fn insert(&self, key: RequestKey, payload: T) {
        self.entries
            .insert(
                key,
                CacheEntry {
                    payload,
                    fetched_at: Instant::now(),
                },
            )
            .await;
    }

    /// True iff an entry exists and is younger than the dedup window.
    pub async fn is_fresh(&self, key: &RequestKey) -> bool {
        match self.entries.get(key).await {
            Some(entry) => entry.fetched_at.elapsed() < self.window,
            None => false,
        }
    }

    /// Serve the cached payload for `key`, or run `fetch` to produce it.
    ///
    /// Concurrent callers for the same key share a single in-flight fetch;
    /// the winner's result is stored and handed to every waiter. A failed
    /// fetch is propagated to all waiters and NOT cached.
    pub async fn get_or_fetch<F, Fut>(&self, key: RequestKey, fetch: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let canonical = key.canonical();
        let mut hit = true;
        let outcome = self
            .entries
            .try_get_with(key, async {
                hit = false;
                let payload = fetch().await?;
                Ok(CacheEntry {
                    payload,
                    fetched_at: Instant::now(),
                })
            })
            .await;

        match outcome {
            Ok(entry) => {
                if hit {
                    tracing::debug!(key = %canonical, "cache hit");
                } else {
                    tracing::trace!(key = %canonical, "fetched and cached");
                }
                Ok(entry.payload)
            }
            Err(err) => {
                tracing::debug!(key = %canonical, error = %err, "fetch failed, not cached");
                Err(unwrap_shared(err))
            }
        }
    }

    /// Drop the entry for a key, forcing the next request to refetch.
    pub async fn invalidate(&self, key: &RequestKey) {
        self.entries.invalidate(key).await;
    }
}

/// Unwrap the `Arc` moka uses to share an init error across waiters.
fn unwrap_shared(err: Arc<ClientError>) -> ClientError {
    Arc::try_unwrap(err).unwrap_or_else(|shared| (*shared).clone())
}
