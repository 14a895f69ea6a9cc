//! The network gate: cache in front, retry behind.
//!
//! [`SearchClient`] is the only component that issues backend calls. Every
//! request goes through a typed [`ResponseCache`] keyed by [`RequestKey`];
//! misses run the provider call under the appropriate [`RetryPolicy`].
//! Suggestion and instant-answer fetches are non-essential and degrade to
//! empty results instead of surfacing errors.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::ResponseCache;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::key::RequestKey;
use crate::provider::SearchProvider;
use crate::retry::{run_with_retry, RetryPolicy};
use crate::types::{InstantAnswer, PageRequest, SearchPage, SearchQuery};

struct ClientInner<P> {
    provider: P,
    config: ClientConfig,
    pages: ResponseCache<SearchPage>,
    suggestions: ResponseCache<Vec<String>>,
    instant: ResponseCache<InstantAnswer>,
}

/// Cached, retrying front door to a [`SearchProvider`]. Cheap to clone;
/// all clones share the caches.
pub struct SearchClient<P> {
    inner: Arc<ClientInner<P>>,
}

impl<P> Clone for SearchClient<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: SearchProvider> SearchClient<P> {
    /// Create a client over a provider.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::Config`] if the configuration is
    /// invalid.
    pub fn new(provider: P, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let search_window = Duration::from_secs(config.search_ttl_seconds);
        let instant_window = Duration::from_secs(config.instant_ttl_seconds);
        Ok(Self {
            inner: Arc::new(ClientInner {
                provider,
                pages: ResponseCache::new(search_window),
                suggestions: ResponseCache::new(search_window),
                instant: ResponseCache::new(instant_window),
                config,
            }),
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[cfg(test)]
    pub(crate) fn provider(&self) -> &P {
        &self.inner.provider
    }

    /// Build a page request for a query, honouring the configured
    /// per-page result override.
    pub fn page_request(&self, query: SearchQuery, page: u32) -> PageRequest {
        let mut request = PageRequest::new(query, page);
        if let Some(max_results) = self.inner.config.max_results {
            request.max_results = max_results;
        }
        request
    }

    /// Fetch page 1 of a query under the primary retry policy.
    pub async fn first_page(&self, request: &PageRequest) -> Result<SearchPage> {
        self.fetch_page(request, &self.inner.config.primary_retry)
            .await
    }

    /// Fetch an incremental page under the incremental retry policy.
    pub async fn next_page(&self, request: &PageRequest) -> Result<SearchPage> {
        self.fetch_page(request, &self.inner.config.page_retry).await
    }

    /// Cached-or-fetched page load. A fresh cache entry is served without
    /// a network call; otherwise the provider call runs under `policy` and
    /// only a success is stored.
    async fn fetch_page(&self, request: &PageRequest, policy: &RetryPolicy) -> Result<SearchPage> {
        let key = RequestKey::search(request);
        self.inner
            .pages
            .get_or_fetch(key, || {
                run_with_retry(policy, || self.inner.provider.fetch_page(request))
            })
            .await
    }

    /// Cached keyword suggestions. Degraded: failures produce an empty
    /// list, never an error.
    pub async fn suggestions(&self, query: &str) -> Vec<String> {
        let max_results = self.inner.config.max_suggestions;
        let key = RequestKey::autocomplete(query);
        let outcome = self
            .inner
            .suggestions
            .get_or_fetch(key, || self.inner.provider.autocomplete(query, max_results))
            .await;
        match outcome {
            Ok(suggestions) => suggestions,
            Err(err) => {
                tracing::debug!(error = %err, "keyword suggestions degraded to empty");
                Vec::new()
            }
        }
    }

    /// Cached instant answer. Degraded: failures produce `None`, never an
    /// error.
    pub async fn instant(&self, query: &str) -> Option<InstantAnswer> {
        let key = RequestKey::instant(query);
        let outcome = self
            .inner
            .instant
            .get_or_fetch(key, || self.inner.provider.instant(query))
            .await;
        match outcome {
            Ok(answer) => Some(answer),
            Err(err) => {
                tracing::debug!(error = %err, "instant answer degraded to none");
                None
            }
        }
    }
}
