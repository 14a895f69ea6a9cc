//! Client configuration with sensible defaults.
//!
//! [`ClientConfig`] controls the backend endpoint, dedup windows, retry
//! policies, pagination limits, and suggestion debounce behaviour. The
//! defaults match the production Pyxis deployment.

use crate::error::{ClientError, Result};
use crate::retry::RetryPolicy;

/// Default User-Agent sent to the backend and the encyclopedia API.
pub(crate) const DEFAULT_USER_AGENT: &str =
    concat!("pyxis-client/", env!("CARGO_PKG_VERSION"));

/// Configuration for the search client and its orchestrators.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the Pyxis search proxy, without a trailing slash.
    pub base_url: String,
    /// Endpoint of the encyclopedia prefix-search API.
    pub encyclopedia_url: String,
    /// Dedup window in seconds for search pages and keyword autocomplete.
    /// A cached response younger than this is served without a network call.
    pub search_ttl_seconds: u64,
    /// Dedup window in seconds for instant answers (slower-changing data).
    pub instant_ttl_seconds: u64,
    /// Hard ceiling on incremental pages per query.
    pub max_pages: u32,
    /// Results per page; `None` uses the per-kind default (text 10,
    /// images/videos 20).
    pub max_results: Option<usize>,
    /// Maximum keyword suggestions to request.
    pub max_suggestions: usize,
    /// Maximum rich entity suggestions to request.
    pub max_rich_suggestions: usize,
    /// Suggestion debounce in milliseconds: only the input value still
    /// current when this timer fires triggers fetches.
    pub debounce_ms: u64,
    /// Minimum input length (chars, trimmed) before suggestions are
    /// fetched; shorter input clears the dropdown synchronously.
    pub min_suggest_chars: usize,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Retry policy for page-one fetches.
    pub primary_retry: RetryPolicy,
    /// Retry policy for incremental page loads.
    pub page_retry: RetryPolicy,
    /// Custom User-Agent string. `None` uses the crate default.
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".into(),
            encyclopedia_url: "https://en.wikipedia.org/w/api.php".into(),
            search_ttl_seconds: 300,
            instant_ttl_seconds: 600,
            max_pages: 10,
            max_results: None,
            max_suggestions: 10,
            max_rich_suggestions: 4,
            debounce_ms: 250,
            min_suggest_chars: 2,
            timeout_seconds: 8,
            primary_retry: RetryPolicy::primary(),
            page_retry: RetryPolicy::incremental(),
            user_agent: None,
        }
    }
}

impl ClientConfig {
    /// Default configuration pointed at the given backend.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Validates this configuration, returning an error if any field is
    /// invalid.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(ClientError::Config("base_url must not be empty".into()));
        }
        if self.encyclopedia_url.trim().is_empty() {
            return Err(ClientError::Config(
                "encyclopedia_url must not be empty".into(),
            ));
        }
        if self.max_pages == 0 {
            return Err(ClientError::Config(
                "max_pages must be greater than 0".into(),
            ));
        }
        if self.max_results == Some(0) {
            return Err(ClientError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.max_suggestions == 0 {
            return Err(ClientError::Config(
                "max_suggestions must be greater than 0".into(),
            ));
        }
        if self.min_suggest_chars == 0 {
            return Err(ClientError::Config(
                "min_suggest_chars must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(ClientError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        self.primary_retry.validate()?;
        self.page_retry.validate()?;
        Ok(())
    }

    /// The User-Agent to send, falling back to the crate default.
    pub(crate) fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }
}
