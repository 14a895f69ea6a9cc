//! Shared HTTP client construction for backend and encyclopedia requests.
//!
//! Provides a configured [`reqwest::Client`] with the crate User-Agent,
//! per-request timeout, and transparent gzip/brotli decompression. Built
//! once per provider and reused across requests.

use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Build a [`reqwest::Client`] from the client configuration.
///
/// # Errors
///
/// Returns [`ClientError::Http`] if the client cannot be constructed.
pub fn build_client(config: &ClientConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(config.user_agent().to_owned())
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| ClientError::Http(format!("failed to build HTTP client: {e}")))
}
