//! Error types for the pyxis-client crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. Errors are `Clone` so that a single failed
//! fetch can be shared across coalesced cache waiters.

/// Errors that can occur during client-side search orchestration.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// An HTTP request to the backend or a suggestion source failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A response body could not be decoded into the expected JSON shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The backend answered with an error payload instead of results.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),

    /// A retried operation failed on every allowed attempt. Terminal for
    /// that operation; a fresh user action starts a new attempt counter.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    Exhausted {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// Display string of the last transient failure.
        last: String,
    },
}

impl ClientError {
    /// True if this error is the terminal outcome of an exhausted retry loop.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Convenience type alias for pyxis-client results.
pub type Result<T> = std::result::Result<T, ClientError>;
