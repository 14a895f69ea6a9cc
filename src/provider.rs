//! Trait definitions for pluggable backend providers.
//!
//! The orchestrators never talk HTTP directly: they go through
//! [`SearchProvider`] (the Pyxis search proxy) and [`RichSuggestionSource`]
//! (the encyclopedia prefix-search API). Implementations own URL
//! construction, request issuance, and JSON decoding; tests substitute
//! in-memory mocks.

use crate::error::Result;
use crate::types::{InstantAnswer, PageRequest, RichSuggestion, SearchPage};

/// The Pyxis backend search proxy.
///
/// All implementations must be `Send + Sync` so fetches can run on spawned
/// tasks and suggestion pairs can run concurrently.
pub trait SearchProvider: Send + Sync {
    /// Fetch one page of search results.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::ClientError`] if the request fails, the response
    /// cannot be decoded, or the backend answers with an error payload.
    fn fetch_page(
        &self,
        request: &PageRequest,
    ) -> impl std::future::Future<Output = Result<SearchPage>> + Send;

    /// Fetch keyword autocomplete suggestions for a partial query.
    fn autocomplete(
        &self,
        query: &str,
        max_results: usize,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;

    /// Fetch an instant answer for a query.
    fn instant(
        &self,
        query: &str,
    ) -> impl std::future::Future<Output = Result<InstantAnswer>> + Send;
}

/// A secondary, independent supplier of rich entity suggestions.
///
/// Failures from this source are always degraded to an empty list by the
/// caller; they never surface as user-visible errors.
pub trait RichSuggestionSource: Send + Sync {
    /// Prefix-search entities matching a partial query.
    fn prefix_search(
        &self,
        query: &str,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<RichSuggestion>>> + Send;
}
