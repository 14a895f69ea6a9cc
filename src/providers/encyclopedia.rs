//! Rich entity suggestions from the public encyclopedia prefix-search API.
//!
//! Queries the MediaWiki `generator=prefixsearch` endpoint with
//! `formatversion=2`, asking for page descriptions and thumbnails in the
//! same round trip. This source is strictly best-effort: the caller
//! degrades any failure to an empty list.

use serde::Deserialize;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::http;
use crate::provider::RichSuggestionSource;
use crate::types::RichSuggestion;

/// Thumbnail edge length requested from the API, in pixels.
const THUMB_SIZE: u32 = 120;

/// The encyclopedia prefix-search API client.
#[derive(Debug, Clone)]
pub struct EncyclopediaSource {
    client: reqwest::Client,
    endpoint: Url,
}

#[derive(Debug, Deserialize)]
struct PrefixSearchResponse {
    #[serde(default)]
    query: Option<QueryBody>,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: Vec<PageEntry>,
}

#[derive(Debug, Deserialize)]
struct PageEntry {
    title: String,
    /// Prefix-search rank; pages arrive unordered in the JSON.
    #[serde(default)]
    index: i64,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    source: String,
}

impl EncyclopediaSource {
    /// Create a source from the client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if `encyclopedia_url` does not
    /// parse, or [`ClientError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.encyclopedia_url)
            .map_err(|e| ClientError::Config(format!("invalid encyclopedia_url: {e}")))?;
        Ok(Self {
            client: http::build_client(config)?,
            endpoint,
        })
    }
}

impl RichSuggestionSource for EncyclopediaSource {
    async fn prefix_search(&self, query: &str, limit: usize) -> Result<Vec<RichSuggestion>> {
        tracing::trace!(query, "encyclopedia prefix search");

        let params = [
            ("action", "query".to_owned()),
            ("format", "json".to_owned()),
            ("formatversion", "2".to_owned()),
            ("generator", "prefixsearch".to_owned()),
            ("gpssearch", query.to_owned()),
            ("gpslimit", limit.to_string()),
            ("prop", "pageimages|description".to_owned()),
            ("piprop", "thumbnail".to_owned()),
            ("pithumbsize", THUMB_SIZE.to_string()),
        ];

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&params)
            .send()
            .await
            .map_err(|e| ClientError::Http(format!("prefix search failed: {e}")))?
            .error_for_status()
            .map_err(|e| ClientError::Http(format!("prefix search HTTP error: {e}")))?;

        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Http(format!("prefix search read failed: {e}")))?;

        parse_prefix_search(&body, limit)
    }
}

/// Parse a prefix-search response body into ranked suggestions.
///
/// Extracted as a separate function for testability with mock JSON.
/// A response with no `query` object (no matches) parses to an empty list.
pub(crate) fn parse_prefix_search(body: &str, limit: usize) -> Result<Vec<RichSuggestion>> {
    let response: PrefixSearchResponse =
        serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))?;

    let mut pages = match response.query {
        Some(query) => query.pages,
        None => return Ok(vec![]),
    };
    pages.sort_by_key(|page| page.index);

    let suggestions: Vec<RichSuggestion> = pages
        .into_iter()
        .take(limit)
        .map(|page| RichSuggestion {
            title: page.title,
            description: page.description,
            thumbnail: page.thumbnail.map(|t| t.source),
        })
        .collect();

    tracing::debug!(count = suggestions.len(), "encyclopedia suggestions parsed");
    Ok(suggestions)
}
