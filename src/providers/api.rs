//! HTTP provider for the Pyxis search proxy.
//!
//! Implements [`SearchProvider`] over the proxy's three JSON endpoints:
//! `GET /search`, `GET /autocomplete`, and `GET /instant`. The proxy
//! answers errors either as non-2xx statuses or as 2xx bodies carrying an
//! `error` field; both map to [`ClientError`] variants here.

use serde::Deserialize;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::http;
use crate::key::ResourceKind;
use crate::provider::SearchProvider;
use crate::types::{InstantAnswer, PageRequest, SearchPage};

/// The Pyxis search proxy, spoken to over HTTP.
#[derive(Debug, Clone)]
pub struct ApiProvider {
    client: reqwest::Client,
    /// Base URL with any trailing slash removed.
    base: String,
}

/// `GET /autocomplete` response body.
#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    #[serde(default)]
    suggestions: Vec<String>,
}

/// Error payload the proxy returns in a 2xx body.
#[derive(Debug, Deserialize)]
struct UpstreamError {
    error: Option<String>,
}

impl ApiProvider {
    /// Create a provider from the client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if `base_url` does not parse, or
    /// [`ClientError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base = config.base_url.trim_end_matches('/').to_owned();
        Url::parse(&base).map_err(|e| ClientError::Config(format!("invalid base_url: {e}")))?;
        Ok(Self {
            client: http::build_client(config)?,
            base,
        })
    }

    /// Build the full URL for one of the proxy's endpoints.
    fn endpoint(&self, kind: ResourceKind) -> Result<Url> {
        let raw = format!("{}/{}", self.base, kind.path());
        Url::parse(&raw).map_err(|e| ClientError::Config(format!("invalid endpoint URL: {e}")))
    }

    /// Issue a GET and decode the JSON body, surfacing upstream `error`
    /// payloads as [`ClientError::Upstream`].
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        params: &[(String, String)],
    ) -> Result<T> {
        let path = url.path().to_owned();
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| ClientError::Http(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ClientError::Http(format!(
                "{path} returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Http(format!("response read failed: {e}")))?;

        if let Ok(UpstreamError { error: Some(msg) }) = serde_json::from_str(&body) {
            return Err(ClientError::Upstream(msg));
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

impl SearchProvider for ApiProvider {
    async fn fetch_page(&self, request: &PageRequest) -> Result<SearchPage> {
        tracing::trace!(query = %request.query.text, page = request.page, "search request");

        let mut params: Vec<(String, String)> = vec![
            ("q".into(), request.query.text.clone()),
            ("type".into(), request.query.kind.as_str().into()),
            ("page".into(), request.page.to_string()),
            ("max_results".into(), request.max_results.to_string()),
        ];
        for (name, value) in request.query.filters.iter() {
            params.push((name.to_owned(), value.to_owned()));
        }

        let page: SearchPage = self
            .get_json(self.endpoint(ResourceKind::Search)?, &params)
            .await?;
        tracing::debug!(count = page.results.len(), page = page.page, "search page received");
        Ok(page)
    }

    async fn autocomplete(&self, query: &str, max_results: usize) -> Result<Vec<String>> {
        tracing::trace!(query, "autocomplete request");

        let params = [
            ("q".to_owned(), query.to_owned()),
            ("max_results".to_owned(), max_results.to_string()),
        ];
        let response: AutocompleteResponse = self
            .get_json(self.endpoint(ResourceKind::Autocomplete)?, &params)
            .await?;
        Ok(response.suggestions)
    }

    async fn instant(&self, query: &str) -> Result<InstantAnswer> {
        tracing::trace!(query, "instant answer request");

        let params = [("q".to_owned(), query.to_owned())];
        self.get_json(self.endpoint(ResourceKind::Instant)?, &params)
            .await
    }
}
