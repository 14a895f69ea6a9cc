//! Core types for search queries, result pages, and suggestion payloads.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which kind of search results a query asks for. Maps to the backend's
/// `type` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchKind {
    /// Ordinary web results.
    Text,
    /// Image results (larger pages, image-specific filters).
    Images,
    /// Video results.
    Videos,
}

impl SearchKind {
    /// Returns the wire name of this kind, as the backend expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Images => "images",
            Self::Videos => "videos",
        }
    }

    /// Default number of results per page for this kind.
    pub fn page_size(&self) -> usize {
        match self {
            Self::Text => 10,
            Self::Images | Self::Videos => 20,
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered set of search filter parameters (region, timelimit, size, …).
///
/// Backed by a [`BTreeMap`] so iteration order is canonical regardless of
/// insertion order. Setting an empty value removes the key, which makes an
/// empty filter indistinguishable from an absent one: requests that differ
/// only in empty-vs-absent filters are the same request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters(BTreeMap<String, String>);

impl Filters {
    /// Create an empty filter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a filter value. An empty value removes the filter instead.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if value.is_empty() {
            self.0.remove(&key);
        } else {
            self.0.insert(key, value);
        }
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Look up a filter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterate filters in canonical (sorted) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// True if no filters are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The identity of one logical search: text, kind, and filters.
///
/// Changing any of these fields starts a new query lifetime (the feed
/// resets); changing only the page number does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// The query text as the user typed it.
    pub text: String,
    /// Which result kind to fetch.
    pub kind: SearchKind,
    /// Active filter parameters.
    pub filters: Filters,
}

impl SearchQuery {
    /// Convenience constructor for an unfiltered query.
    pub fn new(text: impl Into<String>, kind: SearchKind) -> Self {
        Self {
            text: text.into(),
            kind,
            filters: Filters::new(),
        }
    }
}

/// A fully specified request for one page of search results.
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// The logical query identity.
    pub query: SearchQuery,
    /// 1-based page number.
    pub page: u32,
    /// Results per page to ask the backend for.
    pub max_results: usize,
}

impl PageRequest {
    /// Build a request for the given page of a query, using the kind's
    /// default page size.
    pub fn new(query: SearchQuery, page: u32) -> Self {
        let max_results = query.kind.page_size();
        Self {
            query,
            page,
            max_results,
        }
    }
}

/// A single search result item as returned by the backend proxy.
///
/// The backend forwards upstream items mostly verbatim, so field names vary
/// by search type; serde aliases fold the common variants into one shape.
/// Unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultItem {
    /// Result title.
    #[serde(default)]
    pub title: String,
    /// Target URL (`href` for text results, `url` elsewhere).
    #[serde(default, alias = "href")]
    pub url: String,
    /// Text snippet (`body` for text results, `description` for videos).
    #[serde(default, alias = "body", alias = "description")]
    pub snippet: String,
    /// Full-size image URL (image results only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Thumbnail URL (image and video results).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Originating site or publisher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Video duration (video results only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// One page of search results from `GET /search`.
///
/// Immutable once received; the feed never rewrites a page it has already
/// appended, only appends new pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage {
    /// Which search type produced this page.
    #[serde(default)]
    pub search_type: String,
    /// The decoded query the backend ran.
    #[serde(default)]
    pub query: String,
    /// 1-based page number; defaults to 1 when the backend omits it.
    #[serde(default = "default_page")]
    pub page: u32,
    /// True if the backend believes more pages are available.
    #[serde(default)]
    pub has_more: bool,
    /// Number of items in this page.
    #[serde(default)]
    pub count: usize,
    /// The result items, in upstream rank order.
    #[serde(default)]
    pub results: Vec<ResultItem>,
}

fn default_page() -> u32 {
    1
}

/// An instant answer from `GET /instant`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstantAnswer {
    /// The textual answer, if the upstream had one.
    #[serde(default)]
    pub answer: Option<String>,
    /// A related safe image URL, if one was found.
    #[serde(default)]
    pub image_url: Option<String>,
}

impl InstantAnswer {
    /// True if the upstream had neither an answer nor an image.
    pub fn is_empty(&self) -> bool {
        self.answer.is_none() && self.image_url.is_none()
    }
}

/// A rich entity suggestion from the encyclopedia prefix-search API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RichSuggestion {
    /// Entity title.
    pub title: String,
    /// Short one-line description, when the encyclopedia has one.
    #[serde(default)]
    pub description: Option<String>,
    /// Thumbnail image URL, when available.
    #[serde(default)]
    pub thumbnail: Option<String>,
}
