//! Deterministic request keys for response caching.
//!
//! A [`RequestKey`] identifies one logical backend request: resource kind,
//! normalised query text, canonical filter set, and page number. Keys are
//! the cache index: stable under filter reordering and under
//! empty-vs-absent filter values, different whenever any semantically
//! relevant input differs (including the page number).

use std::fmt;

use crate::types::{Filters, PageRequest};

/// Which backend resource a key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// `GET /search` result pages.
    Search,
    /// `GET /autocomplete` keyword suggestions.
    Autocomplete,
    /// `GET /instant` instant answers.
    Instant,
}

impl ResourceKind {
    /// Returns the backend path for this resource.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Autocomplete => "autocomplete",
            Self::Instant => "instant",
        }
    }
}

/// Composite cache key for one backend request. Never mutated after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    kind: ResourceKind,
    /// Trimmed, lowercased query text.
    query: String,
    /// Sorted `(name, value)` pairs; empty values are already dropped by
    /// [`Filters`]. For search keys this includes the `type` parameter.
    filters: Vec<(String, String)>,
    /// 1-based page number; always 1 for autocomplete and instant keys.
    page: u32,
}

impl RequestKey {
    /// Build the key for a search page request.
    ///
    /// The search type is folded into the filter set so that `text` and
    /// `images` searches for the same words occupy distinct cache slots.
    pub fn search(request: &PageRequest) -> Self {
        let mut filters = canonical_filters(&request.query.filters);
        filters.push(("type".to_owned(), request.query.kind.as_str().to_owned()));
        filters.sort();
        Self {
            kind: ResourceKind::Search,
            query: normalise_query(&request.query.text),
            filters,
            page: request.page.max(1),
        }
    }

    /// Build the key for a keyword autocomplete request.
    pub fn autocomplete(query: &str) -> Self {
        Self {
            kind: ResourceKind::Autocomplete,
            query: normalise_query(query),
            filters: Vec::new(),
            page: 1,
        }
    }

    /// Build the key for an instant answer request.
    pub fn instant(query: &str) -> Self {
        Self {
            kind: ResourceKind::Instant,
            query: normalise_query(query),
            filters: Vec::new(),
            page: 1,
        }
    }

    /// Render the stable `path?sorted-query` form of this key, used for
    /// logging and diagnostics.
    pub fn canonical(&self) -> String {
        let mut out = format!("{}?page={}&q={}", self.kind.path(), self.page, self.query);
        for (name, value) in &self.filters {
            out.push('&');
            out.push_str(name);
            out.push('=');
            out.push_str(value);
        }
        out
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Trim and lowercase query text so trivially equivalent inputs share a key.
fn normalise_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Collect filters into a sorted pair list.
fn canonical_filters(filters: &Filters) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect()
}
