//! # pyxis-client
//!
//! Headless client-side search orchestration for the Pyxis metasearch UI.
//!
//! This crate owns the logic between user input and the Pyxis search proxy:
//! it decides when to call the backend, how to reuse prior responses, how to
//! recover from transient failures, how to grow a result list page by page,
//! and how to merge two independent suggestion sources into one ranked
//! autocomplete list without races. It renders nothing — state is published
//! over watch channels so any front end (or a headless test harness) can
//! drive it.
//!
//! ## Design
//!
//! - Responses are cached per request key with a time-bounded dedup window;
//!   concurrent fetches for one key coalesce into a single network call
//! - Page-one fetches retry patiently (20 × 2 s flat); incremental page
//!   loads give up quickly (3 × exponential) and surface a dismissible
//!   "nothing new" condition instead of a fatal error
//! - The result feed is append-only per query and resets whenever the
//!   query identity (text, kind, filters) changes
//! - Suggestion fetches are tagged with the input generation that started
//!   them; stale resolutions are discarded, so the dropdown always reflects
//!   the latest keystroke
//! - Non-essential sources (autocomplete, rich entities, instant answers)
//!   degrade silently and never surface errors
//!
//! ## Security
//!
//! - No credentials; the proxy and the encyclopedia API are public
//! - No network listeners; this is a library, not a server
//! - Queries are logged only at trace level

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod key;
pub mod orchestrator;
pub mod provider;
pub mod providers;
pub mod retry;
pub mod types;

pub use client::SearchClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use orchestrator::{FeedSnapshot, SearchFeed, SuggestEngine, SuggestionSnapshot, ViewPhase};
pub use providers::{ApiProvider, EncyclopediaSource};
pub use types::{
    Filters, InstantAnswer, ResultItem, RichSuggestion, SearchKind, SearchPage, SearchQuery,
};

/// The two orchestrators wired to the HTTP providers, sharing one cached
/// client.
pub struct Session {
    /// The paginated result feed.
    pub feed: SearchFeed<ApiProvider>,
    /// The autocomplete engine.
    pub suggest: SuggestEngine<ApiProvider, EncyclopediaSource>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

/// Build a ready-to-use [`Session`] against the configured backend.
///
/// # Errors
///
/// Returns [`ClientError::Config`] if the configuration is invalid, or
/// [`ClientError::Http`] if an HTTP client cannot be constructed.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> pyxis_client::Result<()> {
/// use pyxis_client::{ClientConfig, SearchKind, SearchQuery};
///
/// let session = pyxis_client::connect(ClientConfig::default())?;
/// let mut results = session.feed.subscribe();
///
/// session.feed.set_query(SearchQuery::new("rust programming", SearchKind::Text));
/// results.changed().await.ok();
/// for item in &results.borrow().items {
///     println!("{}: {}", item.title, item.url);
/// }
/// # Ok(())
/// # }
/// ```
pub fn connect(config: ClientConfig) -> Result<Session> {
    config.validate()?;
    let provider = ApiProvider::new(&config)?;
    let rich = EncyclopediaSource::new(&config)?;
    let client = SearchClient::new(provider, config)?;
    Ok(Session {
        feed: SearchFeed::new(client.clone()),
        suggest: SuggestEngine::new(client, rich),
    })
}
