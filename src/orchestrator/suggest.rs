//! Suggestion merge engine: race-free autocomplete under fast typing.
//!
//! [`SuggestEngine`] debounces input changes, then fires two independent
//! fetches in parallel — keyword suggestions from the backend (through the
//! response cache) and rich entity suggestions from the encyclopedia. Each
//! fetch pair is tagged with the generation of the input that started it;
//! a resolving pair is applied only if that generation is still current,
//! so the dropdown always reflects the latest keystroke even when an older
//! request resolves after a newer one. Superseded fetches are left to
//! resolve and are discarded — the tag check substitutes for cancellation.
//!
//! One source failing degrades that source to an empty list; it never
//! blocks or clears the other.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;

use crate::client::SearchClient;
use crate::provider::{RichSuggestionSource, SearchProvider};
use crate::types::RichSuggestion;

/// Immutable view of the suggestion state, published after every change.
#[derive(Debug, Clone, Default)]
pub struct SuggestionSnapshot {
    /// The input value these suggestions belong to.
    pub input: String,
    /// Keyword suggestions from the backend, in rank order.
    pub keywords: Vec<String>,
    /// Rich entity suggestions from the encyclopedia, in rank order.
    pub rich: Vec<RichSuggestion>,
    /// Inline completion hint: the remainder of the top keyword suggestion
    /// beyond the current input, when it case-insensitively extends it.
    pub ghost: Option<String>,
}

struct SuggestState {
    generation: u64,
}

struct SuggestInner<P: SearchProvider, R: RichSuggestionSource> {
    client: SearchClient<P>,
    rich: R,
    tx: watch::Sender<SuggestionSnapshot>,
    state: Mutex<SuggestState>,
}

/// The suggestion merge engine. Cheap to clone; all clones share state.
pub struct SuggestEngine<P, R>
where
    P: SearchProvider + 'static,
    R: RichSuggestionSource + 'static,
{
    inner: Arc<SuggestInner<P, R>>,
}

impl<P, R> Clone for SuggestEngine<P, R>
where
    P: SearchProvider + 'static,
    R: RichSuggestionSource + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, R> SuggestEngine<P, R>
where
    P: SearchProvider + 'static,
    R: RichSuggestionSource + 'static,
{
    /// Create an engine over the shared search client and a rich
    /// suggestion source.
    pub fn new(client: SearchClient<P>, rich: R) -> Self {
        let (tx, _) = watch::channel(SuggestionSnapshot::default());
        Self {
            inner: Arc::new(SuggestInner {
                client,
                rich,
                tx,
                state: Mutex::new(SuggestState { generation: 0 }),
            }),
        }
    }

    /// Subscribe to suggestion snapshots.
    pub fn subscribe(&self) -> watch::Receiver<SuggestionSnapshot> {
        self.inner.tx.subscribe()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> SuggestionSnapshot {
        self.inner.tx.borrow().clone()
    }

    /// Record a new input value.
    ///
    /// Input shorter than the configured minimum clears both suggestion
    /// lists synchronously, without fetching. Otherwise a debounce timer
    /// starts; only the input still current when it fires triggers the
    /// fetch pair.
    pub fn set_input(&self, input: impl Into<String>) {
        let input = input.into();
        let generation = {
            let mut state = self.inner.state.lock().unwrap_or_else(|err| err.into_inner());
            state.generation += 1;
            state.generation
        };

        let config = self.inner.client.config();
        let query = input.trim().to_owned();
        if query.chars().count() < config.min_suggest_chars {
            self.inner.tx.send_replace(SuggestionSnapshot {
                input,
                ..Default::default()
            });
            return;
        }

        let debounce = Duration::from_millis(config.debounce_ms);
        let max_rich = config.max_rich_suggestions;
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if !inner.is_current(generation) {
                return; // superseded while debouncing
            }

            let (keywords, rich) = tokio::join!(inner.client.suggestions(&query), async {
                match inner.rich.prefix_search(&query, max_rich).await {
                    Ok(entities) => entities,
                    Err(err) => {
                        tracing::debug!(error = %err, "rich suggestions degraded to empty");
                        Vec::new()
                    }
                }
            });

            let state = inner.state.lock().unwrap_or_else(|err| err.into_inner());
            if state.generation != generation {
                tracing::trace!("discarding stale suggestion pair");
                return;
            }
            let ghost = ghost_remainder(&query, &keywords);
            inner.tx.send_replace(SuggestionSnapshot {
                input,
                keywords,
                rich,
                ghost,
            });
        });
    }

    /// Clear the input and both suggestion lists.
    pub fn clear(&self) {
        self.set_input("");
    }
}

impl<P: SearchProvider, R: RichSuggestionSource> SuggestInner<P, R> {
    fn is_current(&self, generation: u64) -> bool {
        self.state.lock().unwrap_or_else(|err| err.into_inner()).generation == generation
    }
}

/// Derive the inline completion hint from the top keyword suggestion.
///
/// Returns the remainder of `suggestions[0]` beyond `input` when the
/// suggestion case-insensitively starts with the input; `None` otherwise
/// (including when the suggestion equals the input exactly).
pub fn ghost_remainder(input: &str, suggestions: &[String]) -> Option<String> {
    let top = suggestions.first()?;
    if input.is_empty() {
        return None;
    }

    let mut rest = top.char_indices();
    for expected in input.chars() {
        let (_, found) = rest.next()?;
        if !found.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    match rest.next() {
        Some((offset, _)) => Some(top[offset..].to_owned()),
        None => None,
    }
}
