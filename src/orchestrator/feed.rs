//! Pagination accumulator: one query's growing result list.
//!
//! [`SearchFeed`] owns the accumulated result set for the current query
//! identity and publishes immutable [`FeedSnapshot`]s over a watch channel.
//! Page 1 replaces the item list (it may be re-served by revalidation);
//! every later page appends. Items are never reordered or removed except by
//! a full reset when the query identity changes.
//!
//! Stale protection: every load captures the feed generation at start and
//! applies its result only if the generation is still current. A query
//! change additionally aborts the in-flight task, which stops any retry
//! backoff timer scheduled inside it.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::SearchClient;
use crate::error::Result;
use crate::provider::SearchProvider;
use crate::types::{InstantAnswer, ResultItem, SearchKind, SearchPage, SearchQuery};

/// Immutable view of the feed, published on every state transition.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    /// The query this feed is accumulating, `None` before the first query.
    pub query: Option<SearchQuery>,
    /// Accumulated items, in fetch order across pages.
    pub items: Vec<ResultItem>,
    /// The last page that has been applied (1-based); 0 while idle.
    pub current_page: u32,
    /// Whether the backend reported more pages after the last applied one.
    pub has_more: bool,
    /// A page-1 load is in flight.
    pub loading: bool,
    /// An incremental page load is in flight.
    pub loading_more: bool,
    /// An incremental load exhausted its retries. Dismissible; accumulated
    /// items are untouched.
    pub load_error: bool,
    /// The page-1 load exhausted its retries. Fatal for this query; a new
    /// query is required to recover.
    pub error: Option<String>,
    /// Instant answer for the current text query, when available.
    pub instant: Option<InstantAnswer>,
}

struct FeedState {
    generation: u64,
    task: Option<JoinHandle<()>>,
    snap: FeedSnapshot,
}

struct FeedInner<P: SearchProvider> {
    client: SearchClient<P>,
    tx: watch::Sender<FeedSnapshot>,
    state: Mutex<FeedState>,
}

/// The pagination accumulator. Cheap to clone; all clones share state.
pub struct SearchFeed<P: SearchProvider + 'static> {
    inner: Arc<FeedInner<P>>,
}

impl<P: SearchProvider + 'static> Clone for SearchFeed<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: SearchProvider + 'static> SearchFeed<P> {
    /// Create a feed on top of a search client.
    pub fn new(client: SearchClient<P>) -> Self {
        let (tx, _) = watch::channel(FeedSnapshot::default());
        Self {
            inner: Arc::new(FeedInner {
                client,
                tx,
                state: Mutex::new(FeedState {
                    generation: 0,
                    task: None,
                    snap: FeedSnapshot::default(),
                }),
            }),
        }
    }

    /// Subscribe to feed snapshots.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.inner.tx.subscribe()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> FeedSnapshot {
        self.inner.tx.borrow().clone()
    }

    /// The current view phase, projected from the snapshot.
    pub fn phase(&self) -> crate::orchestrator::view::ViewPhase {
        crate::orchestrator::view::project(&self.snapshot(), self.inner.client.config().max_pages)
    }

    /// Start a new query lifetime: reset the accumulated set and load page
    /// 1 with the primary retry policy.
    ///
    /// A call with an unchanged query identity is a no-op unless the
    /// previous load failed, so revalidation cannot wipe a healthy list.
    /// An empty query text resets the feed to idle without fetching.
    pub fn set_query(&self, query: SearchQuery) {
        let mut state = self.inner.state.lock().unwrap_or_else(|err| err.into_inner());

        if query.text.trim().is_empty() {
            Self::abort_in_flight(&mut state);
            state.generation += 1;
            state.snap = FeedSnapshot::default();
            self.inner.tx.send_replace(state.snap.clone());
            return;
        }

        let unchanged = state.snap.query.as_ref() == Some(&query);
        if unchanged && state.snap.error.is_none() {
            return;
        }

        Self::abort_in_flight(&mut state);
        state.generation += 1;
        let generation = state.generation;

        state.snap = FeedSnapshot {
            query: Some(query.clone()),
            current_page: 1,
            loading: true,
            ..Default::default()
        };
        self.inner.tx.send_replace(state.snap.clone());

        let inner = Arc::clone(&self.inner);
        let request = self.inner.client.page_request(query, 1);
        state.task = Some(tokio::spawn(async move {
            let want_instant = request.query.kind == SearchKind::Text;
            let (page, instant) = tokio::join!(inner.client.first_page(&request), async {
                if want_instant {
                    inner.client.instant(&request.query.text).await
                } else {
                    None
                }
            });
            Self::apply_first_page(&inner, generation, page, instant);
        }));
    }

    /// Load the page after the last applied one with the incremental retry
    /// policy.
    ///
    /// No-op while idle or failed, while any load is in flight, once the
    /// backend reports no more pages, or once the page ceiling is reached.
    pub fn load_next_page(&self) {
        let mut state = self.inner.state.lock().unwrap_or_else(|err| err.into_inner());
        let snap = &state.snap;

        let Some(query) = snap.query.clone() else {
            return;
        };
        if snap.error.is_some() || snap.loading || snap.loading_more || !snap.has_more {
            return;
        }
        let next_page = snap.current_page + 1;
        if next_page > self.inner.client.config().max_pages {
            tracing::debug!(page = next_page, "page ceiling reached, ignoring load");
            return;
        }

        let generation = state.generation;
        state.snap.loading_more = true;
        self.inner.tx.send_replace(state.snap.clone());

        let inner = Arc::clone(&self.inner);
        let request = self.inner.client.page_request(query, next_page);
        state.task = Some(tokio::spawn(async move {
            let page = inner.client.next_page(&request).await;
            Self::apply_next_page(&inner, generation, page);
        }));
    }

    /// Clear the dismissible incremental-load error flag.
    pub fn dismiss_load_error(&self) {
        let mut state = self.inner.state.lock().unwrap_or_else(|err| err.into_inner());
        if state.snap.load_error {
            state.snap.load_error = false;
            self.inner.tx.send_replace(state.snap.clone());
        }
    }

    /// Reset to idle, aborting any in-flight load and its retry timers.
    pub fn reset(&self) {
        let mut state = self.inner.state.lock().unwrap_or_else(|err| err.into_inner());
        Self::abort_in_flight(&mut state);
        state.generation += 1;
        state.snap = FeedSnapshot::default();
        self.inner.tx.send_replace(state.snap.clone());
    }

    fn abort_in_flight(state: &mut FeedState) {
        if let Some(task) = state.task.take() {
            task.abort();
        }
    }

    fn apply_first_page(
        inner: &FeedInner<P>,
        generation: u64,
        page: Result<SearchPage>,
        instant: Option<InstantAnswer>,
    ) {
        let mut state = inner.state.lock().unwrap_or_else(|err| err.into_inner());
        if state.generation != generation {
            tracing::trace!("discarding superseded page-1 response");
            return;
        }

        state.snap.loading = false;
        match page {
            Ok(page) => {
                // Page 1 is the only page allowed to replace the list.
                state.snap.items = page.results;
                state.snap.current_page = 1;
                state.snap.has_more = page.has_more;
                state.snap.instant = instant.filter(|answer| !answer.is_empty());
            }
            Err(err) => {
                tracing::warn!(error = %err, "primary fetch failed");
                state.snap.error = Some(err.to_string());
            }
        }
        inner.tx.send_replace(state.snap.clone());
    }

    fn apply_next_page(inner: &FeedInner<P>, generation: u64, page: Result<SearchPage>) {
        let mut state = inner.state.lock().unwrap_or_else(|err| err.into_inner());
        if state.generation != generation {
            tracing::trace!("discarding superseded incremental page response");
            return;
        }

        state.snap.loading_more = false;
        match page {
            Ok(page) => {
                state.snap.items.extend(page.results);
                state.snap.current_page += 1;
                state.snap.has_more = page.has_more;
                state.snap.load_error = false;
            }
            Err(err) => {
                // Non-fatal: keep accumulated items, surface a dismissible
                // "nothing new" condition.
                tracing::warn!(error = %err, "incremental fetch failed");
                state.snap.load_error = true;
            }
        }
        inner.tx.send_replace(state.snap.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::error::ClientError;
    use crate::types::{Filters, PageRequest};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// A scripted backend: synthesises pages on demand, optionally failing
    /// the first N fetches, with a per-query artificial latency.
    struct ScriptedProvider {
        page_size: usize,
        total_pages: u32,
        fail_first: AtomicU32,
        calls: AtomicU32,
        latency: HashMap<String, Duration>,
    }

    impl ScriptedProvider {
        fn new(page_size: usize, total_pages: u32) -> Self {
            Self {
                page_size,
                total_pages,
                fail_first: AtomicU32::new(0),
                calls: AtomicU32::new(0),
                latency: HashMap::new(),
            }
        }

        fn failing_first(self, failures: u32) -> Self {
            self.fail_first.store(failures, Ordering::SeqCst);
            self
        }

        fn with_latency(mut self, query: &str, latency: Duration) -> Self {
            self.latency.insert(query.to_owned(), latency);
            self
        }

        fn item(query: &str, page: u32, index: usize) -> ResultItem {
            ResultItem {
                title: format!("{query} page {page} item {index}"),
                url: format!("https://example.com/{query}/{page}/{index}"),
                snippet: String::new(),
                image: None,
                thumbnail: None,
                source: None,
                duration: None,
            }
        }
    }

    impl SearchProvider for ScriptedProvider {
        async fn fetch_page(&self, request: &PageRequest) -> crate::error::Result<SearchPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.latency.get(&request.query.text) {
                tokio::time::sleep(*delay).await;
            }
            if self
                .fail_first
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(ClientError::Http("backend unavailable".into()));
            }
            let query = &request.query.text;
            let results: Vec<ResultItem> = (0..self.page_size)
                .map(|i| Self::item(query, request.page, i))
                .collect();
            Ok(SearchPage {
                search_type: request.query.kind.as_str().into(),
                query: query.clone(),
                page: request.page,
                has_more: request.page < self.total_pages,
                count: results.len(),
                results,
            })
        }

        async fn autocomplete(
            &self,
            _query: &str,
            _max_results: usize,
        ) -> crate::error::Result<Vec<String>> {
            Ok(vec![])
        }

        async fn instant(&self, query: &str) -> crate::error::Result<InstantAnswer> {
            Ok(InstantAnswer {
                answer: Some(format!("answer for {query}")),
                image_url: None,
            })
        }
    }

    fn feed_with(provider: ScriptedProvider) -> SearchFeed<ScriptedProvider> {
        let client = SearchClient::new(provider, ClientConfig::default()).expect("client");
        SearchFeed::new(client)
    }

    async fn wait_until(
        rx: &mut watch::Receiver<FeedSnapshot>,
        pred: impl Fn(&FeedSnapshot) -> bool,
    ) -> FeedSnapshot {
        tokio::time::timeout(Duration::from_secs(600), async {
            loop {
                {
                    let snap = rx.borrow_and_update();
                    if pred(&snap) {
                        return snap.clone();
                    }
                }
                rx.changed().await.expect("feed dropped");
            }
        })
        .await
        .expect("condition not reached before timeout")
    }

    fn query(text: &str) -> SearchQuery {
        SearchQuery::new(text, SearchKind::Text)
    }

    #[tokio::test(start_paused = true)]
    async fn first_page_loads_and_replaces() {
        let feed = feed_with(ScriptedProvider::new(10, 3));
        let mut rx = feed.subscribe();

        feed.set_query(query("rust"));
        assert!(feed.snapshot().loading);

        let snap = wait_until(&mut rx, |s| !s.loading && !s.items.is_empty()).await;
        assert_eq!(snap.items.len(), 10);
        assert_eq!(snap.current_page, 1);
        assert!(snap.has_more);
        assert!(snap.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn two_page_accumulation_scenario() {
        // Page 1: 20 items, has_more; page 2: 20 more, has_more = false.
        let feed = feed_with(ScriptedProvider::new(20, 2));
        let mut rx = feed.subscribe();

        feed.set_query(SearchQuery::new("rust", SearchKind::Images));
        wait_until(&mut rx, |s| !s.loading && s.items.len() == 20).await;

        feed.load_next_page();
        let snap = wait_until(&mut rx, |s| !s.loading_more && s.items.len() == 40).await;
        assert_eq!(snap.current_page, 2);
        assert!(!snap.has_more);

        // Further calls are no-ops.
        feed.load_next_page();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(feed.snapshot().items.len(), 40);
        assert_eq!(feed.snapshot().current_page, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn pagination_is_append_only_and_ordered() {
        let feed = feed_with(ScriptedProvider::new(5, 4));
        let mut rx = feed.subscribe();

        feed.set_query(query("rust"));
        wait_until(&mut rx, |s| s.items.len() == 5).await;
        feed.load_next_page();
        wait_until(&mut rx, |s| s.items.len() == 10).await;
        feed.load_next_page();
        let snap = wait_until(&mut rx, |s| s.items.len() == 15).await;

        // Concatenation of pages 1..=3 in fetch order.
        for (i, item) in snap.items.iter().enumerate() {
            let page = i / 5 + 1;
            let index = i % 5;
            assert_eq!(item.title, format!("rust page {page} item {index}"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reset_on_query_change_clears_items_immediately() {
        let feed = feed_with(ScriptedProvider::new(10, 3));
        let mut rx = feed.subscribe();

        feed.set_query(query("rust"));
        wait_until(&mut rx, |s| s.items.len() == 10).await;

        feed.set_query(query("python"));
        let snap = feed.snapshot();
        assert!(snap.items.is_empty());
        assert_eq!(snap.current_page, 1);
        assert!(snap.loading);

        let snap = wait_until(&mut rx, |s| !s.loading && !s.items.is_empty()).await;
        assert!(snap.items[0].title.starts_with("python"));
    }

    #[tokio::test(start_paused = true)]
    async fn filter_change_resets_page_change_does_not() {
        let feed = feed_with(ScriptedProvider::new(10, 5));
        let mut rx = feed.subscribe();

        feed.set_query(query("rust"));
        wait_until(&mut rx, |s| s.items.len() == 10).await;

        // Page-only change: accumulates.
        feed.load_next_page();
        wait_until(&mut rx, |s| s.items.len() == 20).await;

        // Filter change: resets.
        let filtered = SearchQuery {
            text: "rust".into(),
            kind: SearchKind::Text,
            filters: Filters::new().with("timelimit", "w"),
        };
        feed.set_query(filtered);
        assert!(feed.snapshot().items.is_empty());
        assert_eq!(feed.snapshot().current_page, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_query_is_a_no_op() {
        let feed = feed_with(ScriptedProvider::new(10, 3));
        let mut rx = feed.subscribe();

        feed.set_query(query("rust"));
        wait_until(&mut rx, |s| s.items.len() == 10).await;

        feed.set_query(query("rust"));
        let snap = feed.snapshot();
        assert_eq!(snap.items.len(), 10);
        assert!(!snap.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_query_resets_to_idle() {
        let feed = feed_with(ScriptedProvider::new(10, 3));
        let mut rx = feed.subscribe();

        feed.set_query(query("rust"));
        wait_until(&mut rx, |s| s.items.len() == 10).await;

        feed.set_query(query("  "));
        let snap = feed.snapshot();
        assert!(snap.query.is_none());
        assert!(snap.items.is_empty());
        assert_eq!(snap.current_page, 0);
        assert!(!snap.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn page_ceiling_makes_load_next_a_no_op() {
        let provider = ScriptedProvider::new(2, 50); // has_more stays true
        let client = SearchClient::new(provider, ClientConfig {
            max_pages: 3,
            ..Default::default()
        })
        .expect("client");
        let feed = SearchFeed::new(client);
        let mut rx = feed.subscribe();

        feed.set_query(query("rust"));
        wait_until(&mut rx, |s| s.items.len() == 2).await;
        feed.load_next_page();
        wait_until(&mut rx, |s| s.items.len() == 4).await;
        feed.load_next_page();
        let snap = wait_until(&mut rx, |s| s.items.len() == 6).await;
        assert_eq!(snap.current_page, 3);
        assert!(snap.has_more);

        // At the ceiling: silently ignored even though has_more is true.
        feed.load_next_page();
        tokio::time::sleep(Duration::from_secs(5)).await;
        let snap = feed.snapshot();
        assert_eq!(snap.items.len(), 6);
        assert!(!snap.loading_more);
    }

    #[tokio::test(start_paused = true)]
    async fn incremental_exhaustion_is_soft_and_dismissible() {
        // Page 1 succeeds; every page-2 attempt fails (3 incremental
        // attempts), leaving a dismissible load_error and intact items.
        let provider = ScriptedProvider::new(10, 3);
        let feed = feed_with(provider);
        let mut rx = feed.subscribe();

        feed.set_query(query("rust"));
        wait_until(&mut rx, |s| s.items.len() == 10).await;

        feed.inner.client.provider().fail_first.store(u32::MAX, Ordering::SeqCst);
        feed.load_next_page();
        let snap = wait_until(&mut rx, |s| s.load_error).await;
        assert_eq!(snap.items.len(), 10);
        assert!(snap.error.is_none());
        assert!(!snap.loading_more);

        feed.dismiss_load_error();
        assert!(!feed.snapshot().load_error);
    }

    #[tokio::test(start_paused = true)]
    async fn primary_exhaustion_is_fatal() {
        let provider = ScriptedProvider::new(10, 3).failing_first(u32::MAX);
        let feed = feed_with(provider);
        let mut rx = feed.subscribe();

        feed.set_query(query("rust"));
        let snap = wait_until(&mut rx, |s| s.error.is_some()).await;
        assert!(snap.items.is_empty());
        assert!(!snap.loading);
        assert!(snap.error.as_deref().unwrap_or_default().contains("20 attempts"));

        // Load-more is refused while failed.
        feed.load_next_page();
        assert!(!feed.snapshot().loading_more);
    }

    #[tokio::test(start_paused = true)]
    async fn primary_retries_through_transient_failures() {
        // Two failures, then success; absorbed by the primary policy.
        let provider = ScriptedProvider::new(10, 3).failing_first(2);
        let feed = feed_with(provider);
        let mut rx = feed.subscribe();

        feed.set_query(query("rust"));
        let snap = wait_until(&mut rx, |s| !s.loading).await;
        assert!(snap.error.is_none());
        assert_eq!(snap.items.len(), 10);
        assert_eq!(feed.inner.client.provider().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn load_next_is_a_no_op_while_in_flight() {
        let provider =
            ScriptedProvider::new(10, 5).with_latency("rust", Duration::from_millis(500));
        let feed = feed_with(provider);
        let mut rx = feed.subscribe();

        feed.set_query(query("rust"));
        wait_until(&mut rx, |s| s.items.len() == 10).await;

        feed.load_next_page();
        feed.load_next_page();
        feed.load_next_page();
        wait_until(&mut rx, |s| s.items.len() == 20).await;

        // Exactly one page-2 fetch: 1 (page 1) + 1 (page 2).
        assert_eq!(feed.inner.client.provider().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_first_page_never_overwrites_newer_query() {
        let provider = ScriptedProvider::new(10, 3)
            .with_latency("slowcoach", Duration::from_secs(30))
            .with_latency("quick", Duration::from_millis(10));
        let feed = feed_with(provider);
        let mut rx = feed.subscribe();

        feed.set_query(query("slowcoach"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        feed.set_query(query("quick"));

        let snap = wait_until(&mut rx, |s| !s.loading && !s.items.is_empty()).await;
        assert!(snap.items[0].title.starts_with("quick"));

        // Long after the slow response would have resolved, the quick
        // query's results still stand.
        tokio::time::sleep(Duration::from_secs(60)).await;
        let snap = feed.snapshot();
        assert!(snap.items[0].title.starts_with("quick"));
        assert_eq!(snap.query, Some(query("quick")));
    }

    #[tokio::test(start_paused = true)]
    async fn text_query_carries_instant_answer() {
        let feed = feed_with(ScriptedProvider::new(10, 1));
        let mut rx = feed.subscribe();

        feed.set_query(query("rust"));
        let snap = wait_until(&mut rx, |s| !s.loading).await;
        let instant = snap.instant.expect("instant answer expected");
        assert_eq!(instant.answer.as_deref(), Some("answer for rust"));
    }

    #[tokio::test(start_paused = true)]
    async fn image_query_skips_instant_answer() {
        let feed = feed_with(ScriptedProvider::new(10, 1));
        let mut rx = feed.subscribe();

        feed.set_query(SearchQuery::new("cats", SearchKind::Images));
        let snap = wait_until(&mut rx, |s| !s.loading).await;
        assert!(snap.instant.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn phase_tracks_feed_lifecycle() {
        use crate::orchestrator::view::ViewPhase;

        let feed = feed_with(ScriptedProvider::new(10, 2));
        let mut rx = feed.subscribe();
        assert_eq!(feed.phase(), ViewPhase::Idle);

        feed.set_query(query("rust"));
        assert_eq!(feed.phase(), ViewPhase::Loading);

        wait_until(&mut rx, |s| !s.loading).await;
        assert_eq!(feed.phase(), ViewPhase::Ready);

        feed.load_next_page();
        wait_until(&mut rx, |s| s.current_page == 2).await;
        assert_eq!(feed.phase(), ViewPhase::Exhausted);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_returns_to_idle() {
        let feed = feed_with(ScriptedProvider::new(10, 3));
        let mut rx = feed.subscribe();

        feed.set_query(query("rust"));
        wait_until(&mut rx, |s| s.items.len() == 10).await;

        feed.reset();
        let snap = feed.snapshot();
        assert!(snap.query.is_none());
        assert!(snap.items.is_empty());
        assert_eq!(snap.current_page, 0);
    }
}
