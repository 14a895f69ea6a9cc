//! View state projection: UI-facing phase derived from the feed snapshot.
//!
//! A pure function over [`FeedSnapshot`]; it owns no network logic and no
//! state of its own, so any front end (or none) can render from it. The
//! dismissible incremental-load error is deliberately NOT a phase: it
//! travels on the snapshot's `load_error` flag alongside whatever phase the
//! feed is in.

use crate::orchestrator::feed::FeedSnapshot;

/// What the results view should show right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    /// No query yet.
    Idle,
    /// Page 1 in flight; show skeletons.
    Loading,
    /// Results shown, more pages may be loadable.
    Ready,
    /// Results shown, an incremental page in flight; show a tail spinner.
    LoadingMore,
    /// Results shown and the list is complete — the backend reported no
    /// more pages, or the page ceiling was reached.
    Exhausted,
    /// The page-1 fetch exhausted its retries; show the "something went
    /// wrong" panel.
    Failed,
}

/// Project a feed snapshot to its view phase.
pub fn project(snap: &FeedSnapshot, page_ceiling: u32) -> ViewPhase {
    if snap.error.is_some() {
        return ViewPhase::Failed;
    }
    if snap.loading {
        return ViewPhase::Loading;
    }
    if snap.loading_more {
        return ViewPhase::LoadingMore;
    }
    if snap.query.is_none() {
        return ViewPhase::Idle;
    }
    if !snap.has_more || snap.current_page >= page_ceiling {
        return ViewPhase::Exhausted;
    }
    ViewPhase::Ready
}
