//! Fetch orchestration: pagination accumulation, suggestion merging, and
//! view-state projection.
//!
//! This module owns the state machines that sit between user input and the
//! network gate: the feed grows one query's result list page by page, the
//! suggestion engine keeps the autocomplete dropdown correct under fast
//! typing, and the view projector derives what to render.

pub mod feed;
pub mod suggest;
pub mod view;

pub use feed::{FeedSnapshot, SearchFeed};
pub use suggest::{SuggestEngine, SuggestionSnapshot};
pub use view::{project, ViewPhase};
