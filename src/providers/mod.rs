//! Provider implementations.
//!
//! Each module provides a struct implementing one of the seam traits in
//! [`crate::provider`]: the Pyxis search proxy over HTTP, and the public
//! encyclopedia prefix-search API for rich entity suggestions.

pub mod api;
pub mod encyclopedia;

pub use api::ApiProvider;
pub use encyclopedia::EncyclopediaSource;
