//! URL handling for Baku-Dine
//!
//! This module resolves hrefs found in scraped markup into absolute URLs and
//! recognizes restaurant detail-page links.

mod matcher;
mod resolve;

// Re-export main functions
pub use matcher::DetailUrlMatcher;
pub use resolve::resolve_link;
