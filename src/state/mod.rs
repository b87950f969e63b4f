//! State module for tracking crawl progress
//!
//! A run moves through a fixed sequence of phases; the listing phases must
//! complete before any detail page is requested, since detail URLs are only
//! known once every listing page has been parsed.

mod crawl_phase;

pub use crawl_phase::CrawlPhase;
