//! Crawler module for page fetching and extraction
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching under a global concurrency cap
//! - Listing and detail page extraction
//! - Two-phase crawl coordination

mod coordinator;
mod detail;
mod fetcher;
mod listing;
mod sections;

pub use coordinator::{run_crawl, Coordinator, CrawlOutcome, CrawlReport};
pub use detail::{classify_social, DetailExtractor, SocialLink};
pub use fetcher::{build_http_client, FetchCause, FetchFailure, Fetcher};
pub use listing::{ListingExtractor, LISTING_RULES};
pub use sections::{Extract, ExtractError, LabelRule};

use crate::config::Config;
use crate::output::write_records;
use crate::ScrapeError;
use std::path::PathBuf;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client and extractors
/// 2. Fetch and parse every listing page
/// 3. Fetch and parse every discovered detail page
/// 4. Merge listing and detail data per restaurant
///
/// # Arguments
///
/// * `config` - The validated crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - Merged records plus run counters
/// * `Err(ScrapeError)` - Setup failed; page failures never surface here
pub async fn crawl(config: Config) -> Result<CrawlOutcome, ScrapeError> {
    run_crawl(config).await
}

/// Runs a crawl and writes the merged records to the configured CSV path
///
/// The table is only written once the crawl has finished. A write failure
/// surfaces as [`ScrapeError::Output`].
pub async fn crawl_to_csv(config: Config) -> Result<CrawlOutcome, ScrapeError> {
    let output_path = PathBuf::from(&config.output.csv_path);
    let outcome = run_crawl(config).await?;
    write_records(&output_path, &outcome.records)?;
    Ok(outcome)
}
