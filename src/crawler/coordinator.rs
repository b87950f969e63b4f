//! Crawler coordinator - two-phase crawl orchestration
//!
//! A crawl runs in strictly ordered phases:
//! - Fetch every listing page concurrently, then fold the cards into one
//!   URL-keyed map of partial records
//! - Fetch every discovered detail page concurrently, then parse and merge
//!   each one with its listing data
//!
//! No detail fetch starts before every listing fetch has finished. Failed
//! pages are logged and counted, never retried, and never abort the run.

use crate::config::Config;
use crate::crawler::{DetailExtractor, FetchFailure, Fetcher, ListingExtractor};
use crate::record::{fold_listing, DetailRecord, MergedRecord, PartialRecord};
use crate::state::CrawlPhase;
use crate::ScrapeError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Counters collected while a crawl runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub listing_pages_requested: usize,
    pub listing_pages_fetched: usize,
    pub listing_pages_failed: usize,
    pub restaurants_discovered: usize,
    pub details_fetched: usize,
    pub details_failed: usize,
    pub records: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub elapsed: Duration,
}

/// Everything a finished crawl produced
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub records: Vec<MergedRecord>,
    pub report: CrawlReport,
}

/// Result of one fetch task: submission index, URL and body or failure
type FetchSlot = (usize, String, Result<String, FetchFailure>);

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    fetcher: Fetcher,
    listing: ListingExtractor,
    detail: DetailExtractor,
    phase: CrawlPhase,
    report: CrawlReport,
}

impl Coordinator {
    /// Creates a coordinator with an HTTP client built from `config`
    pub fn new(config: Config) -> Result<Self, ScrapeError> {
        let fetcher = Fetcher::from_config(&config)?;
        Self::with_fetcher(config, fetcher)
    }

    /// Creates a coordinator around an existing fetcher
    ///
    /// The fetcher's own concurrency cap applies, not the one in `config`.
    pub fn with_fetcher(config: Config, fetcher: Fetcher) -> Result<Self, ScrapeError> {
        let listing = ListingExtractor::new(&config.site)?;
        let detail = DetailExtractor::new(&config.site)?;

        Ok(Self {
            config,
            fetcher,
            listing,
            detail,
            phase: CrawlPhase::Idle,
            report: CrawlReport::default(),
        })
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Runs both phases and returns the merged records
    ///
    /// Records come out in the order their detail pages finished downloading.
    /// A coordinator runs once; a second call fails with an invalid
    /// transition.
    pub async fn run(&mut self) -> Result<CrawlOutcome, ScrapeError> {
        let start_time = Instant::now();
        self.report = CrawlReport {
            started_at: Some(Utc::now()),
            ..CrawlReport::default()
        };

        let listings = self.collect_listings().await?;
        let details = self.collect_details(&listings).await?;

        self.transition(CrawlPhase::Merging)?;
        let records: Vec<MergedRecord> = details
            .into_iter()
            .map(|detail| {
                let partial = listings.get(&detail.url);
                MergedRecord::merge(partial, detail)
            })
            .collect();
        self.report.records = records.len();

        self.transition(CrawlPhase::Done)?;
        self.report.finished_at = Some(Utc::now());
        self.report.elapsed = start_time.elapsed();

        tracing::info!(
            "Crawl completed: {} records from {} restaurants in {:?}",
            records.len(),
            self.report.restaurants_discovered,
            self.report.elapsed
        );

        Ok(CrawlOutcome {
            records,
            report: self.report.clone(),
        })
    }

    /// Phase one: every listing page, folded into one map
    async fn collect_listings(&mut self) -> Result<HashMap<String, PartialRecord>, ScrapeError> {
        self.transition(CrawlPhase::FetchingListings)?;

        let total = self.config.crawler.total_pages;
        let urls: Vec<String> = (1..=total)
            .map(|page| self.config.site.listing_url(page))
            .collect();
        self.report.listing_pages_requested = urls.len();

        tracing::info!("Fetching {} listing pages", urls.len());
        let mut pages = self.fetch_all(urls).await;

        self.transition(CrawlPhase::ExtractingListings)?;

        // Fold in page order so the earliest page wins on conflicting fields
        pages.sort_by_key(|(index, _, _)| *index);

        let mut accumulator = HashMap::new();
        for (_, url, result) in pages {
            match result {
                Ok(body) => {
                    self.report.listing_pages_fetched += 1;
                    let page = self.listing.parse_listing(&body);
                    tracing::debug!("{}: {} restaurants", url, page.len());
                    fold_listing(&mut accumulator, page);
                }
                Err(failure) => {
                    self.report.listing_pages_failed += 1;
                    tracing::warn!("{}", failure);
                }
            }
        }

        self.report.restaurants_discovered = accumulator.len();
        tracing::info!(
            "Found {} unique restaurants on {} listing pages ({} failed)",
            accumulator.len(),
            self.report.listing_pages_fetched,
            self.report.listing_pages_failed
        );

        Ok(accumulator)
    }

    /// Phase two: every discovered detail page, in completion order
    async fn collect_details(
        &mut self,
        listings: &HashMap<String, PartialRecord>,
    ) -> Result<Vec<DetailRecord>, ScrapeError> {
        self.transition(CrawlPhase::FetchingDetails)?;

        let urls: Vec<String> = listings.keys().cloned().collect();
        tracing::info!("Fetching {} detail pages", urls.len());
        let pages = self.fetch_all(urls).await;

        self.transition(CrawlPhase::ExtractingDetails)?;

        let mut details = Vec::with_capacity(pages.len());
        for (_, url, result) in pages {
            match result {
                Ok(body) => {
                    self.report.details_fetched += 1;
                    details.push(self.detail.parse_detail(&body, &url));
                }
                Err(failure) => {
                    self.report.details_failed += 1;
                    tracing::warn!("{}", failure);
                }
            }
        }

        tracing::info!(
            "Parsed {} detail pages ({} failed)",
            self.report.details_fetched,
            self.report.details_failed
        );

        Ok(details)
    }

    /// Fetches every URL concurrently and waits for all of them
    ///
    /// Tasks are spawned at once; the fetcher's permit pool keeps at most
    /// `max_concurrent` of them on the wire. Results are returned in the
    /// order they completed, tagged with their submission index.
    async fn fetch_all(&self, urls: Vec<String>) -> Vec<FetchSlot> {
        let mut tasks = JoinSet::new();
        let total = urls.len();

        for (index, url) in urls.into_iter().enumerate() {
            let fetcher = self.fetcher.clone();
            tasks.spawn(async move {
                let result = fetcher.fetch(&url).await;
                (index, url, result)
            });
        }

        let mut slots = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(slot) => {
                    slots.push(slot);
                    if slots.len() % 50 == 0 {
                        tracing::info!("Progress: {}/{} pages fetched", slots.len(), total);
                    }
                }
                Err(e) => tracing::error!("Fetch task did not complete: {}", e),
            }
        }

        slots
    }

    fn transition(&mut self, to: CrawlPhase) -> Result<(), ScrapeError> {
        if !self.phase.can_transition_to(to) {
            return Err(ScrapeError::InvalidTransition {
                from: self.phase,
                to,
            });
        }

        tracing::debug!("Crawl phase: {} -> {}", self.phase, to);
        self.phase = to;
        Ok(())
    }
}

/// Builds a coordinator and runs a complete crawl
///
/// # Example
///
/// ```no_run
/// use baku_dine::config::Config;
/// use baku_dine::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let outcome = run_crawl(Config::default()).await?;
/// println!("{} restaurants", outcome.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlOutcome, ScrapeError> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
