//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the crawler's user agent and timeout
//! - Capping the number of in-flight requests with a shared semaphore
//! - Classifying failures (timeout, bad status, transport)
//!
//! A failure is data, not an error path: the caller logs it and moves on.

use crate::config::{Config, UserAgentConfig};
use reqwest::Client;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;

/// Why a fetch produced no content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchCause {
    /// The request did not finish within the configured timeout
    Timeout,

    /// The server answered with a non-2xx status
    Status(u16),

    /// Connection, DNS, TLS or protocol error
    Transport(String),

    /// The response body could not be read or decoded
    Body(String),
}

impl fmt::Display for FetchCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "request timeout"),
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::Transport(error) => write!(f, "transport error: {}", error),
            Self::Body(error) => write!(f, "body error: {}", error),
        }
    }
}

/// A fetch that yielded no data for `url`
#[derive(Debug, Clone, Error)]
#[error("Fetch failed for {url}: {cause}")]
pub struct FetchFailure {
    pub url: String,
    pub cause: FetchCause,
}

impl FetchFailure {
    fn new(url: &str, cause: FetchCause) -> Self {
        Self {
            url: url.to_string(),
            cause,
        }
    }

    fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        let cause = if error.is_timeout() {
            FetchCause::Timeout
        } else if error.is_body() || error.is_decode() {
            FetchCause::Body(error.to_string())
        } else {
            FetchCause::Transport(error.to_string())
        };
        Self::new(url, cause)
    }
}

/// Builds an HTTP client with proper configuration
///
/// The timeout covers the whole request, from connecting until the body has
/// been read.
///
/// # Example
///
/// ```no_run
/// use baku_dine::config::UserAgentConfig;
/// use baku_dine::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Page fetcher with a global concurrency cap
///
/// Cloning is cheap and every clone shares the same connection pool and the
/// same permit pool, so the cap holds across all spawned fetch tasks.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl Fetcher {
    /// Creates a fetcher allowing at most `max_concurrent` requests at once
    pub fn new(client: Client, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            client,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Builds the client and permit pool from the crawler configuration
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.user_agent, config.crawler.timeout())?;
        Ok(Self::new(
            client,
            config.crawler.max_concurrent_requests as usize,
        ))
    }

    /// Fetches a URL and returns its body text
    ///
    /// Waits for a free slot first; the slot is released when this future
    /// completes or is dropped, whatever the outcome.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchFailure> {
        let _permit = self.permits.acquire().await.map_err(|_| {
            FetchFailure::new(url, FetchCause::Transport("fetcher is shut down".to_string()))
        })?;
        let _in_flight = InFlight::enter(&self.in_flight, &self.peak_in_flight);

        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchFailure::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::new(url, FetchCause::Status(status.as_u16())));
        }

        response
            .text()
            .await
            .map_err(|e| FetchFailure::from_reqwest(url, e))
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Highest number of requests observed in flight at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

/// Counts a request as in flight for as long as it lives
struct InFlight {
    counter: Arc<AtomicUsize>,
}

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>, peak: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self {
            counter: Arc::clone(counter),
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}
