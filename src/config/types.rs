use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Baku-Dine
///
/// Every section has defaults, so an empty file (or no file at all) yields the
/// stock BakuGuide crawl: 50 listing pages, 10 concurrent requests, 30s timeout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub site: SiteConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of listing pages to fetch (pages 1..=total_pages)
    #[serde(rename = "total-pages")]
    pub total_pages: u32,

    /// Maximum number of in-flight HTTP requests
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: u32,

    /// Wall-clock bound on a single request (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            total_pages: 50,
            max_concurrent_requests: 10,
            request_timeout: 30,
        }
    }
}

impl CrawlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// Target site layout
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Scheme and host every relative link is resolved against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Listing path; the page number is appended verbatim
    #[serde(rename = "listing-path")]
    pub listing_path: String,

    /// Path prefix of restaurant detail pages, followed by a numeric id
    #[serde(rename = "detail-path-prefix")]
    pub detail_path_prefix: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://bakuguide.com".to_string(),
            listing_path: "/az/1-yemek-icmek/13-restoranlar-p".to_string(),
            detail_path_prefix: "/az/1-yemek-icmek/13-restoranlar/".to_string(),
        }
    }
}

impl SiteConfig {
    /// Builds the URL of a listing page (1-based)
    pub fn listing_url(&self, page: u32) -> String {
        format!(
            "{}{}{}",
            self.base_url.trim_end_matches('/'),
            self.listing_path,
            page
        )
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "baku-dine".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl UserAgentConfig {
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.crawler_name, self.crawler_version)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the CSV table written after a crawl
    #[serde(rename = "csv-path")]
    pub csv_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: "bakuguide_restaurants.csv".to_string(),
        }
    }
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub total_pages: Option<u32>,
    pub max_concurrent_requests: Option<u32>,
    pub request_timeout: Option<u64>,
    pub csv_path: Option<String>,
}

impl Config {
    /// Applies command-line overrides in place
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(pages) = overrides.total_pages {
            self.crawler.total_pages = pages;
        }
        if let Some(limit) = overrides.max_concurrent_requests {
            self.crawler.max_concurrent_requests = limit;
        }
        if let Some(secs) = overrides.request_timeout {
            self.crawler.request_timeout = secs;
        }
        if let Some(path) = &overrides.csv_path {
            self.output.csv_path = path.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.crawler.total_pages, 50);
        assert_eq!(config.crawler.max_concurrent_requests, 10);
        assert_eq!(config.crawler.timeout(), Duration::from_secs(30));
        assert_eq!(config.output.csv_path, "bakuguide_restaurants.csv");
    }

    #[test]
    fn test_listing_url() {
        let site = SiteConfig::default();
        assert_eq!(
            site.listing_url(3),
            "https://bakuguide.com/az/1-yemek-icmek/13-restoranlar-p3"
        );
    }

    #[test]
    fn test_listing_url_trailing_slash_base() {
        let site = SiteConfig {
            base_url: "http://127.0.0.1:8080/".to_string(),
            ..SiteConfig::default()
        };
        assert_eq!(
            site.listing_url(1),
            "http://127.0.0.1:8080/az/1-yemek-icmek/13-restoranlar-p1"
        );
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        config.apply(&Overrides {
            total_pages: Some(2),
            request_timeout: Some(5),
            ..Overrides::default()
        });
        assert_eq!(config.crawler.total_pages, 2);
        assert_eq!(config.crawler.max_concurrent_requests, 10);
        assert_eq!(config.crawler.request_timeout, 5);
    }
}
