/// Crawl phase definitions
use std::fmt;

/// The phase a crawl run is currently in
///
/// Phases advance strictly in declaration order:
/// `Idle → FetchingListings → ExtractingListings → FetchingDetails →
/// ExtractingDetails → Merging → Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CrawlPhase {
    /// Coordinator built, nothing requested yet
    Idle,

    /// Listing pages are being fetched concurrently
    FetchingListings,

    /// Listing pages are being parsed and folded by URL
    ExtractingListings,

    /// Detail pages for every discovered URL are being fetched
    FetchingDetails,

    /// Detail pages are being parsed
    ExtractingDetails,

    /// Detail records are being merged with listing records
    Merging,

    /// Final records are available
    Done,
}

impl CrawlPhase {
    /// Returns the phase that follows this one, if any
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::FetchingListings),
            Self::FetchingListings => Some(Self::ExtractingListings),
            Self::ExtractingListings => Some(Self::FetchingDetails),
            Self::FetchingDetails => Some(Self::ExtractingDetails),
            Self::ExtractingDetails => Some(Self::Merging),
            Self::Merging => Some(Self::Done),
            Self::Done => None,
        }
    }

    /// Only single forward steps are legal
    pub fn can_transition_to(&self, to: Self) -> bool {
        self.next() == Some(to)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FetchingListings => "fetching_listings",
            Self::ExtractingListings => "extracting_listings",
            Self::FetchingDetails => "fetching_details",
            Self::ExtractingDetails => "extracting_details",
            Self::Merging => "merging",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
