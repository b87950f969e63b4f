//! Listing page extraction
//!
//! A listing page shows one `article.card` per restaurant. Each card links to
//! the restaurant's detail page and carries a handful of labelled rows
//! (price, features, cuisine, hours, address, phone).

use crate::config::SiteConfig;
use crate::crawler::sections::{
    apply, compile, find_row_value, Extract, ExtractError, LabelRule,
};
use crate::record::{ListingField, PartialRecord};
use crate::url::{resolve_link, DetailUrlMatcher};
use scraper::{ElementRef, Html, Selector};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use url::Url;

/// Rows read from every listing card
pub const LISTING_RULES: [LabelRule<ListingField>; 6] = [
    LabelRule {
        label: "2 nəfərə orta xərc",
        extract: Extract::Price,
        field: ListingField::AvgCost,
    },
    LabelRule {
        label: "Xüsusiyyətləri",
        extract: Extract::LinkTexts,
        field: ListingField::Features,
    },
    LabelRule {
        label: "Mətbəx",
        extract: Extract::LinkTexts,
        field: ListingField::Cuisine,
    },
    LabelRule {
        label: "İş saatları",
        extract: Extract::Text,
        field: ListingField::WorkingHours,
    },
    LabelRule {
        label: "Ünvan",
        extract: Extract::Text,
        field: ListingField::Address,
    },
    LabelRule {
        label: "Telefon",
        extract: Extract::Text,
        field: ListingField::Phones,
    },
];

/// Parses listing pages into URL-keyed partial records
#[derive(Debug, Clone)]
pub struct ListingExtractor {
    base: Url,
    detail_urls: DetailUrlMatcher,
    cards: Selector,
    anchors: Selector,
    rows: Selector,
    label_column: Selector,
    value_column: Selector,
    links: Selector,
}

impl ListingExtractor {
    pub fn new(site: &SiteConfig) -> Result<Self, ExtractError> {
        Ok(Self {
            base: Url::parse(&site.base_url)?,
            detail_urls: DetailUrlMatcher::new(&site.detail_path_prefix)?,
            cards: compile("article.card")?,
            anchors: compile("a[href]")?,
            rows: compile("div.row")?,
            label_column: compile("div.col-lg-3")?,
            value_column: compile("div.col-lg-9")?,
            links: compile("a")?,
        })
    }

    /// Parses one listing page
    ///
    /// Cards without a detail link (ads, placeholders) are skipped. A page
    /// with no recognizable cards yields an empty map. Repeated cards for one
    /// URL are combined, the earlier card winning per field.
    pub fn parse_listing(&self, content: &str) -> HashMap<String, PartialRecord> {
        let document = Html::parse_document(content);
        let mut records: HashMap<String, PartialRecord> = HashMap::new();

        for card in document.select(&self.cards) {
            let Some(url) = self.detail_url(&card) else {
                tracing::trace!("Skipping listing card without a detail link");
                continue;
            };

            let partial = self.parse_card(&card, &url);
            match records.entry(url) {
                Entry::Occupied(existing) => existing.into_mut().absorb(partial),
                Entry::Vacant(slot) => {
                    slot.insert(partial);
                }
            }
        }

        tracing::debug!("Listing page yielded {} restaurants", records.len());
        records
    }

    /// Returns the absolute detail URL of a card, if it has one
    fn detail_url(&self, card: &ElementRef) -> Option<String> {
        card.select(&self.anchors)
            .filter_map(|a| a.value().attr("href"))
            .find(|href| self.detail_urls.is_match(href))
            .and_then(|href| resolve_link(href, &self.base))
    }

    fn parse_card(&self, card: &ElementRef, url: &str) -> PartialRecord {
        let rows: Vec<ElementRef> = card.select(&self.rows).collect();
        let mut partial = PartialRecord::default();

        for rule in &LISTING_RULES {
            if let Some(value) = self.read_rule(&rows, rule) {
                partial.set(rule.field, value);
            }
        }

        tracing::trace!("Parsed listing card for {}", url);
        partial
    }

    fn read_rule(&self, rows: &[ElementRef], rule: &LabelRule<ListingField>) -> Option<String> {
        let value = find_row_value(rows, &self.label_column, &self.value_column, rule.label)?;
        let text = apply(rule.extract, &value, &self.links);
        Some(text).filter(|t| !t.is_empty())
    }
}
