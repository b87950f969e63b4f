//! Detail page extraction
//!
//! A restaurant's own page lists its data under `h4` headings in Azerbaijani
//! ("Ünvan", "Mətbəx növü", ...), with the value in the next paragraph. Social
//! links, the map iframe and the photo carousel each have a dedicated
//! container.

use crate::config::SiteConfig;
use crate::crawler::sections::{
    apply, compile, element_text, find_after, find_ancestor, find_heading, link_texts, Extract,
    ExtractError, LabelRule,
};
use crate::record::DetailRecord;
use crate::url::resolve_link;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

/// Value stored for a CDN-obfuscated email link, which cannot be decoded
/// without running the page's script
pub const PROTECTED_EMAIL: &str = "protected";

/// Marker for the CDN's email obfuscation endpoint
const EMAIL_PROTECTION_MARKER: &str = "/cdn-cgi/l/email-protection";

/// Placeholder image served when a restaurant has no photos
const PLACEHOLDER_IMAGE_MARKER: &str = "noimage";

/// Detail fields located by heading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeadingField {
    Address,
    Cuisine,
    Category,
    WorkingHours,
    Description,
}

/// A heading lookup: `rule.label` names the heading, `value` the element after it
struct HeadingRule {
    rule: LabelRule<HeadingField>,
    heading: &'static str,
    value: &'static str,
}

const HEADING_RULES: [HeadingRule; 5] = [
    HeadingRule {
        rule: LabelRule {
            label: "Ünvan",
            extract: Extract::Text,
            field: HeadingField::Address,
        },
        heading: "h4",
        value: "p",
    },
    HeadingRule {
        rule: LabelRule {
            label: "Mətbəx növü",
            extract: Extract::LinkTexts,
            field: HeadingField::Cuisine,
        },
        heading: "h4",
        value: "p.place-view-kitchen",
    },
    HeadingRule {
        rule: LabelRule {
            label: "Kateqoriya",
            extract: Extract::Text,
            field: HeadingField::Category,
        },
        heading: "h4",
        value: "p",
    },
    HeadingRule {
        rule: LabelRule {
            label: "İş saatları",
            extract: Extract::Text,
            field: HeadingField::WorkingHours,
        },
        heading: "h4",
        value: "p",
    },
    HeadingRule {
        rule: LabelRule {
            label: "Məkan təsviri",
            extract: Extract::Text,
            field: HeadingField::Description,
        },
        heading: "h4.panel-title",
        value: "div.text",
    },
];

const SOCIAL_HEADING: &str = "Digər əlaqə vasitələri";

struct CompiledHeadingRule {
    rule: LabelRule<HeadingField>,
    heading: Selector,
    value: Selector,
}

/// Social platform a contact link belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialLink {
    Facebook,
    Instagram,
    Twitter,
    Foursquare,
    Email,
}

/// Classifies a contact link by its href and title
///
/// Checks run in a fixed priority order and the first match wins: facebook,
/// instagram, twitter, foursquare, then email. Returns the platform and the
/// value to store, or None for links that match nothing.
///
/// # Examples
///
/// ```
/// use baku_dine::crawler::{classify_social, SocialLink};
///
/// assert_eq!(
///     classify_social("mailto:info@example.com", ""),
///     Some((SocialLink::Email, "info@example.com".to_string()))
/// );
/// ```
pub fn classify_social(href: &str, title: &str) -> Option<(SocialLink, String)> {
    let href_lower = href.to_lowercase();
    let title_lower = title.to_lowercase();
    let mentions = |needle: &str| href_lower.contains(needle) || title_lower.contains(needle);

    if mentions("facebook") {
        Some((SocialLink::Facebook, href.to_string()))
    } else if mentions("instagram") {
        Some((SocialLink::Instagram, href.to_string()))
    } else if mentions("twitter") {
        Some((SocialLink::Twitter, href.to_string()))
    } else if title_lower.contains("foursquare") || href_lower.contains("4sq.com") {
        Some((SocialLink::Foursquare, href.to_string()))
    } else if href.contains("mailto:") {
        Some((SocialLink::Email, href.replace("mailto:", "")))
    } else if href.contains(EMAIL_PROTECTION_MARKER) {
        Some((SocialLink::Email, PROTECTED_EMAIL.to_string()))
    } else {
        None
    }
}

/// Parses restaurant detail pages
pub struct DetailExtractor {
    base: Url,
    heading_rules: Vec<CompiledHeadingRule>,
    title: Selector,
    phone_numbers: Selector,
    links: Selector,
    headings: Selector,
    social_container: Selector,
    iframes: Selector,
    carousel_images: Selector,
    map_source: Regex,
    map_center: Regex,
}

impl DetailExtractor {
    pub fn new(site: &SiteConfig) -> Result<Self, ExtractError> {
        let heading_rules = HEADING_RULES
            .iter()
            .map(|r| {
                Ok(CompiledHeadingRule {
                    rule: r.rule,
                    heading: compile(r.heading)?,
                    value: compile(r.value)?,
                })
            })
            .collect::<Result<Vec<_>, ExtractError>>()?;

        Ok(Self {
            base: Url::parse(&site.base_url)?,
            heading_rules,
            title: compile("h1.page_title")?,
            phone_numbers: compile("div.phone_numbers")?,
            links: compile("a")?,
            headings: compile("h4")?,
            social_container: compile("div.info_icon_text")?,
            iframes: compile("iframe[src]")?,
            carousel_images: compile("div.carousel-inner img")?,
            map_source: Regex::new(r"google\.com/maps")?,
            map_center: Regex::new(r"center=([-\d.]+),([-\d.]+)")?,
        })
    }

    /// Parses one detail page into a record for `url`
    ///
    /// Every field that cannot be located is left empty. `avg_cost_2_people`
    /// and `features` are never read here; they only exist on listing cards.
    pub fn parse_detail(&self, content: &str, url: &str) -> DetailRecord {
        let document = Html::parse_document(content);
        let mut record = DetailRecord::new(url);

        record.name = document
            .select(&self.title)
            .next()
            .map(|h1| element_text(&h1))
            .unwrap_or_default();

        for compiled in &self.heading_rules {
            let value = self.read_heading(&document, compiled);
            match compiled.rule.field {
                HeadingField::Address => record.address = value,
                HeadingField::Cuisine => record.cuisine = value,
                HeadingField::Category => record.category = value,
                HeadingField::WorkingHours => record.working_hours = value,
                HeadingField::Description => record.description = value,
            }
        }

        record.phones = document
            .select(&self.phone_numbers)
            .next()
            .map(|div| link_texts(&div, &self.links))
            .unwrap_or_default();

        self.read_social_links(&document, &mut record);

        if let Some((latitude, longitude)) = self.read_coordinates(&document) {
            record.latitude = latitude;
            record.longitude = longitude;
        }

        record.images = self.read_images(&document);

        tracing::debug!("Parsed detail page {} ({})", url, record.name);
        record
    }

    fn read_heading(&self, document: &Html, compiled: &CompiledHeadingRule) -> String {
        find_heading(document, &compiled.heading, compiled.rule.label)
            .and_then(|heading| find_after(document, &heading, &compiled.value))
            .map(|value| apply(compiled.rule.extract, &value, &self.links))
            .unwrap_or_default()
    }

    fn read_social_links(&self, document: &Html, record: &mut DetailRecord) {
        let Some(container) = find_heading(document, &self.headings, SOCIAL_HEADING)
            .and_then(|heading| find_ancestor(&heading, &self.social_container))
        else {
            return;
        };

        for link in container.select(&self.links) {
            let href = link.value().attr("href").unwrap_or("");
            let title = link.value().attr("title").unwrap_or("");

            // Later links overwrite earlier ones for the same platform
            match classify_social(href, title) {
                Some((SocialLink::Facebook, value)) => record.facebook = value,
                Some((SocialLink::Instagram, value)) => record.instagram = value,
                Some((SocialLink::Twitter, value)) => record.twitter = value,
                Some((SocialLink::Foursquare, value)) => record.foursquare = value,
                Some((SocialLink::Email, value)) => record.email = value,
                None => {}
            }
        }
    }

    fn read_coordinates(&self, document: &Html) -> Option<(String, String)> {
        let src = document
            .select(&self.iframes)
            .filter_map(|iframe| iframe.value().attr("src"))
            .find(|src| self.map_source.is_match(src))?;

        let captures = self.map_center.captures(src)?;
        Some((captures[1].to_string(), captures[2].to_string()))
    }

    fn read_images(&self, document: &Html) -> String {
        document
            .select(&self.carousel_images)
            .filter_map(|img| {
                let attrs = img.value();
                attrs
                    .attr("data-src")
                    .filter(|s| !s.trim().is_empty())
                    .or_else(|| attrs.attr("src"))
            })
            .filter(|src| !src.contains(PLACEHOLDER_IMAGE_MARKER))
            .filter_map(|src| resolve_link(src, &self.base))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
