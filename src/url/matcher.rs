use regex::Regex;

/// Recognizes links to restaurant detail pages
///
/// A detail link is the configured path prefix followed by a numeric id, e.g.
/// `/az/1-yemek-icmek/13-restoranlar/1234`. The match is a search, not an
/// anchored match, so both relative and absolute hrefs are accepted.
#[derive(Debug, Clone)]
pub struct DetailUrlMatcher {
    pattern: Regex,
}

impl DetailUrlMatcher {
    /// Builds a matcher for `<prefix><digits>`
    ///
    /// # Examples
    ///
    /// ```
    /// use baku_dine::url::DetailUrlMatcher;
    ///
    /// let matcher = DetailUrlMatcher::new("/az/1-yemek-icmek/13-restoranlar/").unwrap();
    /// assert!(matcher.is_match("/az/1-yemek-icmek/13-restoranlar/1234"));
    /// assert!(!matcher.is_match("/az/1-yemek-icmek/13-restoranlar-p2"));
    /// ```
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(r"{}\d+", regex::escape(prefix)))?;
        Ok(Self { pattern })
    }

    pub fn is_match(&self, href: &str) -> bool {
        self.pattern.is_match(href)
    }
}
