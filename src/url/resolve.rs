use url::Url;

/// Resolves an href to an absolute http(s) URL
///
/// Returns None if the link should be ignored:
/// - empty hrefs and fragment-only anchors
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - hrefs that do not resolve against `base`
///
/// # Examples
///
/// ```
/// use baku_dine::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://bakuguide.com").unwrap();
/// assert_eq!(
///     resolve_link("/az/1-yemek-icmek/13-restoranlar/7", &base).as_deref(),
///     Some("https://bakuguide.com/az/1-yemek-icmek/13-restoranlar/7")
/// );
/// assert_eq!(resolve_link("mailto:info@example.com", &base), None);
/// ```
pub fn resolve_link(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://bakuguide.com").unwrap()
    }

    #[test]
    fn test_resolve_absolute_path() {
        assert_eq!(
            resolve_link("/upload/places/1.jpg", &base_url()).as_deref(),
            Some("https://bakuguide.com/upload/places/1.jpg")
        );
    }

    #[test]
    fn test_resolve_keeps_absolute_url() {
        assert_eq!(
            resolve_link("https://cdn.example.com/a.jpg", &base_url()).as_deref(),
            Some("https://cdn.example.com/a.jpg")
        );
    }

    #[test]
    fn test_resolve_trims_whitespace() {
        assert_eq!(
            resolve_link("  /a  ", &base_url()).as_deref(),
            Some("https://bakuguide.com/a")
        );
    }

    #[test]
    fn test_skip_special_schemes() {
        assert_eq!(resolve_link("javascript:void(0)", &base_url()), None);
        assert_eq!(resolve_link("tel:+994125555555", &base_url()), None);
        assert_eq!(resolve_link("data:image/png;base64,AAAA", &base_url()), None);
    }

    #[test]
    fn test_skip_empty_and_fragment() {
        assert_eq!(resolve_link("", &base_url()), None);
        assert_eq!(resolve_link("#gallery", &base_url()), None);
    }
}
