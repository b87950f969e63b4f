//! Label-driven section lookup
//!
//! Both page types present their data as "label, then value" pairs: listing
//! cards use two-column rows, detail pages use a heading followed by a
//! paragraph. Extractors describe each field as a [`LabelRule`] and the
//! routines here do the traversal.

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Errors raised while building an extractor
///
/// Everything fallible (selectors, patterns, the base URL) is compiled up
/// front, so parsing a page itself cannot fail: a missing element just
/// leaves its field empty.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid CSS selector '{css}': {message}")]
    InvalidSelector { css: String, message: String },

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Invalid base URL: {0}")]
    InvalidBase(#[from] url::ParseError),
}

/// How the value element is turned into a string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    /// Trimmed text of the whole element
    Text,

    /// Text of every link inside the element, joined with `"; "`
    LinkTexts,

    /// Trimmed text with the manat suffix removed
    Price,
}

/// One declarative field lookup: find `label`, apply `extract`, store in `field`
#[derive(Debug, Clone, Copy)]
pub struct LabelRule<F> {
    pub label: &'static str,
    pub extract: Extract,
    pub field: F,
}

/// Compiles a CSS selector, keeping the failing text in the error
pub fn compile(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::InvalidSelector {
        css: css.to_string(),
        message: format!("{:?}", e),
    })
}

/// Text content with every text node trimmed and concatenated
///
/// Whitespace between inline fragments is dropped, so
/// `<p>10:00 <b>-</b> 23:00</p>` reads `10:00-23:00`.
pub fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Joins the text of every `<a>` inside `element` with `"; "`
pub fn link_texts(element: &ElementRef, links: &Selector) -> String {
    element
        .select(links)
        .map(|a| element_text(&a))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Applies an extraction rule to a value element
pub fn apply(extract: Extract, element: &ElementRef, links: &Selector) -> String {
    match extract {
        Extract::Text => element_text(element),
        Extract::LinkTexts => link_texts(element, links),
        Extract::Price => strip_currency(&element_text(element)),
    }
}

/// Removes the manat suffix ("M" or "₼") from a price
pub fn strip_currency(text: &str) -> String {
    text.replace(['M', '₼'], "").trim().to_string()
}

/// Finds the value column of the first row whose label column contains `label`
///
/// The scan stops at the first row whose label matches, even when that row has
/// no value column, in which case the field is simply absent.
pub fn find_row_value<'a>(
    rows: &[ElementRef<'a>],
    label_column: &Selector,
    value_column: &Selector,
    label: &str,
) -> Option<ElementRef<'a>> {
    let row = rows.iter().find(|row| {
        row.select(label_column)
            .next()
            .map(|col| col.text().collect::<String>().contains(label))
            .unwrap_or(false)
    })?;

    row.select(value_column).next()
}

/// Finds the first element matching `headings` whose trimmed text equals `label`
pub fn find_heading<'a>(document: &'a Html, headings: &Selector, label: &str) -> Option<ElementRef<'a>> {
    document
        .select(headings)
        .find(|heading| element_text(heading) == label)
}

/// Finds the first element matching `selector` after `anchor` in document order
pub fn find_after<'a>(
    document: &'a Html,
    anchor: &ElementRef<'a>,
    selector: &Selector,
) -> Option<ElementRef<'a>> {
    let anchor_id = anchor.id();

    document
        .root_element()
        .descendants()
        .skip_while(|node| node.id() != anchor_id)
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|element| selector.matches(element))
}

/// Finds the closest ancestor of `element` matching `selector`
pub fn find_ancestor<'a>(element: &ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| selector.matches(ancestor))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> Selector {
        compile("a").unwrap()
    }

    #[test]
    fn test_compile_invalid_selector() {
        let result = compile("div[");
        assert!(matches!(result, Err(ExtractError::InvalidSelector { .. })));
    }

    #[test]
    fn test_element_text_concatenates_trimmed_fragments() {
        let html = Html::parse_fragment("<p>  10:00 <b> - </b> 23:00  </p>");
        let p = html.select(&compile("p").unwrap()).next().unwrap();
        assert_eq!(element_text(&p), "10:00-23:00");
    }

    #[test]
    fn test_link_texts_joined() {
        let html = Html::parse_fragment(
            r#"<div><a href="/1">WiFi</a>, <a href="/2"> Terras </a><a href="/3"></a></div>"#,
        );
        let div = html.select(&compile("div").unwrap()).next().unwrap();
        assert_eq!(link_texts(&div, &links()), "WiFi; Terras");
    }

    #[test]
    fn test_strip_currency() {
        assert_eq!(strip_currency("25 M"), "25");
        assert_eq!(strip_currency("20-30₼"), "20-30");
        assert_eq!(strip_currency("  "), "");
    }

    #[test]
    fn test_find_row_value_substring_match() {
        let html = Html::parse_fragment(
            r#"
            <div class="row"><div class="col-lg-3">Ünvan:</div><div class="col-lg-9">Nizami 10</div></div>
            <div class="row"><div class="col-lg-3">Telefon</div><div class="col-lg-9">+994</div></div>
            "#,
        );
        let rows: Vec<_> = html.select(&compile("div.row").unwrap()).collect();
        let label = compile("div.col-lg-3").unwrap();
        let value = compile("div.col-lg-9").unwrap();

        let found = find_row_value(&rows, &label, &value, "Ünvan").unwrap();
        assert_eq!(element_text(&found), "Nizami 10");
        assert!(find_row_value(&rows, &label, &value, "Mətbəx").is_none());
    }

    #[test]
    fn test_find_row_value_stops_at_first_label_match() {
        let html = Html::parse_fragment(
            r#"
            <div class="row"><div class="col-lg-3">Telefon</div></div>
            <div class="row"><div class="col-lg-3">Telefon</div><div class="col-lg-9">+994</div></div>
            "#,
        );
        let rows: Vec<_> = html.select(&compile("div.row").unwrap()).collect();
        let label = compile("div.col-lg-3").unwrap();
        let value = compile("div.col-lg-9").unwrap();

        assert!(find_row_value(&rows, &label, &value, "Telefon").is_none());
    }

    #[test]
    fn test_find_heading_exact_text() {
        let html = Html::parse_document(
            "<h4>Ünvan və xəritə</h4><h4> Ünvan </h4><p>Nizami 10</p>",
        );
        let h4 = compile("h4").unwrap();
        let heading = find_heading(&html, &h4, "Ünvan").unwrap();
        let p = find_after(&html, &heading, &compile("p").unwrap()).unwrap();
        assert_eq!(element_text(&p), "Nizami 10");
    }

    #[test]
    fn test_find_after_skips_earlier_elements() {
        let html = Html::parse_document(
            r#"<p>before</p><div><h4>Kateqoriya</h4></div><section><p>Restoran</p></section>"#,
        );
        let heading = find_heading(&html, &compile("h4").unwrap(), "Kateqoriya").unwrap();
        let p = find_after(&html, &heading, &compile("p").unwrap()).unwrap();
        assert_eq!(element_text(&p), "Restoran");
    }

    #[test]
    fn test_find_ancestor() {
        let html = Html::parse_document(
            r#"<div class="info_icon_text"><div><h4>Digər əlaqə vasitələri</h4></div></div>"#,
        );
        let heading = find_heading(&html, &compile("h4").unwrap(), "Digər əlaqə vasitələri").unwrap();
        let parent = find_ancestor(&heading, &compile("div.info_icon_text").unwrap());
        assert!(parent.is_some());
        assert!(find_ancestor(&heading, &compile("section").unwrap()).is_none());
    }
}
