use scraper::{Html, Selector};
use std::sync::LazyLock;

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

/// Returns the raw `href` of every anchor in document order
///
/// Relative and malformed values are returned untouched.
pub fn anchors(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);

    let links = doc
        .select(&ANCHOR_SELECTOR)
        .filter_map(|e| e.value().attr("href"))
        .map(|s| s.to_string())
        .collect::<Vec<String>>();

    ::log::debug!("HTML parser found {} anchors", links.len());
    if !links.is_empty() {
        ::log::debug!(
            "First few anchors: {:?}",
            links.iter().take(5).collect::<Vec<_>>()
        );
    }

    links
}
