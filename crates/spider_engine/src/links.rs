use std::collections::HashSet;

use scraper::{Html, Selector};
use url::Url;

/// Elements and the attribute on each that points at another resource.
const LINK_SOURCES: &[(&str, &str)] = &[
    ("a[href]", "href"),
    ("area[href]", "href"),
    ("link[href]", "href"),
    ("frame[src]", "src"),
    ("iframe[src]", "src"),
    ("img[src]", "src"),
    ("script[src]", "src"),
    ("form[action]", "action"),
];

/// Collects the distinct URIs an HTML document refers to, resolved against `base`.
///
/// Fragments are stripped; `javascript:` links and bare anchors are ignored.
pub fn extract_links(html: &str, base: &Url, max_links: usize) -> Vec<Url> {
    let document = Html::parse_document(html);
    let base = document_base(&document, base);

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for (css, attr) in LINK_SOURCES {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        for element in document.select(&selector) {
            if links.len() >= max_links {
                return links;
            }
            let Some(mut url) = element
                .value()
                .attr(attr)
                .and_then(|raw| resolve_url(raw, &base))
            else {
                continue;
            };
            url.set_fragment(None);
            if seen.insert(url.to_string()) {
                links.push(url);
            }
        }
    }
    links
}

fn document_base(document: &Html, fallback: &Url) -> Url {
    Selector::parse("base[href]")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|element| element.value().attr("href"))
                .and_then(|href| fallback.join(href.trim()).ok())
        })
        .unwrap_or_else(|| fallback.clone())
}

fn resolve_url(reference: &str, base: &Url) -> Option<Url> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with("javascript:") {
        return None;
    }
    base.join(trimmed).ok()
}
