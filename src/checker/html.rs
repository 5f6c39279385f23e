// src/checker/html.rs
// =============================================================================
// This module extracts crawlable links from HTML pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// Resolution rules:
// - "/docs/a"        -> start URL + "/docs/a"   (root-relative)
// - "//cdn.x.com/a"  -> scheme of the start URL + "//cdn.x.com/a"
// - "https://x/a"    -> kept as-is
// - "guide.html"     -> joined with the page URL (document-relative)
// - "#top", "mailto:", "tel:", "javascript:", "data:" -> skipped
//
// Note the root-relative rule is a plain string prefix, not Url::join: the
// start URL may carry a path prefix and the crawl scope is defined by it.
// =============================================================================

use scraper::{Html, Selector};
use url::Url;

// Extracts the resolved href of every <a> on a page
//
// Parameters:
//   html: the page content
//   page_url: where the page was fetched from (for document-relative links)
//   start_url: the crawl's start URL (for root-relative links)
//
// Returns: absolute URLs in document order, duplicates included
pub fn extract_anchor_links(html: &str, page_url: &str, start_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };
    let page = Url::parse(page_url).ok();

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_href(href.trim(), page.as_ref(), start_url))
        .collect()
}

// Resolves one href following the rules in the header comment
pub fn resolve_href(href: &str, page: Option<&Url>, start_url: &str) -> Option<String> {
    if href.is_empty() || href.starts_with('#') || is_special_scheme(href) {
        return None;
    }

    if let Some(rest) = href.strip_prefix("//") {
        let scheme = start_url.split("://").next().unwrap_or("https");
        return Some(format!("{scheme}://{rest}"));
    }

    if href.starts_with('/') {
        return Some(resolve_root_relative(href, start_url));
    }

    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }

    // Anything else is relative to the page it appears on
    page.and_then(|base| base.join(href).ok())
        .map(|url| url.to_string())
}

/// Prefixes a root-relative path with the start URL.
pub fn resolve_root_relative(path: &str, start_url: &str) -> String {
    format!("{start_url}{path}")
}

fn is_special_scheme(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    ["mailto:", "tel:", "javascript:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}
