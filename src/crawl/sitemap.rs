// src/crawl/sitemap.rs
// =============================================================================
// Seeds the crawl from <start_url>/sitemap.xml instead of the start page.
//
// Sitemap entries are trusted: they are admitted without the scope and
// liveness checks that links found in pages go through. They still get
// visited, so their pages are fetched and their <a> links are crawled
// (and validated) normally.
//
// The only check kept is the fragment one: no admitted link ever has a '#'.
// =============================================================================

use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::queue::{crawl_from, CrawlContext, CrawlItem, CrawlReport, LinkSource};
use crate::error::FetchError;

pub fn sitemap_url(start_url: &str) -> String {
    format!("{start_url}/sitemap.xml")
}

// Pulls the text of every <loc> element out of a sitemap
//
// html5ever is lenient enough to parse sitemap XML: <loc> becomes an
// unknown element whose text we can read like any other.
pub fn extract_locations(xml: &str) -> Vec<String> {
    let document = Html::parse_document(xml);
    let selector = match Selector::parse("loc") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|location| !location.is_empty())
        .collect()
}

// Fetches the sitemap, admits its entries and crawls from them
pub async fn crawl_sitemap(ctx: Arc<CrawlContext>) -> Result<CrawlReport, FetchError> {
    let url = sitemap_url(ctx.session.start_url());
    let xml = ctx.fetcher.fetch_page(&url).await?;
    let locations = extract_locations(&xml);
    info!(sitemap = %url, entries = locations.len(), "loaded sitemap");

    let budget = ctx.session.depth();
    let mut seeds = Vec::new();
    for location in locations {
        if location.contains('#') {
            warn!("Skipping sitemap entry with a fragment: {location}");
            continue;
        }
        ctx.session.admit(&location);
        if ctx.session.claim(&location) {
            seeds.push(CrawlItem {
                url: location,
                budget,
                source: LinkSource::Sitemap,
            });
        } else {
            debug!("Duplicate sitemap entry: {location}");
        }
    }

    Ok(crawl_from(ctx, seeds).await)
}
