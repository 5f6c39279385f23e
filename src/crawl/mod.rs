// src/crawl/mod.rs
// =============================================================================
// This module discovers the pages to render.
//
// Two discovery modes:
// - crawl_start_url: follow <a> links from the start URL
// - crawl_sitemap: start from the entries of sitemap.xml
//
// Both end up in the same frontier loop (queue.rs) and fill the session's
// discovered-link set.
// =============================================================================

mod queue;
mod sitemap;

pub use queue::{crawl_start_url, CrawlContext, CrawlReport};
pub use sitemap::crawl_sitemap;
