// src/checker/mod.rs
// =============================================================================
// This module contains everything that looks at a single link.
//
// Submodules:
// - http: the shared HTTP client (timeouts, retries, liveness probe)
// - html: extracts and resolves <a href> links from a page
// - scope: the link validator (start URL, fragment, base path, liveness)
//
// The crawl module builds on top of these; nothing here knows about queues
// or concurrency.
// =============================================================================

mod html;
mod http;
mod scope;

pub use html::extract_anchor_links;
pub use http::Fetcher;
pub use scope::LinkValidator;
