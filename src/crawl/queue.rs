// src/crawl/queue.rs
// =============================================================================
// This module implements the crawl as a frontier queue drained by a bounded
// pool of concurrent tasks, one depth level at a time.
//
// How it works:
// 1. The seed URL(s) are claimed and form the first level
// 2. The scheduler spawns up to `concurrency` visit tasks from the level
// 3. Each visit validates + admits its URL, fetches the page and extracts
//    links
// 4. Every extracted link the task manages to claim goes into the next
//    level with one less depth budget
// 5. When the level is done, the next one starts; stop when it is empty
//
// Deduplication:
// - A URL enters a level only after CrawlSession::claim returned true
// - claim is one atomic insert on a DashSet, so two pages linking to the
//   same URL at the same time still produce exactly one visit
// - Levels never overlap, so a URL is always claimed by one of its
//   shallowest parents and keeps the largest budget it can get, however
//   slow the other pages are
//
// Rust concepts:
// - FuturesUnordered: a set of running futures, yields whichever ends first
// - tokio::spawn: runs each visit on the multi-threaded runtime
// - Arc: shares the session and HTTP client between tasks
// =============================================================================

use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::checker::{extract_anchor_links, Fetcher, LinkValidator};
use crate::session::CrawlSession;

// Where a frontier item came from
//
// This decides how it is admitted when visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSource {
    /// The start URL. Admitted if valid, but always fetched and expanded.
    Seed,
    /// Found in an <a href>. Must pass the validator to be admitted or fetched.
    Anchor,
    /// Listed in sitemap.xml. Already admitted by the loader, never re-validated.
    Sitemap,
}

// Represents a page in the crawl queue
#[derive(Debug, Clone)]
pub struct CrawlItem {
    pub url: String,
    pub budget: usize, // Remaining depth; 0 means "do not visit"
    pub source: LinkSource,
}

// What a single visit produced
#[derive(Debug, Default)]
struct VisitOutcome {
    children: Vec<CrawlItem>,
    fetched: bool,
    fetch_failed: bool,
}

/// Totals for one traversal, used in logs and the run summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CrawlReport {
    pub visited: usize,
    pub failed_fetches: usize,
    pub discovered: usize,
}

// Everything a visit task needs, shared behind one Arc
#[derive(Debug)]
pub struct CrawlContext {
    pub session: Arc<CrawlSession>,
    pub fetcher: Fetcher,
    pub validator: LinkValidator,
    pub concurrency: usize,
}

impl CrawlContext {
    pub fn new(session: Arc<CrawlSession>, fetcher: Fetcher, concurrency: usize) -> Self {
        let validator = LinkValidator::new(
            session.start_url(),
            session.base_path(),
            fetcher.clone(),
        );
        Self {
            session,
            fetcher,
            validator,
            concurrency: concurrency.max(1),
        }
    }
}

// Crawls starting from the session's start URL
pub async fn crawl_start_url(ctx: Arc<CrawlContext>) -> CrawlReport {
    let start_url = ctx.session.start_url().to_string();
    let mut seeds = Vec::new();
    if ctx.session.claim(&start_url) {
        seeds.push(CrawlItem {
            url: start_url,
            budget: ctx.session.depth(),
            source: LinkSource::Seed,
        });
    }
    crawl_from(ctx, seeds).await
}

// Drains the frontier level by level until no work is left
//
// Parameters:
//   ctx: shared crawl state
//   seeds: already-claimed items to start from, all on the same level
//
// Returns: counters for the whole traversal
pub async fn crawl_from(ctx: Arc<CrawlContext>, seeds: Vec<CrawlItem>) -> CrawlReport {
    let mut level: VecDeque<CrawlItem> = seeds.into();
    let mut report = CrawlReport::default();
    let mut depth = 0;

    while !level.is_empty() {
        debug!(level = depth, pages = level.len(), "crawling level");
        level = crawl_level(&ctx, level, &mut report).await;
        depth += 1;
    }

    report.discovered = ctx.session.discovered_count();
    info!(
        visited = report.visited,
        failed = report.failed_fetches,
        discovered = report.discovered,
        "crawl finished"
    );
    report
}

// Visits every item of one level with at most `concurrency` tasks in flight
//
// Returns the items claimed for the next level.
async fn crawl_level(
    ctx: &Arc<CrawlContext>,
    mut frontier: VecDeque<CrawlItem>,
    report: &mut CrawlReport,
) -> VecDeque<CrawlItem> {
    let mut next = VecDeque::new();
    let mut active = FuturesUnordered::new();

    loop {
        // Fill free worker slots from the frontier
        while active.len() < ctx.concurrency {
            let Some(item) = frontier.pop_front() else {
                break;
            };
            let ctx = Arc::clone(ctx);
            active.push(tokio::spawn(async move { visit(&ctx, item).await }));
        }

        // Wait for any task; None means nothing is running and nothing is queued
        match active.next().await {
            Some(Ok(outcome)) => {
                if outcome.fetched {
                    report.visited += 1;
                }
                if outcome.fetch_failed {
                    report.failed_fetches += 1;
                }
                next.extend(outcome.children);
            }
            Some(Err(e)) => error!("crawl task panicked: {e}"),
            None => break,
        }
    }
    next
}

// Visits one claimed URL
async fn visit(ctx: &CrawlContext, item: CrawlItem) -> VisitOutcome {
    let mut outcome = VisitOutcome::default();
    if item.budget == 0 {
        return outcome;
    }

    debug!(url = %item.url, budget = item.budget, "crawling");

    match item.source {
        LinkSource::Anchor => {
            if !ctx.validator.is_valid(&item.url).await {
                return outcome;
            }
            ctx.session.admit(&item.url);
        }
        LinkSource::Seed => {
            if ctx.validator.is_valid(&item.url).await {
                ctx.session.admit(&item.url);
            }
        }
        LinkSource::Sitemap => {}
    }

    let html = match ctx.fetcher.fetch_page(&item.url).await {
        Ok(html) => html,
        Err(e) => {
            error!("Cannot access the URL {}: {e}", item.url);
            outcome.fetch_failed = true;
            return outcome;
        }
    };
    outcome.fetched = true;

    let child_budget = item.budget - 1;
    if child_budget == 0 {
        return outcome;
    }

    outcome.children = extract_anchor_links(&html, &item.url, ctx.session.start_url())
        .into_iter()
        .filter(|url| ctx.session.claim(url))
        .map(|url| CrawlItem {
            url,
            budget: child_budget,
            source: LinkSource::Anchor,
        })
        .collect();

    debug!(url = %item.url, new_links = outcome.children.len(), "page expanded");
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context(start_url: &str, base_path: &str, depth: usize, concurrency: usize) -> Arc<CrawlContext> {
        let session = Arc::new(CrawlSession::new(start_url, base_path, depth, "out"));
        Arc::new(CrawlContext::new(session, Fetcher::new().unwrap(), concurrency))
    }

    async fn page(server: &MockServer, route: &str, body: &str, status: u16, hits: u64) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string(body.to_string()))
            .expect(hits)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_crawl_respects_scope_and_visits_each_page_once() {
        let server = MockServer::start().await;
        // Seed: out of base path, so fetched once but never validated
        page(&server, "/", r#"<a href="/docs/a">A</a><a href="/docs/b">B</a><a href="/other">O</a>"#, 200, 1).await;
        // Admitted pages: one liveness probe + one content fetch each
        page(&server, "/docs/a", r##"<a href="/docs/b">B</a><a href="/docs/a#x">self</a><a href="/">home</a>"##, 200, 2).await;
        page(&server, "/docs/b", r#"<a href="/docs/a">A</a><a href="/docs/c">C</a>"#, 200, 2).await;
        // Broken page: probed once, never fetched for content
        page(&server, "/docs/c", "gone", 404, 1).await;
        page(&server, "/other", "", 200, 0).await;

        let ctx = context(&server.uri(), "/docs", 100, 4);
        let report = crawl_start_url(Arc::clone(&ctx)).await;

        let base = server.uri();
        assert_eq!(
            ctx.session.links(),
            vec![format!("{base}/docs/a"), format!("{base}/docs/b")]
        );
        assert_eq!(report.visited, 3);
        assert_eq!(report.discovered, 2);
    }

    #[tokio::test]
    async fn test_depth_zero_does_nothing() {
        let server = MockServer::start().await;
        page(&server, "/", r#"<a href="/a">A</a>"#, 200, 0).await;

        let ctx = context(&server.uri(), "/", 0, 4);
        let report = crawl_start_url(Arc::clone(&ctx)).await;

        assert!(ctx.session.links().is_empty());
        assert_eq!(report, CrawlReport::default());
    }

    #[tokio::test]
    async fn test_depth_one_only_visits_the_seed() {
        let server = MockServer::start().await;
        page(&server, "/", r#"<a href="/a">A</a>"#, 200, 2).await;
        page(&server, "/a", "", 200, 0).await;

        let ctx = context(&server.uri(), "/", 1, 4);
        crawl_start_url(Arc::clone(&ctx)).await;

        assert_eq!(ctx.session.links(), vec![server.uri()]);
    }

    #[tokio::test]
    async fn test_depth_counts_levels() {
        let server = MockServer::start().await;
        page(&server, "/", r#"<a href="/l1">1</a>"#, 200, 2).await;
        page(&server, "/l1", r#"<a href="/l2">2</a>"#, 200, 2).await;
        page(&server, "/l2", r#"<a href="/l3">3</a>"#, 200, 0).await;

        let ctx = context(&server.uri(), "/", 2, 4);
        crawl_start_url(Arc::clone(&ctx)).await;

        assert_eq!(ctx.session.links().len(), 2);
    }

    #[tokio::test]
    async fn test_slow_shallow_parent_keeps_the_larger_budget() {
        let server = MockServer::start().await;
        page(&server, "/", r#"<a href="/slow">S</a><a href="/a">A</a>"#, 200, 2).await;
        page(&server, "/a", r#"<a href="/b">B</a>"#, 200, 2).await;
        page(&server, "/b", r#"<a href="/x">X</a>"#, 200, 2).await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<a href="/x">X</a>"#)
                    .set_delay(Duration::from_millis(800)),
            )
            .expect(2)
            .mount(&server)
            .await;
        page(&server, "/x", r#"<a href="/y">Y</a>"#, 200, 2).await;
        // Three levels below the seed, so still inside a depth of 4
        page(&server, "/y", "", 200, 2).await;

        let ctx = context(&server.uri(), "/", 4, 8);
        crawl_start_url(Arc::clone(&ctx)).await;

        let base = server.uri();
        assert_eq!(
            ctx.session.links(),
            vec![
                base.clone(),
                format!("{base}/a"),
                format!("{base}/b"),
                format!("{base}/slow"),
                format!("{base}/x"),
                format!("{base}/y"),
            ]
        );
    }

    #[tokio::test]
    async fn test_many_pages_linking_to_the_same_targets_admit_each_once() {
        let server = MockServer::start().await;
        let hubs: String = (0..20).map(|i| format!(r#"<a href="/hub/{i}">h</a>"#)).collect();
        let shared: String = (0..10).map(|i| format!(r#"<a href="/shared/{i}">s</a>"#)).collect();

        page(&server, "/", &hubs, 200, 2).await;
        for i in 0..20 {
            page(&server, &format!("/hub/{i}"), &shared, 200, 2).await;
        }
        for i in 0..10 {
            // Every hub links here, yet exactly one probe and one fetch happen
            page(&server, &format!("/shared/{i}"), &hubs, 200, 2).await;
        }

        let ctx = context(&server.uri(), "/", 100, 16);
        let report = crawl_start_url(Arc::clone(&ctx)).await;

        let links = ctx.session.links();
        let mut unique = links.clone();
        unique.dedup();
        assert_eq!(links.len(), 31);
        assert_eq!(unique, links);
        assert_eq!(report.visited, 31);
    }

    #[tokio::test]
    async fn test_unreachable_start_url_ends_cleanly() {
        let ctx = context("http://127.0.0.1:1", "/", 5, 2);
        let report = crawl_start_url(Arc::clone(&ctx)).await;

        assert!(ctx.session.links().is_empty());
        assert_eq!(report.failed_fetches, 1);
        assert_eq!(report.visited, 0);
    }
}
