// src/checker/scope.rs
// =============================================================================
// The link validator: decides whether a candidate URL belongs to the crawl.
//
// Checks run in this order and stop at the first failure:
// 1. Root-relative candidates ("/x") are resolved against the start URL
// 2. The candidate must start with the start URL
// 3. The candidate must not contain a fragment ('#')
// 4. The candidate must contain the base path
// 5. A live GET must answer exactly 200
//
// Steps 1-4 are pure string checks (check_scope). Step 5 is a real network
// round trip, separate from the later content fetch of the same page.
// =============================================================================

use reqwest::StatusCode;
use tracing::debug;

use super::html::resolve_root_relative;
use super::http::Fetcher;
use crate::error::Rejection;

#[derive(Debug, Clone)]
pub struct LinkValidator {
    start_url: String,
    base_path: String,
    fetcher: Fetcher,
}

impl LinkValidator {
    pub fn new(start_url: impl Into<String>, base_path: impl Into<String>, fetcher: Fetcher) -> Self {
        Self {
            start_url: start_url.into(),
            base_path: base_path.into(),
            fetcher,
        }
    }

    // Steps 1-4: scope checks without touching the network
    //
    // Returns the resolved candidate on success.
    pub fn check_scope(&self, candidate: &str) -> Result<String, Rejection> {
        let url = if candidate.starts_with('/') {
            resolve_root_relative(candidate, &self.start_url)
        } else {
            candidate.to_string()
        };

        if !url.starts_with(&self.start_url) {
            return Err(Rejection::OutsideStart {
                url,
                start_url: self.start_url.clone(),
            });
        }
        if url.contains('#') {
            return Err(Rejection::Fragment { url });
        }
        if !url.contains(&self.base_path) {
            return Err(Rejection::OutsideBasePath {
                url,
                base_path: self.base_path.clone(),
            });
        }
        Ok(url)
    }

    // All five steps
    //
    // Any transport error or a status other than 200 is an Unreachable
    // rejection. Redirects are followed by the client, so a 301 to a live
    // page counts as 200.
    pub async fn check(&self, candidate: &str) -> Result<String, Rejection> {
        let url = self.check_scope(candidate)?;
        match self.fetcher.probe(&url).await {
            Ok(StatusCode::OK) => Ok(url),
            Ok(status) => Err(Rejection::Unreachable {
                url,
                reason: format!("HTTP {}", status.as_u16()),
            }),
            Err(e) => Err(Rejection::Unreachable {
                url,
                reason: e.to_string(),
            }),
        }
    }

    /// Boolean form of [`check`](Self::check); rejections are logged at debug.
    pub async fn is_valid(&self, candidate: &str) -> bool {
        match self.check(candidate).await {
            Ok(_) => true,
            Err(rejection) => {
                debug!(%rejection, "link rejected");
                false
            }
        }
    }
}
