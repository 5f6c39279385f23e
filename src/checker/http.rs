// src/checker/http.rs
// =============================================================================
// This module owns the HTTP client shared by the whole crawl.
//
// Key functionality:
// - One reqwest Client for every request (connection pooling)
// - Fixed 5 second timeout per request
// - Up to 5 attempts when the connection itself fails
// - Liveness probe: "does this URL answer 200 right now?"
// - Page fetch: "give me the HTML of this URL"
//
// Rust concepts:
// - async/await: For concurrent network I/O
// - Clone on Client: cheap, it's an Arc internally
// =============================================================================

use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::error::FetchError;

/// Socket timeout applied to every request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Attempts per request when the connection cannot be established.
pub const MAX_ATTEMPTS: u32 = 5;

// Shared HTTP transport
//
// Every component that touches the network (validator, crawler, sitemap
// loader) holds a clone of the same Fetcher, so they all share one pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("site-sweeper/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    // Sends a GET request, retrying connection failures
    //
    // Only errors where no connection was made are retried. A server that
    // answered (with any status) or timed out mid-response is not asked again.
    pub async fn get(&self, url: &str) -> Result<Response, FetchError> {
        let mut attempt = 1;
        loop {
            match self.client.get(url).send().await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_connect() && attempt < MAX_ATTEMPTS => {
                    debug!(url, attempt, error = %e, "connection failed, retrying");
                    attempt += 1;
                }
                Err(source) => {
                    return Err(FetchError::Transport {
                        url: url.to_string(),
                        attempts: attempt,
                        source,
                    })
                }
            }
        }
    }

    // Fetches a page body as text
    //
    // The status code is not checked here: a 404 page still has anchors, and
    // the crawl only treats transport problems as fatal for a branch.
    pub async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self.get(url).await?;
        let status = response.status();
        if status != StatusCode::OK {
            debug!(url, status = status.as_u16(), "page fetched with non-200 status");
        }
        response.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })
    }

    // Liveness probe used by the link validator
    //
    // Returns the status code the server answered with.
    pub async fn probe(&self, url: &str) -> Result<StatusCode, FetchError> {
        let response = self.get(url).await?;
        Ok(response.status())
    }
}
