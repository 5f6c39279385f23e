// src/session.rs
// =============================================================================
// The crawl session: configuration plus the result state of one run.
//
// Two concurrent sets live here:
// - claimed: every URL some crawl task has taken responsibility for
// - discovered: every URL admitted for rendering
//
// Both are DashSets. DashSet::insert is a single atomic insert-if-absent,
// so "is it there? then add it" can never race between two tasks.
// =============================================================================

use dashmap::DashSet;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct CrawlSession {
    start_url: String,
    base_path: String,
    depth: usize,
    output_path: PathBuf,
    claimed: DashSet<String>,
    discovered: DashSet<String>,
}

impl CrawlSession {
    pub fn new(
        start_url: impl Into<String>,
        base_path: impl Into<String>,
        depth: usize,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            start_url: start_url.into(),
            base_path: base_path.into(),
            depth,
            output_path: output_path.into(),
            claimed: DashSet::new(),
            discovered: DashSet::new(),
        }
    }

    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Takes responsibility for visiting `url`. Only the first caller gets `true`.
    pub fn claim(&self, url: &str) -> bool {
        self.claimed.insert(url.to_string())
    }

    /// Adds `url` to the discovered links. Only the first caller gets `true`.
    pub fn admit(&self, url: &str) -> bool {
        self.discovered.insert(url.to_string())
    }

    pub fn discovered_count(&self) -> usize {
        self.discovered.len()
    }

    // Snapshot of the discovered links
    //
    // Admission order is a race between tasks, so the snapshot is sorted to
    // give later stages a stable order to work from.
    pub fn links(&self) -> Vec<String> {
        let mut links: Vec<String> = self.discovered.iter().map(|url| url.key().clone()).collect();
        links.sort();
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_admit_only_once() {
        let session = CrawlSession::new("https://x.com", "/", 10, "out");
        assert!(session.admit("https://x.com/a"));
        assert!(!session.admit("https://x.com/a"));
        assert_eq!(session.discovered_count(), 1);
    }

    #[test]
    fn test_claim_is_separate_from_admission() {
        let session = CrawlSession::new("https://x.com", "/", 10, "out");
        assert!(session.claim("https://x.com/a"));
        assert!(!session.claim("https://x.com/a"));
        assert_eq!(session.discovered_count(), 0);
    }

    #[test]
    fn test_concurrent_admission_has_a_single_winner() {
        let session = Arc::new(CrawlSession::new("https://x.com", "/", 10, "out"));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let session = Arc::clone(&session);
                std::thread::spawn(move || {
                    (0..100)
                        .filter(|i| session.admit(&format!("https://x.com/{i}")))
                        .count()
                })
            })
            .collect();

        let winners: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(winners, 100);
        assert_eq!(session.links().len(), 100);
    }

    #[test]
    fn test_links_are_sorted() {
        let session = CrawlSession::new("https://x.com", "/", 10, "out");
        session.admit("https://x.com/b");
        session.admit("https://x.com/a");
        assert_eq!(session.links(), vec!["https://x.com/a", "https://x.com/b"]);
    }
}
