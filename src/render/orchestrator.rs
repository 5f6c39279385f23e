// src/render/orchestrator.rs
// =============================================================================
// Renders every discovered link, concurrently, into its own PDF.
//
// Output layout:
//   https://x.com/docs/guide/intro -> <output>/docs/guide/intro.pdf
//   https://x.com/about            -> <output>/about.pdf
//   https://x.com/docs/            -> <output>/docs/index.pdf
//
// If two links map to the same file only the first is rendered.
// A failed render is logged and counted; it never stops the other renders.
// =============================================================================

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::Url;

use super::{RenderConfig, Renderer};
use crate::error::RenderError;

/// Totals for one rendering pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderSummary {
    pub total: usize,
    pub rendered: usize,
    pub failed: usize,
    /// Links whose output path was already taken by another link
    pub skipped: usize,
}

// Maps a link to the PDF path it is rendered to
//
// The URL path minus its last segment becomes a directory under
// `output_root`, and the last segment becomes the file name. A link without
// a last segment is saved as "index.pdf". Dot segments are resolved by the
// URL parser, so the result always stays under `output_root`.
pub fn artifact_path(output_root: &Path, link: &str) -> Result<PathBuf, RenderError> {
    let invalid = |reason: &str| RenderError::InvalidLink {
        url: link.to_string(),
        reason: reason.to_string(),
    };
    let url = Url::parse(link).map_err(|e| invalid(&e.to_string()))?;
    let mut segments: Vec<&str> = url
        .path_segments()
        .ok_or_else(|| invalid("URL has no path"))?
        .filter(|segment| *segment != "." && *segment != "..")
        .collect();

    let file_name = match segments.pop() {
        None | Some("") => "index",
        Some(last) => last,
    };

    let mut artifact = output_root.to_path_buf();
    for segment in segments.into_iter().filter(|s| !s.is_empty()) {
        artifact.push(segment);
    }
    artifact.push(format!("{file_name}.pdf"));
    Ok(artifact)
}

// Pairs every link with its output path
//
// Two links mapping to the same file ("/docs/" and "/docs/index") would
// overwrite each other, so only the first one is kept and the rest are
// counted as skipped.
fn plan_renders(links: Vec<String>, output_root: &Path, summary: &mut RenderSummary) -> Vec<(String, PathBuf)> {
    let mut owners: HashMap<PathBuf, String> = HashMap::new();
    let mut jobs = Vec::with_capacity(links.len());

    for link in links {
        let destination = match artifact_path(output_root, &link) {
            Ok(destination) => destination,
            Err(e) => {
                error!("Cannot generate PDF for {link}: {e}");
                summary.failed += 1;
                continue;
            }
        };
        match owners.entry(destination) {
            Entry::Occupied(owner) => {
                warn!(
                    "Skipping {link}: {} is already produced by {}",
                    owner.key().display(),
                    owner.get()
                );
                summary.skipped += 1;
            }
            Entry::Vacant(slot) => {
                jobs.push((link.clone(), slot.key().clone()));
                slot.insert(link);
            }
        }
    }
    jobs
}

// Renders all links with at most `concurrency` renders in flight
//
// Parameters:
//   links: the discovered links
//   renderer: what actually produces the PDFs
//   config: page options handed to the renderer
//   output_root: the directory the PDFs go under
//   concurrency: maximum number of parallel renders
pub async fn render_all(
    links: Vec<String>,
    renderer: Arc<dyn Renderer>,
    config: &RenderConfig,
    output_root: &Path,
    concurrency: usize,
) -> RenderSummary {
    let mut summary = RenderSummary {
        total: links.len(),
        ..RenderSummary::default()
    };
    let jobs = plan_renders(links, output_root, &mut summary);
    let total = jobs.len();
    let progress = Arc::new(AtomicUsize::new(0));

    info!("Generating PDFs for {total} link(s)");

    let results: Vec<bool> = stream::iter(jobs)
        .map(|(link, destination)| {
            let renderer = Arc::clone(&renderer);
            let progress = Arc::clone(&progress);
            async move {
                let result = render_one(renderer.as_ref(), &link, &destination, config).await;
                let done = progress.fetch_add(1, Ordering::SeqCst) + 1;
                match result {
                    Ok(path) => {
                        debug!("[{done}/{total}] Generated {} for {link}", path.display());
                        true
                    }
                    Err(e) => {
                        error!("[{done}/{total}] Cannot generate PDF for {link}: {e:?}");
                        false
                    }
                }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let rendered = results.iter().filter(|ok| **ok).count();
    summary.rendered = rendered;
    summary.failed += total - rendered;
    summary
}

async fn render_one(
    renderer: &dyn Renderer,
    link: &str,
    destination: &Path,
    config: &RenderConfig,
) -> Result<PathBuf, RenderError> {
    if let Some(dir) = destination.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| RenderError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
    }
    renderer.render(link, destination, config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::{merge_artifacts, write_test_pdf};
    use async_trait::async_trait;
    use lopdf::Document;
    use std::sync::Mutex;

    // Writes a small marker file, or fails for URLs containing "broken"
    struct FakeRenderer {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Renderer for FakeRenderer {
        async fn render(
            &self,
            url: &str,
            destination: &Path,
            _config: &RenderConfig,
        ) -> Result<PathBuf, RenderError> {
            self.seen.lock().unwrap().push(url.to_string());
            if url.contains("broken") {
                return Err(RenderError::Failed {
                    url: url.to_string(),
                    status: "exit status: 1".into(),
                    stderr: "boom".into(),
                });
            }
            tokio::fs::write(destination, url).await.unwrap();
            Ok(destination.to_path_buf())
        }
    }

    // Writes a real two-page PDF, or fails for URLs containing "broken"
    struct PdfRenderer;

    #[async_trait]
    impl Renderer for PdfRenderer {
        async fn render(
            &self,
            url: &str,
            destination: &Path,
            _config: &RenderConfig,
        ) -> Result<PathBuf, RenderError> {
            if url.contains("broken") {
                return Err(RenderError::Failed {
                    url: url.to_string(),
                    status: "exit status: 1".into(),
                    stderr: "boom".into(),
                });
            }
            write_test_pdf(destination, 2);
            Ok(destination.to_path_buf())
        }
    }

    fn fake_renderer() -> Arc<FakeRenderer> {
        Arc::new(FakeRenderer {
            seen: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn test_artifact_path_nested() {
        let root = Path::new("/out");
        assert_eq!(
            artifact_path(root, "https://x.com/docs/guide/intro").unwrap(),
            PathBuf::from("/out/docs/guide/intro.pdf")
        );
    }

    #[test]
    fn test_artifact_path_top_level() {
        let root = Path::new("/out");
        assert_eq!(
            artifact_path(root, "https://x.com/about").unwrap(),
            PathBuf::from("/out/about.pdf")
        );
    }

    #[test]
    fn test_artifact_path_without_last_segment() {
        let root = Path::new("/out");
        assert_eq!(
            artifact_path(root, "https://x.com/docs/").unwrap(),
            PathBuf::from("/out/docs/index.pdf")
        );
        assert_eq!(
            artifact_path(root, "https://x.com").unwrap(),
            PathBuf::from("/out/index.pdf")
        );
    }

    #[test]
    fn test_artifact_path_never_leaves_output_root() {
        let root = Path::new("/out");
        for link in [
            "https://x.com/docs/../../../tmp/evil",
            "https://x.com/docs/%2e%2e/%2e%2e/etc/passwd",
            "https://x.com/./docs/./a",
        ] {
            let path = artifact_path(root, link).unwrap();
            assert!(
                path.components().all(|c| c != std::path::Component::ParentDir),
                "{link} mapped to {}",
                path.display()
            );
            assert!(path.starts_with(root));
        }
        assert_eq!(
            artifact_path(root, "https://x.com/docs/../../../tmp/evil").unwrap(),
            PathBuf::from("/out/tmp/evil.pdf")
        );
    }

    #[test]
    fn test_artifact_path_rejects_unparsable_link() {
        assert!(matches!(
            artifact_path(Path::new("/out"), "not a url"),
            Err(RenderError::InvalidLink { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_render_does_not_stop_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = fake_renderer();
        let links = vec![
            "https://x.com/docs/a".to_string(),
            "https://x.com/docs/broken".to_string(),
            "https://x.com/docs/deep/b".to_string(),
        ];

        let summary = render_all(
            links,
            renderer.clone(),
            &RenderConfig::default(),
            dir.path(),
            2,
        )
        .await;

        assert_eq!(
            summary,
            RenderSummary { total: 3, rendered: 2, failed: 1, skipped: 0 }
        );
        assert_eq!(renderer.seen.lock().unwrap().len(), 3);
        assert!(dir.path().join("docs/a.pdf").exists());
        assert!(dir.path().join("docs/deep/b.pdf").exists());
        assert!(!dir.path().join("docs/broken.pdf").exists());
    }

    #[tokio::test]
    async fn test_failed_render_still_merges_the_others() {
        let dir = tempfile::tempdir().unwrap();
        let links = vec![
            "https://x.com/docs/a".to_string(),
            "https://x.com/docs/broken".to_string(),
            "https://x.com/docs/guide/b".to_string(),
        ];

        let summary = render_all(
            links,
            Arc::new(PdfRenderer),
            &RenderConfig::default(),
            dir.path(),
            3,
        )
        .await;
        assert_eq!(summary.rendered, 2);
        assert_eq!(summary.failed, 1);

        let outcome = merge_artifacts(dir.path()).unwrap();
        assert_eq!(outcome.artifacts, 2);
        let merged = Document::load(&outcome.merged_path).unwrap();
        assert_eq!(merged.get_pages().len(), 4);
    }

    #[tokio::test]
    async fn test_links_sharing_an_output_file_render_once() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = fake_renderer();
        let links = vec![
            "https://x.com/docs/".to_string(),
            "https://x.com/docs/index".to_string(),
            "https://x.com/docs/a".to_string(),
        ];

        let summary = render_all(
            links,
            renderer.clone(),
            &RenderConfig::default(),
            dir.path(),
            4,
        )
        .await;

        assert_eq!(
            summary,
            RenderSummary { total: 3, rendered: 2, failed: 0, skipped: 1 }
        );
        let seen = renderer.seen.lock().unwrap().clone();
        assert!(seen.contains(&"https://x.com/docs/".to_string()));
        assert!(!seen.contains(&"https://x.com/docs/index".to_string()));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("docs/index.pdf")).unwrap(),
            "https://x.com/docs/"
        );
    }

    #[tokio::test]
    async fn test_no_links_renders_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let summary = render_all(Vec::new(), fake_renderer(), &RenderConfig::default(), dir.path(), 4).await;
        assert_eq!(summary, RenderSummary::default());
    }
}
