// src/render/mod.rs
// =============================================================================
// This module turns discovered links into PDF files.
//
// Submodules:
// - orchestrator: one render task per link, output paths, progress counter
// - wkhtmltopdf: the default Renderer, an external wkhtmltopdf process
//
// The Renderer trait is the seam between the two: the orchestrator only
// knows "give this URL to something that writes a PDF at this path".
// =============================================================================

mod orchestrator;
mod wkhtmltopdf;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::RenderError;

pub use orchestrator::{render_all, RenderSummary};
pub use wkhtmltopdf::WkhtmltopdfRenderer;

/// Viewport handed to the renderer, in CSS pixels.
pub const VIEWPORT: (u32, u32) = (1920, 1080);

// Something that can render one URL into a file
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Renders `url` into `destination` and returns the written path.
    async fn render(
        &self,
        url: &str,
        destination: &Path,
        config: &RenderConfig,
    ) -> Result<PathBuf, RenderError>;
}

// Page options passed to the renderer unchanged
//
// Margins are always zero and load errors of sub-resources (images, fonts,
// media) never fail a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    pub page_size: String,
    pub encoding: String,
    pub javascript_delay_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            page_size: "A4".to_string(),
            encoding: "UTF-8".to_string(),
            javascript_delay_ms: 3000,
        }
    }
}

impl RenderConfig {
    /// Command-line options for wkhtmltopdf, without the URL and output path.
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "--page-size".into(),
            self.page_size.clone(),
            "--encoding".into(),
            self.encoding.clone(),
            "--javascript-delay".into(),
            self.javascript_delay_ms.to_string(),
            "--no-stop-slow-scripts".into(),
            "--disable-smart-shrinking".into(),
            "--viewport-size".into(),
            format!("{}x{}", VIEWPORT.0, VIEWPORT.1),
            "--load-error-handling".into(),
            "ignore".into(),
            "--load-media-error-handling".into(),
            "ignore".into(),
        ];
        for side in ["top", "right", "bottom", "left"] {
            args.push(format!("--margin-{side}"));
            args.push("0".into());
        }
        args.push("--quiet".into());
        args
    }
}
