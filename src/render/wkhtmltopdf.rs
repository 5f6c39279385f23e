// src/render/wkhtmltopdf.rs
// =============================================================================
// Renderer backed by the wkhtmltopdf command-line tool.
//
// Each render is one child process:
//   wkhtmltopdf <options...> <url> <destination>
//
// wkhtmltopdf sometimes exits non-zero after writing a usable PDF (a failed
// sub-resource, for example). We ignore load errors through the options, so a
// non-zero exit is treated as a real failure.
// =============================================================================

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

use super::{RenderConfig, Renderer};
use crate::error::RenderError;

#[derive(Debug, Clone)]
pub struct WkhtmltopdfRenderer {
    binary: String,
}

impl WkhtmltopdfRenderer {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for WkhtmltopdfRenderer {
    fn default() -> Self {
        Self::new("wkhtmltopdf")
    }
}

#[async_trait]
impl Renderer for WkhtmltopdfRenderer {
    async fn render(
        &self,
        url: &str,
        destination: &Path,
        config: &RenderConfig,
    ) -> Result<PathBuf, RenderError> {
        debug!(url, destination = %destination.display(), "running {}", self.binary);

        let output = Command::new(&self.binary)
            .args(config.to_args())
            .arg(url)
            .arg(destination)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| RenderError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RenderError::Failed {
                url: url.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if !destination.exists() {
            return Err(RenderError::MissingOutput {
                path: destination.to_path_buf(),
            });
        }

        Ok(destination.to_path_buf())
    }
}
