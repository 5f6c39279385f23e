// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// clap's "derive" API lets us describe the CLI as a struct: every field is
// an argument, and the #[arg(...)] attributes say how it is spelled.
//
// After parsing, Cli::into_run_config() checks the start URL and turns the
// raw strings into the settings the rest of the program works with.
// =============================================================================

use clap::Parser;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::error::StartUrlError;
use crate::logging;
use crate::render::RenderConfig;

#[derive(Parser, Debug)]
#[command(
    name = "site-sweeper",
    version,
    about = "Crawl a website and generate a PDF file",
    long_about = "site-sweeper crawls every page under a start URL and base path, renders each \
                  page to a PDF with wkhtmltopdf, and can merge all of them into one document."
)]
pub struct Cli {
    /// The starting URL for the crawl (e.g., https://example.com/docs)
    ///
    /// Any path after the host becomes the base path.
    pub start_url: Option<String>,

    /// The base path every crawled page must contain
    #[arg(long = "base_path", default_value = "/")]
    pub base_path: String,

    /// The output directory for the PDF files (default: ./output)
    #[arg(long = "output-path")]
    pub output_path: Option<PathBuf>,

    /// How many link levels to follow from the start URL (0 disables the crawl)
    #[arg(long, default_value_t = 100)]
    pub depth: usize,

    /// Use the sitemap.xml file to find pages instead of following links
    #[arg(long = "use_sitemap")]
    pub use_sitemap: bool,

    /// Merge all PDF files into one merged.pdf
    #[arg(long = "merge_pdfs")]
    pub merge_pdfs: bool,

    /// The delay in milliseconds for javascript to run before rendering
    #[arg(long = "javascript_delay", default_value_t = 3000)]
    pub javascript_delay: u64,

    /// The page size for the PDF
    #[arg(long = "page_size", default_value = "A4")]
    pub page_size: String,

    /// The encoding for the PDF
    #[arg(long, default_value = "UTF-8")]
    pub encoding: String,

    /// The log level (TRACE, DEBUG, INFO, WARNING, ERROR)
    #[arg(long = "log_level", default_value = "INFO", value_parser = parse_log_level)]
    pub log_level: LevelFilter,

    /// Maximum number of pages crawled or rendered at the same time
    #[arg(long, default_value_t = 16)]
    pub concurrency: usize,

    /// Path to the wkhtmltopdf binary
    #[arg(long, default_value = "wkhtmltopdf")]
    pub wkhtmltopdf: String,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

// How pages are discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryMode {
    Crawl,
    Sitemap,
}

// Everything a run needs, validated
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub start_url: String,
    pub base_path: String,
    pub output_path: PathBuf,
    pub depth: usize,
    pub mode: DiscoveryMode,
    pub merge_pdfs: bool,
    pub concurrency: usize,
    pub wkhtmltopdf: String,
    pub render: RenderConfig,
    pub json: bool,
}

impl Cli {
    pub fn into_run_config(self) -> Result<RunConfig, StartUrlError> {
        let raw = self.start_url.ok_or(StartUrlError::Missing)?;
        let (start_url, path) = normalize_start_url(&raw)?;
        let base_path = path.unwrap_or(self.base_path);

        let output_path = match self.output_path {
            Some(path) => path,
            None => std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("output"),
        };

        Ok(RunConfig {
            start_url,
            base_path,
            output_path,
            depth: self.depth,
            mode: if self.use_sitemap {
                DiscoveryMode::Sitemap
            } else {
                DiscoveryMode::Crawl
            },
            merge_pdfs: self.merge_pdfs,
            concurrency: self.concurrency.max(1),
            wkhtmltopdf: self.wkhtmltopdf,
            render: RenderConfig {
                page_size: self.page_size,
                encoding: self.encoding,
                javascript_delay_ms: self.javascript_delay,
            },
            json: self.json,
        })
    }
}

fn parse_log_level(value: &str) -> Result<LevelFilter, String> {
    logging::parse_level(value).ok_or_else(|| format!("unknown log level '{value}'"))
}

// Splits a start URL into origin and optional base path
//
// Examples:
//   "https://x.com/"          -> ("https://x.com", None)
//   "https://x.com/docs/v2"   -> ("https://x.com", Some("/docs/v2"))
//   "http://localhost:8080"   -> ("http://localhost:8080", None)
//   "ftp://x.com"             -> Err(UnsupportedScheme)
pub fn normalize_start_url(raw: &str) -> Result<(String, Option<String>), StartUrlError> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

    let url = Url::parse(trimmed).map_err(|e| StartUrlError::Invalid {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(StartUrlError::UnsupportedScheme(raw.to_string()));
    }
    let host = url.host_str().ok_or_else(|| StartUrlError::Invalid {
        url: raw.to_string(),
        reason: "no host".to_string(),
    })?;

    let origin = match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    };

    // Keep the path exactly as typed (Url would re-encode it)
    let after_scheme = trimmed.split_once("://").map_or("", |(_, rest)| rest);
    let path = after_scheme
        .split_once('/')
        .map(|(_, rest)| format!("/{rest}"))
        .filter(|path| path != "/");

    Ok((origin, path))
}
