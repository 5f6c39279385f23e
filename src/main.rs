// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap and set up logging
// 2. Discover pages (follow links, or read sitemap.xml)
// 3. Render every discovered page to a PDF
// 4. Optionally merge all PDFs into one
// 5. Print a summary and exit (0 = done, 1 = bad start URL, 2 = error)
//
// Failures of single links, single renders or the merge are logged and
// counted, they never change the exit code.
// =============================================================================

mod checker; // src/checker/ - HTTP client, anchor extraction, link validator
mod cli; // src/cli.rs - command-line parsing
mod crawl; // src/crawl/ - page discovery
mod error; // src/error.rs - error types
mod logging; // src/logging.rs - tracing setup
mod merge; // src/merge.rs - merged.pdf
mod render; // src/render/ - PDF rendering
mod session; // src/session.rs - shared crawl state

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use checker::Fetcher;
use cli::{Cli, DiscoveryMode, RunConfig};
use crawl::{crawl_sitemap, crawl_start_url, CrawlContext, CrawlReport};
use error::StartUrlError;
use render::{render_all, RenderSummary, Renderer, WkhtmltopdfRenderer};
use session::CrawlSession;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = run finished (even if some pages failed)
//   Ok(1) = missing or invalid start URL
//   Err   = unexpected error
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init(cli.log_level);

    let config = match cli.into_run_config() {
        Ok(config) => config,
        Err(StartUrlError::Missing) => {
            Cli::command().print_help()?;
            return Ok(1);
        }
        Err(e) => {
            error!("{e}");
            return Ok(1);
        }
    };

    let summary = sweep(&config).await?;
    print_summary(&summary, config.json)?;
    Ok(0)
}

// Everything we report at the end of a run
#[derive(Debug, Serialize)]
struct RunSummary {
    start_url: String,
    base_path: String,
    output_path: PathBuf,
    discovered: usize,
    pages_visited: usize,
    failed_fetches: usize,
    render: RenderSummary,
    merged_path: Option<PathBuf>,
    elapsed_secs: f64,
}

// Runs discovery, rendering and the optional merge
async fn sweep(config: &RunConfig) -> Result<RunSummary> {
    let started = Instant::now();

    if !config.output_path.exists() {
        debug!("Creating output directory: {}", config.output_path.display());
    }
    tokio::fs::create_dir_all(&config.output_path)
        .await
        .with_context(|| format!("cannot create output directory {}", config.output_path.display()))?;

    let session = Arc::new(CrawlSession::new(
        config.start_url.clone(),
        config.base_path.clone(),
        config.depth,
        config.output_path.clone(),
    ));
    let fetcher = Fetcher::new().context("cannot build the HTTP client")?;
    let ctx = Arc::new(CrawlContext::new(Arc::clone(&session), fetcher, config.concurrency));

    info!(
        start_url = session.start_url(),
        base_path = session.base_path(),
        depth = session.depth(),
        "Starting discovery"
    );
    let report = match config.mode {
        DiscoveryMode::Sitemap => {
            debug!("Using sitemap.xml");
            crawl_sitemap(ctx).await.unwrap_or_else(|e| {
                error!("Cannot load the sitemap: {e}");
                CrawlReport::default()
            })
        }
        DiscoveryMode::Crawl => {
            debug!("Using crawl");
            crawl_start_url(ctx).await
        }
    };

    let links = session.links();
    info!("Found {} links", links.len());

    let renderer: Arc<dyn Renderer> = Arc::new(WkhtmltopdfRenderer::new(config.wkhtmltopdf.clone()));
    let rendered = render_all(
        links,
        renderer,
        &config.render,
        session.output_path(),
        config.concurrency,
    )
    .await;

    let merged_path = if config.merge_pdfs {
        merge_outputs(session.output_path().to_path_buf()).await
    } else {
        None
    };

    Ok(RunSummary {
        start_url: config.start_url.clone(),
        base_path: config.base_path.clone(),
        output_path: config.output_path.clone(),
        discovered: session.discovered_count(),
        pages_visited: report.visited,
        failed_fetches: report.failed_fetches,
        render: rendered,
        merged_path,
        elapsed_secs: started.elapsed().as_secs_f64(),
    })
}

// lopdf is synchronous, so the merge runs on the blocking pool
async fn merge_outputs(output_root: PathBuf) -> Option<PathBuf> {
    info!("Merging PDFs");
    match tokio::task::spawn_blocking(move || merge::merge_artifacts(&output_root)).await {
        Ok(Ok(outcome)) => {
            info!(
                "Saved merged PDF of {} file(s) to {}",
                outcome.artifacts,
                outcome.merged_path.display()
            );
            Some(outcome.merged_path)
        }
        Ok(Err(e)) => {
            error!("Cannot merge PDFs: {e:?}");
            None
        }
        Err(e) => {
            error!("Merge task failed: {e}");
            None
        }
    }
}

// Prints the summary either as text or JSON
fn print_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("📊 Summary:");
    println!("   🔗 Links found: {}", summary.discovered);
    println!(
        "   📄 PDFs generated: {} of {} (saved to {})",
        summary.render.rendered,
        summary.render.total,
        summary.output_path.display()
    );
    if summary.render.failed > 0 {
        println!("   ❌ Failed renders: {} (see log)", summary.render.failed);
    }
    if summary.render.skipped > 0 {
        println!("   ⚠️  Skipped (same output file): {}", summary.render.skipped);
    }
    if let Some(path) = &summary.merged_path {
        println!("   📚 Merged PDF: {}", path.display());
    }
    println!("   ⏱️  Total time: {:.2} seconds", summary.elapsed_secs);
    Ok(())
}
