// src/error.rs
// =============================================================================
// Error types for every stage of a sweep.
//
// Each stage owns one enum so the caller can decide how loud to be:
// - StartUrlError stops the program before anything runs
// - Rejection and FetchError only end one crawl branch
// - RenderError only loses one PDF
// - MergeError only loses merged.pdf
//
// main.rs turns whatever is left into anyhow::Error at the very edge.
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

/// The start URL given on the command line cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartUrlError {
    #[error("no start URL given")]
    Missing,

    #[error("start URL must start with http or https: {0}")]
    UnsupportedScheme(String),

    #[error("invalid start URL '{url}': {reason}")]
    Invalid { url: String, reason: String },
}

/// Why a candidate link was not admitted into the crawl.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("{url} does not match the start URL {start_url}")]
    OutsideStart { url: String, start_url: String },

    #[error("{url} contains a fragment")]
    Fragment { url: String },

    #[error("{url} does not match the base path {base_path}")]
    OutsideBasePath { url: String, base_path: String },

    #[error("{url} is not accessible: {reason}")]
    Unreachable { url: String, reason: String },
}

/// A request that failed at the transport level, after retries.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("cannot access {url} after {attempts} attempt(s): {source}")]
    Transport {
        url: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read the body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// The external renderer failed for one link.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot launch renderer '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("renderer exited with {status} for {url}: {stderr}")]
    Failed {
        url: String,
        status: String,
        stderr: String,
    },

    #[error("renderer reported success but {path} was not written")]
    MissingOutput { path: PathBuf },

    #[error("cannot derive an output path from {url}: {reason}")]
    InvalidLink { url: String, reason: String },
}

/// Merging the rendered PDFs failed; nothing usable was written.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("no PDF files found under {0}")]
    NoArtifacts(PathBuf),

    #[error("cannot scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: jwalk::Error,
    },

    #[error("cannot load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("merged document has no page tree")]
    MissingPageTree,

    #[error("merged document has no catalog")]
    MissingCatalog,

    #[error("cannot write merged PDF: {0}")]
    Write(#[from] std::io::Error),
}
