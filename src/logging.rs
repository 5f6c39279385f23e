// src/logging.rs
// =============================================================================
// Log setup, done once at startup.
//
// Levels come from --log_level and accept the usual spellings
// (DEBUG, INFO, WARN/WARNING, ERROR/CRITICAL, TRACE), any case.
// RUST_LOG, when set, overrides the flag completely.
//
// Logs go to stderr so that --json output on stdout stays clean.
// =============================================================================

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Some(LevelFilter::TRACE),
        "DEBUG" => Some(LevelFilter::DEBUG),
        "INFO" => Some(LevelFilter::INFO),
        "WARN" | "WARNING" => Some(LevelFilter::WARN),
        "ERROR" | "CRITICAL" => Some(LevelFilter::ERROR),
        "OFF" => Some(LevelFilter::OFF),
        _ => None,
    }
}

// Installs the global subscriber
//
// HTTP internals (hyper, reqwest) stay at warn unless RUST_LOG asks otherwise.
pub fn init(level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},hyper=warn,reqwest=warn")));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
