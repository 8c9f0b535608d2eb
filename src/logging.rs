//! Tracing setup.
//!
//! stdout carries the LSP stream, so logs always go to stderr.

use tracing_subscriber::EnvFilter;

/// Variable checked before `RUST_LOG`
pub const LOG_ENV: &str = "EUROPA_LSP_LOG";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber; later calls are no-ops.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .compact()
        .try_init();
}
