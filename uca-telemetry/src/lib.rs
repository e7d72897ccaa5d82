//! Structured logging initialization (SPEC_FULL.md §7.1), grounded on
//! `feagi-observability::init`'s `RUST_LOG`-first `EnvFilter` resolution.

use tracing_subscriber::EnvFilter;

/// Initializes a `tracing_subscriber::fmt` subscriber for the process.
/// `RUST_LOG` always wins when set; otherwise `default_level` (typically
/// the daemon's `--log-level` / config value) is used.
pub fn init(default_level: &str) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
