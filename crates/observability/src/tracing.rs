//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Initialize JSON logging, filtered by `RUST_LOG` (default `info`).
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    init_with(filter);
}

/// Initialize with an explicit filter directive, ignoring the environment.
/// Mostly useful in tests and one-off tools.
pub fn init_with_filter(directive: &str) {
    init_with(EnvFilter::new(directive));
}

fn init_with(filter: EnvFilter) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
