//! Internal diagnostics for timber itself.
//!
//! The crate reports its own housekeeping (files opened, rotated, closed,
//! failed writes) through `tracing`. Hosts that do not already install a
//! subscriber can use these helpers to see it.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize diagnostics at INFO, overridable with RUST_LOG
pub fn init() {
    init_with_level("info")
}

/// Initialize diagnostics with a specific default level
///
/// # Arguments
/// * `default_level` - Default filter directive (debug, info, warn, error)
///
/// This can still be overridden by RUST_LOG environment variable. Does
/// nothing if a global subscriber is already installed.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}

/// Initialize diagnostics for testing (captures output per test)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
