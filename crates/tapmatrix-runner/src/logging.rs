//! Log subscriber setup
//!
//! Logs go to stderr; stdout carries only the report stream and completion
//! signals.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber
///
/// Later calls are ignored, so tests and the binary can both call it.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if installed.is_err() {
        tracing::trace!("Subscriber already installed");
    }
}
