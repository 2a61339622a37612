//! Tracing/logging initialisation.
//!
//! The lifecycle interceptor and worker loop emit their observability
//! events through `tracing`; this module installs a process-wide fmt
//! subscriber filtered via `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Initialises tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A subscriber may already be installed by the embedding application.
    let _install_result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
