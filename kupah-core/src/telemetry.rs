//! Tracing bootstrap for host processes.
//!
//! Library crates in this workspace only emit `tracing` events; the binary
//! that embeds them calls [`init_tracing`] once at startup. Filtering comes
//! from `RUST_LOG` when set, otherwise from the simpler `LOG_LEVEL`
//! variable the deployment environment uses, defaulting to `info`.

use tracing_subscriber::EnvFilter;

/// Installs a global `fmt` subscriber. Safe to call more than once: later
/// calls are no-ops.
pub fn init_tracing(service_name: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        EnvFilter::new(level.to_lowercase())
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();

    tracing::debug!(service = service_name, "tracing initialized");
}
