//! Development-time tracing for the agent CLI.
//!
//! Diagnostics go to stderr and are controlled by `RUST_LOG`; they are not
//! part of the agent's product output (the response and action summary on
//! stdout).

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`. Defaults to `warn`, or `coder=debug` when `verbose` is
/// set. Output: stderr, compact format.
pub fn init(verbose: bool) {
    let default = if verbose { "coder=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
