//! Diagnostic logging using **tracing**.
//!
//! Findings go to stdout; everything emitted here goes to stderr so the two
//! streams can be piped separately.

use tracing_subscriber::EnvFilter;

/// Builds the filter: `RUST_LOG` wins when set, otherwise the configured level.
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initializes the tracing subscriber.
///
/// Call once, from the binary. The library only emits events inside the
/// spans opened by [`crate::builder::Ghostbuster::run`].
///
/// # Environment Variables
/// - `RUST_LOG`: overrides `level` (e.g. `RUST_LOG=ghostbuster_core=debug`)
pub fn init_logging(level: &str, json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(level))
        .with_target(false)
        .with_writer(std::io::stderr);

    // try_init: a second call (tests, embedding) keeps the first subscriber
    let _ = if json {
        builder
            .json()
            .with_ansi(false)
            .with_current_span(true)
            .try_init()
    } else {
        builder.try_init()
    };
}
