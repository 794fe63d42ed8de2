//! Logging setup for Chorus
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and either a
//! human-readable or a JSON formatting layer. Output goes to stderr so
//! command output on stdout stays machine-readable.

use chorus_config::{LogFormat, TelemetryConfig};
use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor the configured directive parses
const FALLBACK_FILTER: &str = "info";

/// Initialize logging from configuration
///
/// `RUST_LOG`, when set and valid, takes precedence over the configured
/// filter.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init(config: &TelemetryConfig) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = build_filter(&config.filter);
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Text => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false);

            registry.with(fmt_layer).try_init()
        }
        LogFormat::Json => {
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(false);

            registry.with(json_layer).try_init()
        }
    }
    .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}

/// Resolve the effective filter directive
fn build_filter(configured: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER))
}
