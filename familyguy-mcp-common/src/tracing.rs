//! Tracing initialization.
//!
//! Filtering is controlled by `RUST_LOG`, e.g.
//! `RUST_LOG=familyguy_mcp_converter=debug,info`. Logs include timestamp,
//! level, target module, message and structured fields.

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
    registry::Registry,
};

fn fmt_layer<S>() -> fmt::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE)
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn subscriber(default_level: &'static str) -> impl tracing::Subscriber + Send + Sync {
    Registry::default()
        .with(env_filter(default_level))
        .with(fmt_layer())
}

/// Initialize the tracing subscriber with environment-based filtering,
/// defaulting to `info` when `RUST_LOG` is not set.
///
/// # Panics
///
/// Panics if a global subscriber is already set.
pub fn init_tracing() {
    subscriber("info").init();
}

/// Try to initialize tracing, returning an error if already initialized.
///
/// Useful in tests where several cases may race to install the subscriber.
pub fn try_init_tracing() -> Result<(), tracing_subscriber::util::TryInitError> {
    subscriber("info").try_init()
}
