//! Tracing subscriber setup for test binaries.
//!
//! Pollers log every satisfied, exhausted and aborted wait at `info`/`warn`
//! and every retry at `debug`. `RUST_LOG=eventual=debug` shows each attempt.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter used when `RUST_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "eventual=info";

/// Output format for [`init_logging_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a text subscriber writing to the test harness.
///
/// Safe to call from every test; only the first call installs anything.
/// Returns whether this call installed the subscriber.
pub fn init_logging() -> bool {
    init_logging_with(LogFormat::Text)
}

/// Install a subscriber with the given output format
pub fn init_logging_with(format: LogFormat) -> bool {
    let registry = tracing_subscriber::registry().with(env_filter());
    let result = match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_test_writer().with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_test_writer())
            .try_init(),
    };
    result.is_ok()
}
