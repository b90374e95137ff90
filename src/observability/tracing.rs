//! Tracing setup.
//!
//! Configures structured logging with:
//! - An `EnvFilter` built from [`TracingConfig::filter`]
//! - Human-readable or JSON output
//!
//! Hosts that already install a subscriber do not need this.

use clap::{Args, ValueEnum};
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directives: sink outcomes at debug, everything else at info.
pub const DEFAULT_LOG_FILTER: &str = "info,sluice_instrumented=debug";

/// Log output format.
#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Logging settings, flattened into a host's parser next to [`SinkConfig`](crate::SinkConfig).
#[derive(Args, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TracingConfig {
    /// Log filter (trace, debug, info, warn, error, or full directive syntax)
    #[arg(long = "log-level", env = "RUST_LOG", default_value = DEFAULT_LOG_FILTER)]
    pub filter: String,

    /// Log output format
    #[arg(long = "log-format", env = "SLUICE_LOG_FORMAT", value_enum, default_value = "text")]
    pub format: LogFormat,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.into(),
            format: LogFormat::Text,
        }
    }
}

/// Initialize tracing from `config`.
///
/// Fails on an invalid filter or if a global subscriber is already installed.
pub fn init_tracing(
    config: &TracingConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_new(&config.filter)?;
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init()?,
    }

    tracing::info!(filter = %config.filter, format = ?config.format, "Tracing initialized");
    Ok(())
}

/// Initialize tracing for tests (only logs errors).
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("error")
        .with_test_writer()
        .try_init();
}
