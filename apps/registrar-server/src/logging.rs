use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogFormat, LoggingConfig};

/// `RUST_LOG` when set, otherwise the configured level.
///
/// # Errors
///
/// Fails when the chosen directive does not parse.
pub fn build_filter(cfg: &LoggingConfig) -> anyhow::Result<EnvFilter> {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    filter_from(from_env.as_deref(), &cfg.level)
}

fn filter_from(from_env: Option<&str>, level: &str) -> anyhow::Result<EnvFilter> {
    match from_env {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid {} directive", EnvFilter::DEFAULT_ENV)),
        None => EnvFilter::try_new(level)
            .with_context(|| format!("invalid logging.level '{level}'")),
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean
/// for `--print-config` and `check`.
///
/// # Errors
///
/// Fails on a bad filter or when a global subscriber is already set.
pub fn init_logging(cfg: &LoggingConfig) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry().with(build_filter(cfg)?);
    match cfg.format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    }
    .context("installing tracing subscriber")
}
