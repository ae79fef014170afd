//! Log subscriber setup
//!
//! Logs always go to stderr so reports and dry-run documents on stdout stay
//! machine-readable.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Environment variable with the highest-priority filter directive
pub const LOG_ENV: &str = "HARBOR_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Pick the filter directive
///
/// `-v` flags win, then `HARBOR_LOG`, then `RUST_LOG`, then the config file,
/// then `warn`.
#[must_use]
pub fn filter_directive(
    verbosity: u8,
    config_filter: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> String {
    match verbosity {
        0 => {}
        1 => return "info".to_string(),
        2 => return "debug".to_string(),
        _ => return "trace".to_string(),
    }

    env(LOG_ENV)
        .or_else(|| env(EnvFilter::DEFAULT_ENV))
        .filter(|directive| !directive.trim().is_empty())
        .or_else(|| config_filter.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Install the global subscriber
///
/// # Errors
/// Returns error if the filter directive is invalid or a subscriber is
/// already installed
pub fn init(verbosity: u8, json: bool, config: &LoggingConfig) -> anyhow::Result<()> {
    let directive = filter_directive(verbosity, config.filter.as_deref(), |key| {
        std::env::var(key).ok()
    });
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("invalid log filter '{directive}'"))?;

    if json || config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}
