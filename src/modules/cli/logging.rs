//! Tracing subscriber setup

use crm_query_config::EnvSource;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::LogFormat;

/// Default log level: DEBUG when `--verbose` or `CRM_DEBUG` is set, INFO otherwise
///
/// `RUST_LOG` still overrides this at filter construction.
pub fn default_level(verbose: bool, source: &EnvSource) -> Level {
    let debug = source
        .get("DEBUG")
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false);

    if verbose || debug {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// Install the global subscriber
pub fn init(level: Level, format: LogFormat) {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let (text, json) = match format {
        LogFormat::Text => (Some(fmt::layer()), None),
        LogFormat::Json => (None, Some(fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(text)
        .with(json)
        .with(filter)
        .init();
}
