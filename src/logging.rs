use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::LoggingConfig;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level so a single run can
/// be turned up without touching the config file.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(&config.level)))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init(),
        _ => registry.with(fmt::layer().pretty()).try_init(),
    };

    result.map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))
}

fn filter_directive(level: &str) -> String {
    format!("warn,air_quality_meter={level},tower_http={level}")
}
