//! Tracing subscriber setup
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to the
//! agstore crates and sqlx is kept at `warn`.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Install the global subscriber. Calling this twice is harmless.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

fn default_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::new(format!(
        "agstore_core={level},agstore_graph={level},sqlx=warn",
        level = config.level
    ))
}
