use std::str::FromStr;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::ConfigurationError;

/// Parses `logging.level` ("trace" .. "error", case-insensitive).
pub fn parse_level(level: &str) -> Result<LevelFilter, ConfigurationError> {
    let level = level.trim().to_lowercase();
    if level == "off" {
        return Err(ConfigurationError::InvalidLogging(
            "logging.level 'off' is not supported; use 'error' to silence most output".into(),
        ));
    }
    LevelFilter::from_str(&level).map_err(|_| {
        ConfigurationError::InvalidLogging(format!(
            "Invalid logging.level '{}'. Valid values: trace, debug, info, warn, error",
            level
        ))
    })
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` directives are honoured on top of the configured level. Calling this twice
/// (e.g. from several tests) is harmless: the second install is skipped.
pub fn init_logging(logging_config: &LoggingConfig) -> Result<(), ConfigurationError> {
    let level_filter = parse_level(&logging_config.level)?;
    let filter_layer = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .from_env_lossy();

    let installed = match logging_config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter_layer)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_target(true),
            )
            .try_init(),
        LogFormat::Console => tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt::layer().pretty())
            .try_init(),
    };

    if installed.is_err() {
        tracing::debug!("A global tracing subscriber is already installed; keeping it");
    }
    Ok(())
}
