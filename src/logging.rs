//! Logging initialisation via `tracing-subscriber`.
//!
//! Call [`init`] once at startup in binaries. The library itself only emits `tracing`
//! records (through [`LogWriter`](crate::LogWriter)); it never installs a subscriber.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::LoggingError;

/// Installs the global fmt subscriber writing to stderr.
///
/// `level` is any `EnvFilter` directive (`"info"`, `"serviceloader=debug,warn"`).
/// `RUST_LOG` is used as a fallback when `level` does not parse.
pub fn init(level: &str) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_new(level) {
        Ok(filter) => filter,
        Err(level_err) => {
            EnvFilter::try_from_default_env().map_err(|env_err| LoggingError::InvalidLevel {
                level: level.to_string(),
                reason: format!("{level_err}; RUST_LOG parse failed: {env_err}"),
            })?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| LoggingError::Install(e.to_string()))
}

/// Parses a plain level name into a [`LevelFilter`].
pub fn parse_level(level: &str) -> Result<LevelFilter, LoggingError> {
    if level.is_empty() {
        return Err(LoggingError::InvalidLevel {
            level: String::new(),
            reason: "log level must not be empty".into(),
        });
    }
    level
        .parse::<LevelFilter>()
        .map_err(|e| LoggingError::InvalidLevel {
            level: level.to_string(),
            reason: e.to_string(),
        })
}
