//! # Supervisor configuration.
//!
//! Provides [`SupervisorConfig`] and the [`ConfigLoader`] that produces it (or any
//! other `serde` type) from a TOML file plus environment overrides.
//!
//! ```toml
//! # config.prod.toml
//! shutdown_timeout = "30s"   # alias: shutdownTimeout
//! bus_capacity = 2048        # alias: busCapacity
//! ```

mod duration;
mod load;

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

pub use duration::{format_duration, parse_duration};
pub use load::{ConfigLoader, DEFAULT_ENV_PREFIX, ENV_SELECTOR, PostLoad, file_for_env};

/// Default deadline for the shutdown phase.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Global configuration for the supervisor runtime.
///
/// ## Field semantics
/// - `shutdown_timeout`: bound for the whole shutdown phase, from trigger to verdict.
///   `0s` means every `stop` receives an already cancelled token.
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Maximum time the shutdown sequencer may take.
    ///
    /// When the trigger fires:
    /// - `run` tokens are cancelled
    /// - every service gets `stop` with a token cancelled at the deadline
    /// - a `stop` still pending at the deadline is abandoned
    #[serde(
        alias = "shutdownTimeout",
        deserialize_with = "duration::deserialize_duration"
    )]
    pub shutdown_timeout: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// The event listener skips events it lags behind by more than this.
    #[serde(alias = "busCapacity")]
    pub bus_capacity: usize,
}

impl SupervisorConfig {
    /// Loads the configuration with a default [`ConfigLoader`] (`APP_ENV` file + `APP_*` env).
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for SupervisorConfig {
    /// Default configuration:
    ///
    /// - `shutdown_timeout = 10s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            bus_capacity: 1024,
        }
    }
}

impl PostLoad for SupervisorConfig {
    fn post_load(&mut self) -> Result<(), ConfigError> {
        if self.bus_capacity == 0 {
            return Err(ConfigError::PostLoad(
                "bus_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader(contents: &'static str) -> ConfigLoader {
        ConfigLoader::new().with_embedded("config.dev.toml", contents)
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg: SupervisorConfig = loader("")
            .with_env_vars(Vec::<(String, String)>::new())
            .load()
            .expect("load");
        assert_eq!(cfg, SupervisorConfig::default());
        assert_eq!(cfg.shutdown_timeout, Duration::from_secs(10));
    }

    #[test]
    fn accepts_both_key_spellings() {
        let cfg: SupervisorConfig = loader("shutdownTimeout = \"250ms\"\nbusCapacity = 8")
            .with_env_vars(Vec::<(String, String)>::new())
            .load()
            .expect("load");
        assert_eq!(cfg.shutdown_timeout, Duration::from_millis(250));
        assert_eq!(cfg.bus_capacity, 8);

        let cfg: SupervisorConfig = loader("shutdown_timeout = 3")
            .with_env_vars(Vec::<(String, String)>::new())
            .load()
            .expect("load");
        assert_eq!(cfg.shutdown_timeout, Duration::from_secs(3));
    }

    #[test]
    fn env_overrides_shutdown_timeout() {
        let cfg: SupervisorConfig = loader("shutdown_timeout = \"30s\"")
            .with_env_vars([("APP_SHUTDOWN_TIMEOUT", "5s")])
            .load()
            .expect("load");
        assert_eq!(cfg.shutdown_timeout, Duration::from_secs(5));
    }

    #[test]
    fn env_overrides_camel_case_file_key() {
        let cfg: SupervisorConfig = loader("shutdownTimeout = \"30s\"\nbusCapacity = 8")
            .with_env_vars([("APP_SHUTDOWN_TIMEOUT", "5s"), ("APP_BUS_CAPACITY", "16")])
            .load()
            .expect("load");
        assert_eq!(cfg.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(cfg.bus_capacity, 16);
    }

    #[test]
    fn zero_bus_capacity_is_rejected() {
        let err = loader("bus_capacity = 0")
            .with_env_vars(Vec::<(String, String)>::new())
            .load::<SupervisorConfig>()
            .expect_err("must fail");
        assert_eq!(err.as_label(), "config_post_load");
    }

    #[test]
    fn bad_duration_is_a_deserialize_error() {
        let err = loader("shutdown_timeout = \"soon\"")
            .with_env_vars(Vec::<(String, String)>::new())
            .load::<SupervisorConfig>()
            .expect_err("must fail");
        assert_eq!(err.as_label(), "config_deserialize");
    }
}
