//! Error types used by the serviceloader runtime and services.
//!
//! This module defines:
//!
//! - [`RuntimeError`]: errors raised by the supervisor itself before or while it runs.
//! - [`ServiceError`]: errors returned by a service's `run` or `stop`.
//! - [`StopErrors`]: every `stop` failure of one shutdown, aggregated without losing a cause.
//! - [`ConfigError`] and [`LoggingError`]: ambient setup failures.
//!
//! All types provide `as_label` for logs/metrics, mirroring each other.

use std::fmt;

use thiserror::Error;

/// # Errors produced by the supervisor runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// `run` was called on a supervisor that has already been run.
    #[error("supervisor has already been started")]
    AlreadyStarted,

    /// The termination trigger source could not be registered (e.g. OS signal handlers).
    #[error("failed to register trigger source {source_name}: {error}")]
    SignalRegistration {
        /// Name of the trigger source that failed.
        source_name: &'static str,
        /// Underlying I/O error.
        #[source]
        error: std::io::Error,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use serviceloader::RuntimeError;
    ///
    /// assert_eq!(RuntimeError::AlreadyStarted.as_label(), "runtime_already_started");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::AlreadyStarted => "runtime_already_started",
            RuntimeError::SignalRegistration { .. } => "runtime_signal_registration",
        }
    }
}

/// # Errors produced by a service.
///
/// Returned from [`Service::run`](crate::Service::run) (a launch failure, fatal for the whole
/// application) or [`Service::stop`](crate::Service::stop) (a stop failure, aggregated).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The service failed.
    #[error("{error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The service panicked; the panic was caught by the supervisor.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The service observed cancellation and gave up; treated as a graceful exit from `run`.
    #[error("context cancelled")]
    Canceled,
}

impl ServiceError {
    /// Builds a [`ServiceError::Fail`] from anything printable.
    ///
    /// ```
    /// use serviceloader::ServiceError;
    ///
    /// let err = ServiceError::fail("connection refused");
    /// assert_eq!(err.to_string(), "connection refused");
    /// ```
    pub fn fail(error: impl fmt::Display) -> Self {
        ServiceError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::Fail { .. } => "service_failed",
            ServiceError::Panicked { .. } => "service_panicked",
            ServiceError::Canceled => "service_canceled",
        }
    }

    /// Indicates a graceful exit rather than a failure.
    pub fn is_canceled(&self) -> bool {
        matches!(self, ServiceError::Canceled)
    }
}

/// One service that failed to stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopFailure {
    /// Name of the service whose `stop` failed.
    pub service: String,
    /// The error it returned (or the caught panic).
    pub error: ServiceError,
}

impl fmt::Display for StopFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} shutdown: {}", self.service, self.error)
    }
}

impl std::error::Error for StopFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// # Aggregated stop failures.
///
/// Holds every [`StopFailure`] of a shutdown in construction order. Never empty when
/// produced by the supervisor: a shutdown without failures yields no `StopErrors` at all.
///
/// ```
/// use serviceloader::{ServiceError, StopErrors, StopFailure};
///
/// let errs = StopErrors::from(vec![
///     StopFailure { service: "db".into(), error: ServiceError::fail("flush failed") },
///     StopFailure { service: "http".into(), error: ServiceError::fail("busy") },
/// ]);
/// assert_eq!(errs.len(), 2);
/// assert_eq!(errs.to_string(), "db shutdown: flush failed\nhttp shutdown: busy");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopErrors {
    failures: Vec<StopFailure>,
}

impl StopErrors {
    /// Number of services that failed to stop.
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Iterates the individual failures in construction order.
    pub fn iter(&self) -> impl Iterator<Item = &StopFailure> {
        self.failures.iter()
    }

    /// Names of the services that failed to stop.
    pub fn services(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.service.as_str()).collect()
    }

    /// Returns the failure attributed to `service`, if any.
    pub fn get(&self, service: &str) -> Option<&StopFailure> {
        self.failures.iter().find(|f| f.service == service)
    }

    /// Stable label for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        "shutdown_stop_failed"
    }
}

impl From<Vec<StopFailure>> for StopErrors {
    fn from(failures: Vec<StopFailure>) -> Self {
        Self { failures }
    }
}

impl IntoIterator for StopErrors {
    type Item = StopFailure;
    type IntoIter = std::vec::IntoIter<StopFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.into_iter()
    }
}

impl fmt::Display for StopErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for StopErrors {}

/// # Errors produced while loading configuration.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("error loading config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration source is not valid TOML.
    #[error("error parsing config {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    /// The merged configuration does not fit the target type.
    #[error("error while unmarshalling config: {0}")]
    Deserialize(#[source] toml::de::Error),

    /// An environment override addresses a key that conflicts with a scalar value.
    #[error("invalid environment override {key}: {reason}")]
    InvalidEnv { key: String, reason: String },

    /// The target's post-load hook rejected the configuration.
    #[error("error while running post load: {0}")]
    PostLoad(String),
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "config_io",
            ConfigError::Parse { .. } => "config_parse",
            ConfigError::Deserialize(_) => "config_deserialize",
            ConfigError::InvalidEnv { .. } => "config_invalid_env",
            ConfigError::PostLoad(_) => "config_post_load",
        }
    }
}

/// # Errors produced while installing the `tracing` subscriber.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LoggingError {
    /// Neither the requested level nor `RUST_LOG` is a valid filter.
    #[error("invalid log level '{level}': {reason}")]
    InvalidLevel { level: String, reason: String },

    /// A global subscriber is already installed.
    #[error("failed to set subscriber: {0}")]
    Install(String),
}

impl LoggingError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LoggingError::InvalidLevel { .. } => "logging_invalid_level",
            LoggingError::Install(_) => "logging_install",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_failure_is_attributed_to_service() {
        let f = StopFailure {
            service: "writer".into(),
            error: ServiceError::fail("disk full"),
        };
        assert_eq!(f.to_string(), "writer shutdown: disk full");
        assert!(std::error::Error::source(&f).is_some());
    }

    #[test]
    fn stop_errors_keep_every_cause() {
        let errs = StopErrors::from(vec![
            StopFailure {
                service: "a".into(),
                error: ServiceError::fail("x"),
            },
            StopFailure {
                service: "c".into(),
                error: ServiceError::Panicked { info: "boom".into() },
            },
        ]);
        assert_eq!(errs.services(), vec!["a", "c"]);
        assert!(errs.get("b").is_none());
        assert_eq!(
            errs.get("c").map(|f| f.error.as_label()),
            Some("service_panicked")
        );
        assert!(errs.to_string().contains("c shutdown: panicked: boom"));
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(ServiceError::Canceled.as_label(), "service_canceled");
        assert!(ServiceError::Canceled.is_canceled());
        assert!(!ServiceError::fail("x").is_canceled());

        let err = RuntimeError::SignalRegistration {
            source_name: "os-signals",
            error: std::io::Error::other("no reactor"),
        };
        assert_eq!(err.as_label(), "runtime_signal_registration");
        assert!(err.to_string().contains("os-signals"));
    }

    #[test]
    fn config_error_display() {
        let e = ConfigError::PostLoad("bus_capacity must be at least 1".into());
        assert!(e.to_string().contains("post load"));
        assert_eq!(e.as_label(), "config_post_load");
    }
}
