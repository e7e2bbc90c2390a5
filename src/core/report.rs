//! # Shutdown report: what one `run` observed.
//!
//! Returned by [`Supervisor::run`](crate::Supervisor::run) once the sequencer has finished.
//! The verdict ([`ShutdownOutcome`]) is exactly one of "completed within the deadline" or
//! "grace exceeded", never both.

use std::fmt;
use std::time::Duration;

use crate::config::format_duration;
use crate::core::trigger::TriggerReason;
use crate::error::StopErrors;

/// Timeout verdict of the shutdown phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every `stop` call returned before the deadline.
    Completed,
    /// The deadline elapsed before the sequencer finished.
    GraceExceeded {
        /// Services whose `stop` was still pending at the deadline.
        abandoned: Vec<String>,
    },
}

/// Aggregate result of a supervisor run.
#[derive(Debug)]
pub struct ShutdownReport {
    /// What started the shutdown.
    pub trigger: TriggerReason,
    /// Timeout verdict.
    pub outcome: ShutdownOutcome,
    /// Combined `stop` errors; `None` when every stop that returned succeeded.
    pub stop_errors: Option<StopErrors>,
    /// Services whose `run` failed, before or during shutdown.
    pub failed_services: Vec<String>,
    /// Services whose `run` had not returned by the deadline (their workers were aborted).
    pub lingering: Vec<String>,
    /// Configured shutdown timeout.
    pub grace: Duration,
    /// Time from trigger to verdict.
    pub elapsed: Duration,
}

impl ShutdownReport {
    /// `true` when no service failed, every stop succeeded and the deadline held.
    pub fn is_clean(&self) -> bool {
        self.outcome == ShutdownOutcome::Completed
            && self.stop_errors.is_none()
            && self.failed_services.is_empty()
            && !matches!(self.trigger, TriggerReason::ServiceFailed { .. })
    }

    pub fn timed_out(&self) -> bool {
        matches!(self.outcome, ShutdownOutcome::GraceExceeded { .. })
    }

    /// Process exit code by failure kind.
    ///
    /// - `3`: grace exceeded
    /// - `2`: one or more stop errors
    /// - `1`: a service's `run` failed
    /// - `0`: clean shutdown
    pub fn exit_code(&self) -> i32 {
        if self.timed_out() {
            3
        } else if self.stop_errors.is_some() {
            2
        } else if !self.failed_services.is_empty()
            || matches!(self.trigger, TriggerReason::ServiceFailed { .. })
        {
            1
        } else {
            0
        }
    }
}

impl fmt::Display for ShutdownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shutdown ({})", self.trigger.as_label())?;
        if let TriggerReason::ServiceFailed { service } = &self.trigger {
            write!(f, " by {service}")?;
        }
        match &self.outcome {
            ShutdownOutcome::Completed => {
                write!(f, ": completed in {}", format_duration(self.elapsed))?;
            }
            ShutdownOutcome::GraceExceeded { abandoned } => {
                write!(f, ": exceeded {}", format_duration(self.grace))?;
                if !abandoned.is_empty() {
                    write!(f, ", abandoned [{}]", abandoned.join(", "))?;
                }
            }
        }
        if let Some(errors) = &self.stop_errors {
            write!(f, ", {} stop error(s)", errors.len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ServiceError, StopFailure};

    fn report(outcome: ShutdownOutcome, stop_errors: Option<StopErrors>) -> ShutdownReport {
        ShutdownReport {
            trigger: TriggerReason::Signal,
            outcome,
            stop_errors,
            failed_services: Vec::new(),
            lingering: Vec::new(),
            grace: Duration::from_secs(10),
            elapsed: Duration::from_millis(12),
        }
    }

    #[test]
    fn clean_report_exits_zero() {
        let r = report(ShutdownOutcome::Completed, None);
        assert!(r.is_clean());
        assert!(!r.timed_out());
        assert_eq!(r.exit_code(), 0);
        assert_eq!(r.to_string(), "shutdown (signal): completed in 12ms");
    }

    #[test]
    fn exit_codes_rank_timeout_over_stop_errors() {
        let errors = StopErrors::from(vec![StopFailure {
            service: "cache".into(),
            error: ServiceError::fail("flush failed"),
        }]);

        let r = report(ShutdownOutcome::Completed, Some(errors));
        assert_eq!(r.exit_code(), 2);

        let mut r = report(
            ShutdownOutcome::GraceExceeded {
                abandoned: vec!["slow".into()],
            },
            r.stop_errors,
        );
        assert_eq!(r.exit_code(), 3);
        assert_eq!(
            r.to_string(),
            "shutdown (signal): exceeded 10s, abandoned [slow], 1 stop error(s)"
        );

        r.outcome = ShutdownOutcome::Completed;
        r.stop_errors = None;
        r.trigger = TriggerReason::ServiceFailed {
            service: "writer".into(),
        };
        assert_eq!(r.exit_code(), 1);
        assert!(!r.is_clean());
    }
}
