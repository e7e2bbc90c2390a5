//! # Runtime events emitted by the supervisor and its service workers.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Launch events**: a service worker starting, exiting or failing
//! - **Shutdown events**: trigger observed, per-service stop outcomes, final verdict
//! - **Subscriber events**: overflow and panics inside subscriber workers
//!
//! The [`Event`] struct carries additional metadata such as timestamps, service name,
//! error text and durations.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use serviceloader::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ServiceStopFailed)
//!     .with_service("writer")
//!     .with_error("flush failed")
//!     .with_timeout(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::ServiceStopFailed);
//! assert_eq!(ev.service.as_deref(), Some("writer"));
//! assert_eq!(ev.error.as_deref(), Some("flush failed"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `service`: subscriber name
    /// - `error`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `service`: subscriber name
    /// - `error`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Launch events ===
    /// A service received the application id and its `run` is about to be invoked.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `app`: composite application id
    ServiceStarting,

    /// A service's `run` returned successfully (or observed cancellation).
    ///
    /// Sets:
    /// - `service`: service name
    ServiceExited,

    /// A service's `run` returned an error or panicked: a launch failure.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `error`: failure message
    ServiceFailed,

    /// Every service worker has been dispatched (the ready marker is set).
    AllLaunched,

    // === Shutdown events ===
    /// The termination trigger fired; shutdown begins.
    ///
    /// Sets:
    /// - `reason`: trigger reason (`signal`, `requested`, or `service_failed`)
    /// - `service`: failing service, for `service_failed`
    /// - `timeout_ms`: shutdown deadline
    ShutdownRequested,

    /// `stop` is being invoked on a service.
    ///
    /// Sets:
    /// - `service`: service name
    ServiceStopping,

    /// A service's `stop` returned successfully.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `elapsed_ms`: time spent in `stop`
    ServiceStopped,

    /// A service's `stop` returned an error or panicked.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `error`: failure message
    ServiceStopFailed,

    /// The deadline elapsed while waiting for a service's `stop`; the call was abandoned.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `timeout_ms`: shutdown deadline
    ServiceStopAbandoned,

    /// One or more services failed to stop.
    ///
    /// Sets:
    /// - `error`: combined error message
    ShutdownFailed,

    /// Every `stop` returned before the deadline.
    ///
    /// Sets:
    /// - `elapsed_ms`: total shutdown duration
    AllStoppedWithin,

    /// The deadline elapsed before the shutdown sequence finished.
    ///
    /// Sets:
    /// - `timeout_ms`: shutdown deadline
    /// - `elapsed_ms`: total shutdown duration
    GraceExceeded,

    /// A service's `run` had not returned by the deadline; its worker was aborted.
    ///
    /// Sets:
    /// - `service`: service name
    ServiceLingering,
}

impl EventKind {
    /// Short stable name used by log renderers.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SubscriberPanicked => "subscriber-panicked",
            EventKind::SubscriberOverflow => "subscriber-overflow",
            EventKind::ServiceStarting => "service-starting",
            EventKind::ServiceExited => "service-exited",
            EventKind::ServiceFailed => "service-failed",
            EventKind::AllLaunched => "all-launched",
            EventKind::ShutdownRequested => "shutdown-requested",
            EventKind::ServiceStopping => "service-stopping",
            EventKind::ServiceStopped => "service-stopped",
            EventKind::ServiceStopFailed => "service-stop-failed",
            EventKind::ServiceStopAbandoned => "service-stop-abandoned",
            EventKind::ShutdownFailed => "shutdown-failed",
            EventKind::AllStoppedWithin => "all-stopped-within-deadline",
            EventKind::GraceExceeded => "grace-exceeded",
            EventKind::ServiceLingering => "service-lingering",
        }
    }

    /// True for the two verdicts that close a run; nothing of that run is published after them.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventKind::AllStoppedWithin | EventKind::GraceExceeded)
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the service (or subscriber), if applicable.
    pub service: Option<Arc<str>>,
    /// Composite application id.
    pub app: Option<Arc<str>>,
    /// Error text (failures, overflow details, panic info).
    pub error: Option<Arc<str>>,
    /// Short machine-readable reason (trigger reasons).
    pub reason: Option<&'static str>,
    /// Shutdown deadline in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Measured duration in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            service: None,
            app: None,
            error: None,
            reason: None,
            timeout_ms: None,
            elapsed_ms: None,
        }
    }

    /// Attaches a service name.
    #[inline]
    pub fn with_service(mut self, service: impl Into<Arc<str>>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Attaches the composite application id.
    #[inline]
    pub fn with_app(mut self, app: impl Into<Arc<str>>) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Attaches error text.
    #[inline]
    pub fn with_error(mut self, error: impl Into<Arc<str>>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attaches a machine-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: &'static str) -> Self {
        self.reason = Some(reason);
        self
    }

    /// Attaches a deadline (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(millis(d));
        self
    }

    /// Attaches a measured duration (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(millis(d));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_service(subscriber)
            .with_error(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_service(subscriber)
            .with_error(info)
    }
}

fn millis(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::ServiceStarting);
        let b = Event::new(EventKind::ServiceExited);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn durations_saturate() {
        let ev = Event::new(EventKind::GraceExceeded)
            .with_timeout(Duration::from_secs(u64::MAX))
            .with_elapsed(Duration::from_millis(1500));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
        assert_eq!(ev.elapsed_ms, Some(1500));
    }

    #[test]
    fn only_verdicts_are_terminal() {
        assert!(EventKind::AllStoppedWithin.is_terminal());
        assert!(EventKind::GraceExceeded.is_terminal());
        assert!(!EventKind::ShutdownFailed.is_terminal());
        assert!(!EventKind::ServiceFailed.is_terminal());
    }
}
