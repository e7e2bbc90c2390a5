//! # LogWriter: structured `tracing` output for runtime events
//!
//! Renders every [`Event`] as a `tracing` record with the event's metadata as fields.
//! Failures are logged at `error`, deadline problems at `warn`, the rest at `info`
//! (per-service stop progress at `debug`).
//!
//! ## Example output (fmt subscriber)
//! ```text
//! ERROR serviceloader: failed to start service service="writer" err="disk full"
//!  INFO serviceloader: shutdown requested reason="service_failed" service="writer" timeout_ms=10000
//!  WARN serviceloader: service failed to shutdown service="cache" err="flush failed"
//! ERROR serviceloader: failed to shutdown one or more services err="cache shutdown: flush failed"
//!  INFO serviceloader: services shutdown elapsed_ms=12
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const TARGET: &str = "serviceloader";

/// Event writer subscriber backed by `tracing`.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let service = e.service.as_deref().unwrap_or("");
        let err = e.error.as_deref().unwrap_or("");

        match e.kind {
            EventKind::ServiceStarting => {
                info!(target: TARGET, service, app = e.app.as_deref().unwrap_or(""), "starting service");
            }
            EventKind::ServiceExited => {
                info!(target: TARGET, service, "service exited");
            }
            EventKind::ServiceFailed => {
                error!(target: TARGET, service, err, "failed to start service");
            }
            EventKind::AllLaunched => {
                debug!(target: TARGET, "all services launched");
            }
            EventKind::ShutdownRequested => {
                info!(
                    target: TARGET,
                    reason = e.reason.unwrap_or(""),
                    service,
                    timeout_ms = e.timeout_ms,
                    "shutdown requested"
                );
            }
            EventKind::ServiceStopping => {
                debug!(target: TARGET, service, "stopping service");
            }
            EventKind::ServiceStopped => {
                debug!(target: TARGET, service, elapsed_ms = e.elapsed_ms, "service stopped");
            }
            EventKind::ServiceStopFailed => {
                warn!(target: TARGET, service, err, "service failed to shutdown");
            }
            EventKind::ServiceStopAbandoned => {
                warn!(target: TARGET, service, timeout_ms = e.timeout_ms, "service stop abandoned at deadline");
            }
            EventKind::ShutdownFailed => {
                error!(target: TARGET, err, "failed to shutdown one or more services");
            }
            EventKind::AllStoppedWithin => {
                info!(target: TARGET, elapsed_ms = e.elapsed_ms, "services shutdown");
            }
            EventKind::GraceExceeded => {
                warn!(
                    target: TARGET,
                    timeout_ms = e.timeout_ms,
                    elapsed_ms = e.elapsed_ms,
                    "failed to shutdown services before timeout"
                );
            }
            EventKind::ServiceLingering => {
                warn!(target: TARGET, service, "service still running at deadline; worker aborted");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: TARGET, subscriber = service, reason = err, "subscriber dropped an event");
            }
            EventKind::SubscriberPanicked => {
                error!(target: TARGET, subscriber = service, info = err, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
