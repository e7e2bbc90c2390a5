//! # Shutdown sequencer.
//!
//! Calls `stop` on every service, one at a time, in construction order. Every call is
//! bounded by the shared deadline:
//!
//! ```text
//! for svc in services:
//!   publish ServiceStopping
//!   timeout_at(deadline, catch_unwind(svc.stop(ctx)))
//!     ├─ Ok(())     ─► publish ServiceStopped
//!     ├─ Err / panic ─► publish ServiceStopFailed, collect StopFailure
//!     └─ elapsed    ─► publish ServiceStopAbandoned, record name, move on
//! ```
//!
//! ## Rules
//! - Never short-circuits: a failing or abandoned service does not skip the rest.
//! - Once the deadline has passed, remaining services are still asked to stop with an
//!   already cancelled `ctx`; a call that does not complete on its first poll is abandoned.
//! - Abandonment is not a stop error; it is reported separately.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::panic_message;
use crate::error::{ServiceError, StopFailure};
use crate::events::{Bus, Event, EventKind};
use crate::services::ServiceRef;

/// Result of one pass over all services.
#[derive(Debug, Default)]
pub(crate) struct StopOutcome {
    pub(crate) failures: Vec<StopFailure>,
    pub(crate) abandoned: Vec<String>,
}

pub(crate) async fn stop_all(
    services: &[ServiceRef],
    ctx: &CancellationToken,
    deadline: Instant,
    timeout: Duration,
    bus: &Bus,
) -> StopOutcome {
    let mut outcome = StopOutcome::default();

    for svc in services {
        let name = svc.name();
        bus.publish(Event::new(EventKind::ServiceStopping).with_service(name));

        let started = Instant::now();
        let call = AssertUnwindSafe(svc.stop(ctx.clone())).catch_unwind();

        match time::timeout_at(deadline, call).await {
            Ok(Ok(Ok(()))) => {
                bus.publish(
                    Event::new(EventKind::ServiceStopped)
                        .with_service(name)
                        .with_elapsed(started.elapsed()),
                );
            }
            Ok(Ok(Err(error))) => {
                record_failure(&mut outcome, bus, name, error);
            }
            Ok(Err(panic)) => {
                let error = ServiceError::Panicked {
                    info: panic_message(&*panic),
                };
                record_failure(&mut outcome, bus, name, error);
            }
            Err(_elapsed) => {
                bus.publish(
                    Event::new(EventKind::ServiceStopAbandoned)
                        .with_service(name)
                        .with_timeout(timeout),
                );
                outcome.abandoned.push(name.to_string());
            }
        }
    }
    outcome
}

fn record_failure(outcome: &mut StopOutcome, bus: &Bus, name: &str, error: ServiceError) {
    bus.publish(
        Event::new(EventKind::ServiceStopFailed)
            .with_service(name)
            .with_error(error.to_string()),
    );
    outcome.failures.push(StopFailure {
        service: name.to_string(),
        error,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ServiceFn;
    use std::sync::{Arc, Mutex};

    fn service(
        name: &'static str,
        calls: Arc<Mutex<Vec<&'static str>>>,
        result: Result<(), ServiceError>,
    ) -> ServiceRef {
        ServiceFn::arc(
            name,
            |ctx: CancellationToken| async move {
                ctx.cancelled().await;
                Ok::<_, ServiceError>(())
            },
            move |_ctx: CancellationToken| {
                let calls = calls.clone();
                let result = result.clone();
                async move {
                    calls.lock().expect("lock").push(name);
                    result
                }
            },
        )
    }

    #[tokio::test]
    async fn every_service_is_stopped_despite_failures() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let services = vec![
            service("a", calls.clone(), Err(ServiceError::fail("first"))),
            service("b", calls.clone(), Ok(())),
            service("c", calls.clone(), Err(ServiceError::fail("third"))),
        ];
        let timeout = Duration::from_secs(1);

        let outcome = stop_all(
            &services,
            &CancellationToken::new(),
            Instant::now() + timeout,
            timeout,
            &Bus::new(16),
        )
        .await;

        assert_eq!(*calls.lock().expect("lock"), vec!["a", "b", "c"]);
        let failed: Vec<_> = outcome.failures.iter().map(|f| f.service.as_str()).collect();
        assert_eq!(failed, vec!["a", "c"]);
        assert!(outcome.abandoned.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn hung_stop_is_abandoned_at_deadline() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let hung: ServiceRef = ServiceFn::arc(
            "hung",
            |_ctx: CancellationToken| async { Ok::<_, ServiceError>(()) },
            |_ctx: CancellationToken| std::future::pending::<Result<(), ServiceError>>(),
        );
        let services = vec![hung, service("after", calls.clone(), Ok(()))];
        let timeout = Duration::from_millis(100);
        let start = Instant::now();

        let outcome = stop_all(
            &services,
            &CancellationToken::new(),
            start + timeout,
            timeout,
            &Bus::new(16),
        )
        .await;

        assert_eq!(outcome.abandoned, vec!["hung".to_string()]);
        assert_eq!(*calls.lock().expect("lock"), vec!["after"]);
        assert!(outcome.failures.is_empty());
        assert!(start.elapsed() >= timeout);
        assert!(start.elapsed() < timeout + Duration::from_millis(5));
    }
}
