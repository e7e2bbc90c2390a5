//! # Launch coordinator: one concurrent worker per service.
//!
//! ```text
//! services[0]  services[1]  ...  services[N-1]
//!     │            │                   │
//!     └──► set.spawn(worker)   (construction order, concurrent execution)
//!            ├─ set_application_id(app_id)
//!            ├─ publish ServiceStarting
//!            ├─ run(run_scope.child_token())   (panics caught)
//!            │     ├─ Ok, or Err(Canceled) once cancelled ─► publish ServiceExited
//!            │     └─ any other Err / panic ───────────────► publish ServiceFailed
//!            │                               trigger.fire(ServiceFailed{name})
//!            └─ return RunExit
//! ```
//!
//! A worker that exits successfully never fires the trigger.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::core::panic_message;
use crate::core::trigger::{Trigger, TriggerReason};
use crate::error::ServiceError;
use crate::events::{Bus, Event, EventKind};
use crate::services::ServiceRef;

/// How a worker ended.
#[derive(Debug)]
pub(crate) struct RunExit {
    pub(crate) service: Arc<str>,
    pub(crate) failure: Option<ServiceError>,
}

/// Spawns a worker per service into `set`.
pub(crate) fn spawn_services(
    set: &mut JoinSet<RunExit>,
    services: &[ServiceRef],
    app_id: &Arc<str>,
    run_scope: &CancellationToken,
    trigger: &Arc<Trigger>,
    bus: &Bus,
) {
    for svc in services {
        let svc = Arc::clone(svc);
        let app_id = Arc::clone(app_id);
        let token = run_scope.child_token();
        let scope = run_scope.clone();
        let trigger = Arc::clone(trigger);
        let bus = bus.clone();

        set.spawn(async move {
            svc.set_application_id(&app_id);

            let name: Arc<str> = Arc::from(svc.name());
            bus.publish(
                Event::new(EventKind::ServiceStarting)
                    .with_service(Arc::clone(&name))
                    .with_app(app_id),
            );

            let res = AssertUnwindSafe(svc.run(token)).catch_unwind().await;
            let failure = match res {
                Ok(Ok(())) => None,
                Ok(Err(ServiceError::Canceled)) if scope.is_cancelled() => None,
                Ok(Err(e)) => Some(e),
                Err(panic) => Some(ServiceError::Panicked {
                    info: panic_message(&*panic),
                }),
            };

            match &failure {
                None => {
                    bus.publish(Event::new(EventKind::ServiceExited).with_service(Arc::clone(&name)));
                }
                Some(e) => {
                    bus.publish(
                        Event::new(EventKind::ServiceFailed)
                            .with_service(Arc::clone(&name))
                            .with_error(e.to_string()),
                    );
                    trigger.fire(TriggerReason::ServiceFailed {
                        service: name.to_string(),
                    });
                }
            }

            RunExit {
                service: name,
                failure,
            }
        });
    }
}
