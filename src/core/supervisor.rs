//! # Supervisor: launches every service, waits for the first trigger, shuts everything down.
//!
//! The [`Supervisor`] owns the service set, the application identity, the shutdown
//! configuration and the two single-use signals of a run: the termination trigger and the
//! ready marker. Each [`run`](Supervisor::run) creates its own event [`Bus`] and a
//! [`SubscriberSet`] fed from it.
//!
//! ## High-level architecture
//! ```text
//! run():
//!   source.arm()                    (registration error ─► RuntimeError::SignalRegistration)
//!   event_listener(): Bus.subscribe() ─► SubscriberSet::emit_arc(&Event)
//!
//! Launch:
//!   services[0]  services[1]  ...  services[N-1]
//!       │            │                   │
//!       └──► launcher::spawn_services(..)      (one worker each, run_scope.child_token())
//!   ready.cancel(), publish AllLaunched
//!
//! Wait (first wins):
//!   trigger.wait()  ◄── worker failure ─ fire(ServiceFailed{name})
//!                   ◄── armed source   ─ fire(Signal)
//!                   ◄── request_shutdown() ─ fire(Requested)
//!
//! Shutdown path (drive_shutdown):
//!   deadline = now + cfg.shutdown_timeout
//!   publish ShutdownRequested
//!   run_scope.cancel()                  → every `run` token
//!   root.cancel() at deadline           → every `stop` token
//!   sequencer::stop_all(..)             (sequential, abandons at deadline)
//!   join run workers until deadline     (rest aborted ─► ServiceLingering)
//!   publish ShutdownFailed              (if any stop error)
//!   publish GraceExceeded | AllStoppedWithin   (verdict, always last)
//!   flush subscribers (aborted after 2s) ─► ShutdownReport
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use serviceloader::{ManualTrigger, ServiceError, ServiceFn, Supervisor, SupervisorConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ticker = ServiceFn::arc(
//!         "ticker",
//!         |ctx: CancellationToken| async move {
//!             ctx.cancelled().await;
//!             Ok::<_, ServiceError>(())
//!         },
//!         |_ctx: CancellationToken| async { Ok::<_, ServiceError>(()) },
//!     );
//!
//!     let trigger = ManualTrigger::new();
//!     let sup = Supervisor::builder()
//!         .with_identifier("gateway", "1.2.0")
//!         .with_config(SupervisorConfig {
//!             shutdown_timeout: Duration::from_secs(1),
//!             ..SupervisorConfig::default()
//!         })
//!         .with_service(ticker)
//!         .with_trigger_source(std::sync::Arc::new(trigger.clone()))
//!         .build();
//!
//!     let runner = tokio::spawn({
//!         let sup = sup.clone();
//!         async move { sup.run().await }
//!     });
//!     sup.ready().await;
//!     trigger.fire();
//!
//!     let report = runner.await??;
//!     assert!(report.is_clean());
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{
    builder::SupervisorBuilder,
    launcher::{RunExit, spawn_services},
    report::{ShutdownOutcome, ShutdownReport},
    sequencer,
    signals::TriggerSource,
    trigger::{Trigger, TriggerReason},
};
use crate::{
    config::SupervisorConfig,
    error::{RuntimeError, StopErrors},
    events::{Bus, Event, EventKind},
    identity::Identity,
    services::ServiceRef,
    subscribers::{Subscribe, SubscriberSet},
};

/// Upper bound for delivering the remaining events to subscribers before `run` returns.
const SUBSCRIBER_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Launches services, waits for the first termination trigger and shuts them all down.
pub struct Supervisor {
    identity: Identity,
    cfg: SupervisorConfig,
    services: Vec<ServiceRef>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    source: Arc<dyn TriggerSource>,

    trigger: Arc<Trigger>,
    ready: CancellationToken,
    started: AtomicBool,
}

impl Supervisor {
    pub(crate) fn new_internal(
        identity: Identity,
        cfg: SupervisorConfig,
        services: Vec<ServiceRef>,
        subscribers: Vec<Arc<dyn Subscribe>>,
        source: Arc<dyn TriggerSource>,
    ) -> Self {
        Self {
            identity,
            cfg,
            services,
            subscribers,
            source,
            trigger: Arc::new(Trigger::new()),
            ready: CancellationToken::new(),
            started: AtomicBool::new(false),
        }
    }

    /// Creates a new builder.
    pub fn builder() -> SupervisorBuilder {
        SupervisorBuilder::new()
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.cfg
    }

    /// Waits until every service launch has been dispatched.
    ///
    /// Dispatched, not completed: `run` is long-lived.
    pub async fn ready(&self) {
        self.ready.cancelled().await;
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is_cancelled()
    }

    /// Fires the termination trigger with [`TriggerReason::Requested`].
    ///
    /// Returns `false` if another trigger already won. May be called before `run`, in
    /// which case shutdown starts right after the launch.
    pub fn request_shutdown(&self) -> bool {
        self.trigger.fire(TriggerReason::Requested)
    }

    /// `true` once any termination trigger has fired.
    pub fn is_shutting_down(&self) -> bool {
        self.trigger.is_fired()
    }

    /// Runs every service until the first termination trigger, then shuts them all down.
    ///
    /// Blocks until a trigger fires: services returning `Ok` on their own do not end the run.
    ///
    /// # Errors
    /// - [`RuntimeError::AlreadyStarted`] on a second call.
    /// - [`RuntimeError::SignalRegistration`] if the trigger source cannot be armed;
    ///   no service is launched in that case.
    ///
    /// Stop errors, launch failures and deadline exceedance are reported through the
    /// returned [`ShutdownReport`], not as an `Err`.
    pub async fn run(&self) -> Result<ShutdownReport, RuntimeError> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(RuntimeError::AlreadyStarted);
        }
        let armed = self
            .source
            .arm()
            .map_err(|error| RuntimeError::SignalRegistration {
                source_name: self.source.name(),
                error,
            })?;

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let mut listener = self.event_listener(&bus);

        let root = CancellationToken::new();
        let _root_guard = root.clone().drop_guard();
        let run_scope = root.child_token();

        let app_id: Arc<str> = Arc::from(self.identity.id());
        let mut workers = JoinSet::new();
        spawn_services(
            &mut workers,
            &self.services,
            &app_id,
            &run_scope,
            &self.trigger,
            &bus,
        );
        self.ready.cancel();
        bus.publish(Event::new(EventKind::AllLaunched).with_app(app_id));

        let reason = tokio::select! {
            reason = self.trigger.wait() => reason,
            _ = armed => {
                self.trigger.fire(TriggerReason::Signal);
                self.trigger.wait().await
            }
        };

        let report = self
            .drive_shutdown(reason, &mut workers, &root, &run_scope, &bus)
            .await;

        drop(bus);
        if time::timeout(SUBSCRIBER_FLUSH_TIMEOUT, &mut listener).await.is_err() {
            warn!(
                timeout_ms = SUBSCRIBER_FLUSH_TIMEOUT.as_millis() as u64,
                "subscribers did not drain in time; dropping pending events"
            );
            listener.abort();
        }
        Ok(report)
    }

    /// Subscribes to the bus and forwards events to a fresh subscriber set.
    ///
    /// Stops after the verdict event, then drains every subscriber queue.
    fn event_listener(&self, bus: &Bus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(self.subscribers.clone(), bus.clone());

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        let last = ev.kind.is_terminal();
                        set.emit_arc(Arc::new(ev));
                        if last {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
            set.shutdown().await;
        })
    }

    /// Runs the shutdown phase for the winning trigger and builds the report.
    async fn drive_shutdown(
        &self,
        reason: TriggerReason,
        workers: &mut JoinSet<RunExit>,
        root: &CancellationToken,
        run_scope: &CancellationToken,
        bus: &Bus,
    ) -> ShutdownReport {
        let timeout = self.cfg.shutdown_timeout;
        let started = Instant::now();
        let deadline = started + timeout;

        let mut requested = Event::new(EventKind::ShutdownRequested)
            .with_reason(reason.as_label())
            .with_timeout(timeout);
        if let TriggerReason::ServiceFailed { service } = &reason {
            requested = requested.with_service(service.as_str());
        }
        bus.publish(requested);

        run_scope.cancel();
        let deadline_timer = if timeout.is_zero() {
            root.cancel();
            None
        } else {
            let root = root.clone();
            Some(tokio::spawn(async move {
                time::sleep_until(deadline).await;
                root.cancel();
            }))
        };

        let stopped =
            sequencer::stop_all(&self.services, &root.child_token(), deadline, timeout, bus).await;
        let exceeded = !stopped.abandoned.is_empty() || Instant::now() >= deadline;
        let elapsed = started.elapsed();

        let exits = join_until(workers, deadline).await;
        let lingering = if workers.is_empty() {
            Vec::new()
        } else {
            workers.abort_all();
            self.lingering(&exits)
        };
        for name in &lingering {
            bus.publish(Event::new(EventKind::ServiceLingering).with_service(name.as_str()));
        }
        if let Some(timer) = deadline_timer {
            timer.abort();
        }

        let failed_services = exits
            .iter()
            .filter(|exit| exit.failure.is_some())
            .map(|exit| exit.service.to_string())
            .collect();

        let stop_errors = if stopped.failures.is_empty() {
            None
        } else {
            let errors = StopErrors::from(stopped.failures);
            bus.publish(Event::new(EventKind::ShutdownFailed).with_error(errors.to_string()));
            Some(errors)
        };

        let outcome = if exceeded {
            bus.publish(
                Event::new(EventKind::GraceExceeded)
                    .with_timeout(timeout)
                    .with_elapsed(elapsed),
            );
            ShutdownOutcome::GraceExceeded {
                abandoned: stopped.abandoned,
            }
        } else {
            bus.publish(Event::new(EventKind::AllStoppedWithin).with_elapsed(elapsed));
            ShutdownOutcome::Completed
        };

        ShutdownReport {
            trigger: reason,
            outcome,
            stop_errors,
            failed_services,
            lingering,
            grace: timeout,
            elapsed,
        }
    }

    /// Services without a recorded exit, in construction order.
    fn lingering(&self, exits: &[RunExit]) -> Vec<String> {
        let mut exited: Vec<&str> = exits.iter().map(|exit| &*exit.service).collect();
        let mut lingering = Vec::new();
        for svc in &self.services {
            match exited.iter().position(|name| *name == svc.name()) {
                Some(pos) => {
                    exited.swap_remove(pos);
                }
                None => lingering.push(svc.name().to_string()),
            }
        }
        lingering
    }
}

/// Collects finished run workers until the set is empty or the deadline elapses.
async fn join_until(workers: &mut JoinSet<RunExit>, deadline: Instant) -> Vec<RunExit> {
    let mut exits = Vec::with_capacity(workers.len());
    let _ = time::timeout_at(deadline, async {
        while let Some(res) = workers.join_next().await {
            if let Ok(exit) = res {
                exits.push(exit);
            }
        }
    })
    .await;
    exits
}
