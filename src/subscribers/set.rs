//! # Per-run fan-out of events to subscribers.
//!
//! A [`SubscriberSet`] gives every subscriber its own bounded lane and worker, so the
//! event listener never waits on a subscriber:
//!
//! ```text
//! emit_arc(ev)
//!   ├─► lane "log-writer" (bounded) ─► worker ─► on_event(ev)
//!   ├─► lane "metrics"    (bounded) ─► worker ─► on_event(ev)   panic ─► SubscriberPanicked
//!   └─► lane "..."        full      ─► event dropped for this lane ─► SubscriberOverflow
//! ```
//!
//! Each lane is FIFO; lanes are independent of each other. [`shutdown`](SubscriberSet::shutdown)
//! closes every lane and waits for the workers to work through what is already queued,
//! which is how [`Supervisor::run`](crate::Supervisor::run) delivers the verdict before
//! returning. Dropping the set (or the `shutdown` future) aborts every worker.
//!
//! Panics are caught with `AssertUnwindSafe`: a subscriber that panics while holding a
//! lock of its own may leave that state poisoned.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinSet;

use crate::core::panic_message;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

struct Lane {
    subscriber: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for the subscribers of one run.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    workers: JoinSet<()>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber. Must be called inside a tokio runtime.
    ///
    /// Overflow and panic reports are published on `bus`.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut lanes = Vec::with_capacity(subs.len());
        let mut workers = JoinSet::new();

        for sub in subs {
            let (tx, rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            lanes.push(Lane {
                subscriber: sub.name(),
                tx,
            });
            workers.spawn(deliver(sub, rx, bus.clone()));
        }
        Self {
            lanes,
            workers,
            bus,
        }
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Queues a copy of `event` on every lane.
    pub fn emit(&self, event: &Event) {
        self.emit_arc(Arc::new(event.clone()));
    }

    /// Queues `event` on every lane without waiting.
    ///
    /// A full or closed lane drops the event and publishes `SubscriberOverflow`,
    /// except for overflow events themselves.
    pub fn emit_arc(&self, event: Arc<Event>) {
        let report = event.kind != EventKind::SubscriberOverflow;

        for lane in &self.lanes {
            let reason = match lane.tx.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(TrySendError::Full(_)) => "full",
                Err(TrySendError::Closed(_)) => "closed",
            };
            if report {
                self.bus
                    .publish(Event::subscriber_overflow(lane.subscriber, reason));
            }
        }
    }

    /// Closes every lane and waits until the queued events have been handled.
    pub async fn shutdown(self) {
        let Self {
            lanes, mut workers, ..
        } = self;
        drop(lanes);
        while workers.join_next().await.is_some() {}
    }
}

async fn deliver(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(ev) = rx.recv().await {
        let handled = AssertUnwindSafe(sub.on_event(&ev)).catch_unwind().await;
        if let Err(panic) = handled {
            bus.publish(Event::subscriber_panicked(sub.name(), panic_message(&*panic)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recorder {
        seen: Arc<Mutex<Vec<EventKind>>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().expect("lock").push(event.kind);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Panicker;

    #[async_trait]
    impl Subscribe for Panicker {
        async fn on_event(&self, _event: &Event) {
            panic!("subscriber exploded");
        }

        fn name(&self) -> &'static str {
            "panicker"
        }
    }

    struct Tiny;

    #[async_trait]
    impl Subscribe for Tiny {
        async fn on_event(&self, _event: &Event) {
            std::future::pending::<()>().await;
        }

        fn name(&self) -> &'static str {
            "tiny"
        }

        fn queue_capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn shutdown_drains_queued_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let bus = Bus::new(16);
        let set = SubscriberSet::new(
            vec![Arc::new(Recorder { seen: seen.clone() })],
            bus.clone(),
        );
        assert_eq!(set.len(), 1);

        set.emit(&Event::new(EventKind::ServiceStarting));
        set.emit(&Event::new(EventKind::ServiceExited));
        set.shutdown().await;

        assert_eq!(
            *seen.lock().expect("lock"),
            vec![EventKind::ServiceStarting, EventKind::ServiceExited]
        );
    }

    #[tokio::test]
    async fn panics_are_reported_on_the_bus() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Panicker)], bus.clone());

        set.emit(&Event::new(EventKind::AllLaunched));
        set.shutdown().await;

        let ev = rx.recv().await.expect("panic event");
        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert_eq!(ev.service.as_deref(), Some("panicker"));
        assert_eq!(ev.error.as_deref(), Some("subscriber exploded"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn full_lane_reports_overflow() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Tiny)], bus.clone());

        // The worker has not run yet: the first event fills the lane.
        set.emit(&Event::new(EventKind::ServiceStarting));
        set.emit(&Event::new(EventKind::ServiceExited));

        let ev = rx.recv().await.expect("overflow event");
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.service.as_deref(), Some("tiny"));
    }
}
