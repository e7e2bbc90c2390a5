//! # Termination trigger: first-wins, set-once, never blocks.
//!
//! Any number of parties may [`fire`](Trigger::fire) the trigger (the signal relay, every
//! failing service worker, [`Supervisor::request_shutdown`](crate::Supervisor::request_shutdown)).
//! Only the first reason is kept; later calls are no-ops and return immediately, so a
//! worker failing after shutdown has begun can never block on it.
//!
//! ```text
//! worker A ─ fire(ServiceFailed{A}) ──┐  first: reason stored, token cancelled
//! worker B ─ fire(ServiceFailed{B}) ──┼─► Trigger ─► wait() ─► control path (once)
//! signals  ─ fire(Signal) ────────────┘  later: ignored
//! ```

use std::sync::OnceLock;

use tokio_util::sync::CancellationToken;

/// Why shutdown started.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriggerReason {
    /// An OS interrupt/termination signal (or another armed trigger source) fired.
    Signal,
    /// A service's `run` returned an error (or panicked) first.
    ServiceFailed {
        /// Name of the failing service.
        service: String,
    },
    /// Shutdown was requested through the supervisor handle.
    Requested,
}

impl TriggerReason {
    /// Short stable label for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TriggerReason::Signal => "signal",
            TriggerReason::ServiceFailed { .. } => "service_failed",
            TriggerReason::Requested => "requested",
        }
    }
}

pub(crate) struct Trigger {
    fired: CancellationToken,
    reason: OnceLock<TriggerReason>,
}

impl Trigger {
    pub(crate) fn new() -> Self {
        Self {
            fired: CancellationToken::new(),
            reason: OnceLock::new(),
        }
    }

    /// Fires the trigger; returns `true` only for the call whose reason was kept.
    pub(crate) fn fire(&self, reason: TriggerReason) -> bool {
        let first = self.reason.set(reason).is_ok();
        self.fired.cancel();
        first
    }

    pub(crate) fn is_fired(&self) -> bool {
        self.fired.is_cancelled()
    }

    /// Resolves once the trigger has fired, with the winning reason.
    pub(crate) async fn wait(&self) -> TriggerReason {
        self.fired.cancelled().await;
        // The reason is stored before the token is cancelled.
        self.reason
            .get()
            .cloned()
            .unwrap_or(TriggerReason::Requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_reason_wins() {
        let trigger = Trigger::new();
        assert!(!trigger.is_fired());

        assert!(trigger.fire(TriggerReason::ServiceFailed {
            service: "writer".into()
        }));
        assert!(!trigger.fire(TriggerReason::Signal));
        assert!(!trigger.fire(TriggerReason::Requested));

        assert!(trigger.is_fired());
        assert_eq!(
            trigger.wait().await,
            TriggerReason::ServiceFailed {
                service: "writer".into()
            }
        );
    }

    #[tokio::test]
    async fn concurrent_fires_never_block() {
        let trigger = std::sync::Arc::new(Trigger::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let t = trigger.clone();
            handles.push(tokio::spawn(async move {
                t.fire(TriggerReason::ServiceFailed {
                    service: format!("svc-{i}"),
                })
            }));
        }

        let mut winners = 0;
        for h in handles {
            if h.await.expect("join") {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(trigger.wait().await.as_label(), "service_failed");
    }
}
