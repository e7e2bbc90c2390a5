//! # Trigger sources: where external termination requests come from.
//!
//! Subscribing to process-wide OS signals is global state, so the supervisor only sees it
//! through the [`TriggerSource`] seam:
//! - [`OsSignals`] (default): `SIGINT` and `SIGTERM` on Unix, Ctrl-C elsewhere.
//! - [`ManualTrigger`]: an in-process source, for tests and embedding.
//!
//! A source is **armed** once, before any service is launched. Arming registers the
//! underlying handlers (so a failure surfaces as
//! [`RuntimeError::SignalRegistration`](crate::RuntimeError::SignalRegistration)) and
//! returns a future that resolves on the first trigger.

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

/// Source of external termination requests.
pub trait TriggerSource: Send + Sync + 'static {
    /// Name used in registration errors.
    fn name(&self) -> &'static str;

    /// Registers the source; the returned future resolves when it fires.
    ///
    /// Called from within the tokio runtime, once per run.
    fn arm(&self) -> std::io::Result<BoxFuture<'static, ()>>;
}

/// Operating-system interrupt and termination signals.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsSignals;

impl TriggerSource for OsSignals {
    fn name(&self) -> &'static str {
        "os-signals"
    }

    #[cfg(unix)]
    fn arm(&self) -> std::io::Result<BoxFuture<'static, ()>> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        Ok(Box::pin(async move {
            tokio::select! {
                _ = sigint.recv()  => {},
                _ = sigterm.recv() => {},
            }
        }))
    }

    #[cfg(not(unix))]
    fn arm(&self) -> std::io::Result<BoxFuture<'static, ()>> {
        Ok(Box::pin(async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        }))
    }
}

/// In-process trigger source; every clone fires the same trigger.
///
/// ```
/// use serviceloader::ManualTrigger;
///
/// let trigger = ManualTrigger::new();
/// let handle = trigger.clone();
/// handle.fire();
/// assert!(trigger.is_fired());
/// ```
#[derive(Clone, Debug, Default)]
pub struct ManualTrigger {
    token: CancellationToken,
}

impl ManualTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the trigger; idempotent.
    pub fn fire(&self) {
        self.token.cancel();
    }

    pub fn is_fired(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl TriggerSource for ManualTrigger {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn arm(&self) -> std::io::Result<BoxFuture<'static, ()>> {
        Ok(Box::pin(self.token.clone().cancelled_owned()))
    }
}
