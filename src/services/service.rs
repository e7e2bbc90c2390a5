//! # Service contract.
//!
//! A [`Service`] is an independently implemented long-running unit: it has a stable
//! [`name`](Service::name), learns the application id before it starts, runs until
//! cancelled and stops within a deadline.
//!
//! The common handle type is [`ServiceRef`], an `Arc<dyn Service>` shared between the
//! launch worker and the shutdown sequencer.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ServiceError;

/// # Long-running, stoppable unit managed by the supervisor.
///
/// ## Contract
/// - [`set_application_id`](Service::set_application_id) is called exactly once, before `run`.
/// - [`run`](Service::run) is long-lived and **must** return once its token is cancelled.
///   Any `Err` shuts the whole application down, except [`ServiceError::Canceled`]
///   returned after the token was cancelled.
/// - [`stop`](Service::stop) **must** honor its token: it is cancelled when the shutdown
///   deadline elapses, after which the supervisor stops waiting for this call.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use serviceloader::{Service, ServiceError};
///
/// struct Ticker;
///
/// #[async_trait]
/// impl Service for Ticker {
///     fn name(&self) -> &str { "ticker" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), ServiceError> {
///         ctx.cancelled().await;
///         Ok(())
///     }
///
///     async fn stop(&self, _ctx: CancellationToken) -> Result<(), ServiceError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Returns a stable, human-readable service name used in logs and error attribution.
    fn name(&self) -> &str;

    /// Receives the composite application id (`"{name}/{version}"`) before `run`.
    ///
    /// The default implementation ignores it.
    fn set_application_id(&self, _id: &str) {}

    /// Runs the service until completion or cancellation.
    async fn run(&self, ctx: CancellationToken) -> Result<(), ServiceError>;

    /// Requests orderly termination; `ctx` is cancelled when the shutdown deadline elapses.
    async fn stop(&self, ctx: CancellationToken) -> Result<(), ServiceError>;
}

/// Shared handle to a service.
pub type ServiceRef = Arc<dyn Service>;
