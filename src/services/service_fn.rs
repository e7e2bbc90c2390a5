//! # Function-backed service (`ServiceFn`)
//!
//! [`ServiceFn`] wraps two closures, `run: Fn(CancellationToken) -> Fut` and
//! `stop: Fn(CancellationToken) -> Fut`, producing a fresh future per call.
//! Shared state between the two is explicit: capture an `Arc<...>` in both closures.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use serviceloader::{ServiceError, ServiceFn, ServiceRef};
//!
//! let svc: ServiceRef = ServiceFn::arc(
//!     "worker",
//!     |ctx: CancellationToken| async move {
//!         ctx.cancelled().await;
//!         Ok::<_, ServiceError>(())
//!     },
//!     |_ctx: CancellationToken| async { Ok::<_, ServiceError>(()) },
//! );
//!
//! assert_eq!(svc.name(), "worker");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ServiceError;
use crate::services::service::Service;

/// Function-backed service implementation.
///
/// Remembers the application id assigned by the supervisor (first assignment wins).
pub struct ServiceFn<R, S> {
    name: Cow<'static, str>,
    run: R,
    stop: S,
    app_id: OnceLock<String>,
}

impl<R, S> ServiceFn<R, S> {
    /// Creates a new function-backed service.
    ///
    /// Prefer [`ServiceFn::arc`] when you immediately need a [`ServiceRef`](crate::ServiceRef).
    pub fn new(name: impl Into<Cow<'static, str>>, run: R, stop: S) -> Self {
        Self {
            name: name.into(),
            run,
            stop,
            app_id: OnceLock::new(),
        }
    }

    /// Creates the service and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, run: R, stop: S) -> Arc<Self> {
        Arc::new(Self::new(name, run, stop))
    }

    /// The application id this service was given, if it has been launched.
    pub fn application_id(&self) -> Option<&str> {
        self.app_id.get().map(String::as_str)
    }
}

#[async_trait]
impl<R, RFut, S, SFut> Service for ServiceFn<R, S>
where
    R: Fn(CancellationToken) -> RFut + Send + Sync + 'static,
    RFut: Future<Output = Result<(), ServiceError>> + Send + 'static,
    S: Fn(CancellationToken) -> SFut + Send + Sync + 'static,
    SFut: Future<Output = Result<(), ServiceError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn set_application_id(&self, id: &str) {
        let _ = self.app_id.set(id.to_owned());
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), ServiceError> {
        (self.run)(ctx).await
    }

    async fn stop(&self, ctx: CancellationToken) -> Result<(), ServiceError> {
        (self.stop)(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_and_stop_call_their_closures() {
        let svc = ServiceFn::new(
            "echo",
            |_ctx: CancellationToken| async { Err::<(), _>(ServiceError::fail("run")) },
            |_ctx: CancellationToken| async { Err::<(), _>(ServiceError::fail("stop")) },
        );

        let token = CancellationToken::new();
        assert_eq!(svc.run(token.clone()).await, Err(ServiceError::fail("run")));
        assert_eq!(svc.stop(token).await, Err(ServiceError::fail("stop")));
    }

    #[test]
    fn first_application_id_wins() {
        let svc = ServiceFn::new(
            "echo",
            |_ctx: CancellationToken| async { Ok::<_, ServiceError>(()) },
            |_ctx: CancellationToken| async { Ok::<_, ServiceError>(()) },
        );
        assert_eq!(svc.application_id(), None);

        svc.set_application_id("gateway/1.2.0");
        svc.set_application_id("other/0.0.1");
        assert_eq!(svc.application_id(), Some("gateway/1.2.0"));
        assert_eq!(svc.name(), "echo");
    }
}
