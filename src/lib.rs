//! # serviceloader
//!
//! **serviceloader** launches a fixed, ordered set of long-running async services,
//! waits for the first termination trigger (an OS signal or a failing service) and then
//! stops every service, one at a time, within a shutdown deadline.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Service    │   │   Service    │   │   Service    │
//!     │ (user impl)  │   │ (user impl)  │   │ (ServiceFn)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor                                                       │
//! │  - Identity ("{name}/{version}", assigned to every service)       │
//! │  - SupervisorConfig (shutdown_timeout, bus_capacity)              │
//! │  - Trigger (first wins: Signal | ServiceFailed | Requested)       │
//! │  - TriggerSource (OsSignals by default, ManualTrigger in tests)   │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │ run worker   │   │ run worker   │   │ run worker   │   │
//!     │ (catch panic)│   │ (catch panic)│   │ (catch panic)│   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ ServiceStarting  │ ServiceExited    │ ServiceFailed   │ ShutdownRequested
//!      │                  │                  │ ─► trigger      │ ServiceStop*
//!      ▼                  ▼                  ▼                 ▼ verdict
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │              (capacity: SupervisorConfig::bus_capacity)           │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                          ┌────────────────┐
//!                          │ event_listener │
//!                          └───────┬────────┘
//!                                  ▼
//!                           SubscriberSet (per-sub queues)
//!                        ┌─────────┼─────────┐
//!                        ▼         ▼         ▼
//!                    LogWriter   sub2      subN
//! ```
//!
//! ### Lifecycle
//! ```text
//! Supervisor::run()
//!   ├─► arm trigger source (OS signals)
//!   ├─► for each service, concurrently:
//!   │     set_application_id(id) ─► run(run token)
//!   │       └─ Err / panic ─► trigger.fire(ServiceFailed)
//!   ├─► ready marker
//!   ├─► wait for the first trigger
//!   └─► shutdown (deadline = now + shutdown_timeout):
//!         ├─ cancel every run token
//!         ├─ for each service in order: stop(stop token), bounded by the deadline
//!         ├─ aggregate stop errors (StopErrors)
//!         └─ verdict: AllStoppedWithin | GraceExceeded ─► ShutdownReport
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                          |
//! |-------------------|-----------------------------------------------------------------|---------------------------------------------|
//! | **Services**      | Contract for managed units; closure-backed services.            | [`Service`], [`ServiceFn`], [`ServiceRef`]  |
//! | **Supervision**   | Launch, first-wins trigger, bounded sequential shutdown.        | [`Supervisor`], [`SupervisorBuilder`]       |
//! | **Triggers**      | Injectable source of external termination requests.             | [`TriggerSource`], [`OsSignals`], [`ManualTrigger`] |
//! | **Reporting**     | What a run observed, with exit codes by failure kind.           | [`ShutdownReport`], [`ShutdownOutcome`]     |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, custom).          | [`Subscribe`], [`LogWriter`]                |
//! | **Errors**        | Typed errors, stop failures aggregated per service.             | [`RuntimeError`], [`ServiceError`], [`StopErrors`] |
//! | **Configuration** | TOML file selected by `APP_ENV`, `APP_*` env overrides.         | [`SupervisorConfig`], [`ConfigLoader`]      |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use serviceloader::{ServiceError, ServiceFn, ServiceRef, Supervisor, SupervisorConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = SupervisorConfig::default();
//!     cfg.shutdown_timeout = Duration::from_secs(5);
//!
//!     let hello: ServiceRef = ServiceFn::arc(
//!         "hello",
//!         |ctx: CancellationToken| async move {
//!             ctx.cancelled().await;
//!             Ok::<_, ServiceError>(())
//!         },
//!         |_ctx: CancellationToken| async { Ok::<_, ServiceError>(()) },
//!     );
//!
//!     let sup = Supervisor::builder()
//!         .with_identifier("hello-app", "0.1.0")
//!         .with_config(cfg)
//!         .with_service(hello)
//!         .build();
//!
//!     // Shut down right after launch instead of waiting for Ctrl-C.
//!     sup.request_shutdown();
//!     let report = sup.run().await?;
//!     assert_eq!(report.exit_code(), 0);
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod identity;
pub mod logging;
mod services;
mod subscribers;

// ---- Public re-exports ----

pub use config::{
    ConfigLoader, DEFAULT_ENV_PREFIX, DEFAULT_SHUTDOWN_TIMEOUT, ENV_SELECTOR, PostLoad,
    SupervisorConfig, file_for_env, format_duration, parse_duration,
};
pub use crate::core::{
    ManualTrigger, OsSignals, ShutdownOutcome, ShutdownReport, Supervisor, SupervisorBuilder,
    TriggerReason, TriggerSource,
};
pub use error::{ConfigError, LoggingError, RuntimeError, ServiceError, StopErrors, StopFailure};
pub use events::{Bus, Event, EventKind};
pub use identity::Identity;
pub use services::{Service, ServiceFn, ServiceRef};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
