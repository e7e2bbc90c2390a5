//! # Event subscriber trait.
//!
//! [`Subscribe`] is how code outside the supervisor observes a run. The logger handed to
//! [`SupervisorBuilder::with_logger`](crate::SupervisorBuilder::with_logger) is one;
//! [`with_subscribers`](crate::SupervisorBuilder::with_subscribers) adds more.
//!
//! The [`SubscriberSet`](crate::SubscriberSet) runs every subscriber on its own worker
//! behind its own bounded queue. A subscriber that falls behind loses events (reported as
//! `SubscriberOverflow`) but never slows the services or other subscribers down.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use serviceloader::{Event, EventKind, Subscribe};
//!
//! struct Alerts;
//!
//! #[async_trait]
//! impl Subscribe for Alerts {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::ServiceFailed {
//!             // page someone
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "alerts" }
//!     fn queue_capacity(&self) -> usize { 64 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Observer of runtime events.
///
/// Events arrive one at a time, in publication order. Keep `on_event` non-blocking:
/// a subscriber that stalls only fills its own queue.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event. A panic here is caught and published as `SubscriberPanicked`.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow and panic events. Defaults to the type name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue size for this subscriber (at least 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
