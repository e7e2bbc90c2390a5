//! # Event subscribers for the serviceloader runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and the
//! built-in [`LogWriter`], the default structured logger.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   worker/sequencer ── publish(Event) ──► Bus ──► event_listener ──► SubscriberSet
//!                                                                       │
//!                                                            ┌──────────┼──────────┐
//!                                                            ▼          ▼          ▼
//!                                                        LogWriter   Metrics    Custom
//! ```

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
