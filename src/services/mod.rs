//! # Service abstractions.
//!
//! - [`Service`] - trait every managed unit implements (identify, run, stop, accept id)
//! - [`ServiceFn`] - closure-backed implementation
//! - [`ServiceRef`] - shared reference to a service (`Arc<dyn Service>`)

mod service;
mod service_fn;

pub use service::{Service, ServiceRef};
pub use service_fn::ServiceFn;
