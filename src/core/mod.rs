//! Runtime core: launch, termination trigger and shutdown.
//!
//! The public API of this module is [`Supervisor`] (built with [`SupervisorBuilder`]),
//! the [`ShutdownReport`] it returns, and the [`TriggerSource`] seam for external
//! termination requests.
//!
//! Internal modules:
//! - [`launcher`]: one worker per service; assigns the application id and runs it;
//! - [`trigger`]: first-wins, set-once termination trigger;
//! - [`sequencer`]: sequential, deadline-bounded `stop` of every service;
//! - [`signals`]: OS signal and in-process trigger sources;
//! - [`supervisor`]: wires everything together and produces the report.

mod builder;
mod launcher;
mod report;
mod sequencer;
mod signals;
mod supervisor;
mod trigger;


use std::any::Any;

pub use builder::SupervisorBuilder;
pub use report::{ShutdownOutcome, ShutdownReport};
pub use signals::{ManualTrigger, OsSignals, TriggerSource};
pub use supervisor::Supervisor;
pub use trigger::TriggerReason;

/// Renders a caught panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
