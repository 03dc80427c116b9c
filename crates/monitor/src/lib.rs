//! Core of the slot watcher: drives the booking flow to the availability
//! view, classifies what it sees, decides whether to alert, and governs the
//! bounded retry loop.
//!
//! The pieces compose as: scheduler → navigation driver → classifier →
//! decision engine, with the browser and the notifier injected at the seams.

pub mod classify;
pub mod decide;
pub mod error;
pub mod navigate;
pub mod notify;
pub mod runner;
pub mod scheduler;
pub mod types;

pub use {
    error::MonitorError,
    notify::Notify,
    runner::Watcher,
    types::{AttemptResult, ReservationOutcome, RunOutcome, SlotDescriptor, Status},
};
