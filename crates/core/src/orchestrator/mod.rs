//! Reservation orchestrator.
//!
//! Ties the components together for a single activity:
//! - **Session**: login through the retry executor
//! - **Catalog**: fresh listing, opening time taken from it
//! - **Trigger**: fires `lead` ahead of the opening, then waits for the exact instant
//! - **Submission**: sequential attempts on one session until Success or Fatal

mod runner;
mod types;

pub use runner::ReservationOrchestrator;
pub use types::{ReservationReport, ReserveError};
