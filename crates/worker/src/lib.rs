//! Multi-step population of sources off the interactive path.
//!
//! Each step produces one payload and writes it with a single [`Source::set`] call, so the
//! usual synchronous propagation runs once per step. Steps are checked against a
//! [`CancellationToken`] and reported through a shared [`Progress`].
//!
//! [`Source::set`]: weir_reactive::Source::set
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

mod populate;
mod progress;

pub use populate::{PopulateError, PopulationReport, StepError, StepPolicy, populate, spawn_population};
pub use progress::Progress;
