//! Errors returned by the simulation engine.

use thiserror::Error;

/// An error raised when an event cannot be put into the event queue.
///
/// The rejected event is dropped, the queue and the clock stay unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// The requested firing time lies before the current simulation time.
    #[error("event time {time} is before the current simulation time {now}")]
    InPast {
        /// Requested event time.
        time: f64,
        /// Simulation time at the moment of the request.
        now: f64,
    },
    /// The requested delay is negative.
    #[error("event delay {0} is negative")]
    NegativeDelay(f64),
    /// The requested firing time or delay is NaN or infinite.
    #[error("event time {0} is not a finite number")]
    NotFinite(f64),
}
