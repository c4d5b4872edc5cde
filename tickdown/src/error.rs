//! Defines the error surface of the Tickdown engine.
//!
//! All failures are local and synchronous: a call either performs its full
//! transition or leaves the engine untouched and reports why. There is no
//! global failure state and nothing is retried internally.

use crate::common::TimerState;
use thiserror::Error;

/// Errors returned by [`TimerEngine`](crate::engine::TimerEngine) operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TimerError {
    /// A timer length was not a strictly positive, finite number of seconds.
    #[error("timer length must be greater than 0 seconds (got {0})")]
    InvalidLength(f64),

    /// An operation was attempted in a state whose guard rejects it.
    ///
    /// Carries the attempted operation and the state it was attempted in so
    /// callers can build correct call sequences.
    #[error("cannot {operation} while the timer is {}", state.as_str())]
    InvalidTransition {
        /// The operation that was attempted (e.g., `"start"`, `"pause"`).
        operation: &'static str,
        /// The engine state at the time of the call.
        state: TimerState,
    },
}

impl TimerError {
    /// Returns true if this error is a state-machine guard rejection.
    #[must_use]
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }
}
