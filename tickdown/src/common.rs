//! Contains common, primitive types shared across the Tickdown engine.
//!
//! This module defines the lifecycle enums and the ID type used to uniquely
//! identify registered callback listeners. Using distinct types improves
//! type safety and code clarity.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Uniquely and safely identifies a registered callback listener.
    ///
    /// This key is returned when a listener (e.g., for second boundaries or
    /// completion) is added to the engine. It is guaranteed to be unique and
    /// will not be reused, preventing stale ID bugs.
    pub struct ListenerId;
}

/// The lifecycle state of a [`TimerEngine`](crate::engine::TimerEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    /// No run is in progress. The remaining time is not meaningful.
    NotRunning,
    /// A run is in progress but the tick subscription is suspended.
    Paused,
    /// A run is in progress and consuming the tick stream.
    Running,
}

impl TimerState {
    /// Returns the string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerState::NotRunning => "not_running",
            TimerState::Paused => "paused",
            TimerState::Running => "running",
        }
    }
}

impl Default for TimerState {
    fn default() -> Self {
        TimerState::NotRunning
    }
}

/// Tags why a run ended: explicit cancellation vs. natural exhaustion of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopCause {
    /// The run was cancelled by an explicit `stop()` (or engine teardown).
    Stopped,
    /// The run reached zero remaining time on its own.
    Completed,
}
