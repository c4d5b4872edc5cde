//! Defines all public event types broadcast by the Tickdown engine.
//!
//! This module acts as the public API for the engine's event system. Each
//! lifecycle moment has its own strongly-typed payload and its own broadcast
//! stream on [`TimerEngine`](crate::engine::TimerEngine); listeners subscribe
//! to the streams they care about and unsubscribe by dropping the receiver.

use crate::common::StopCause;

/// Fired when a run begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartedEvent {
    /// The configured length of the run that just started, in seconds.
    pub length_seconds: f64,
}

/// Fired when a running timer is paused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PausedEvent {
    /// The remaining time frozen by the pause, in seconds.
    pub time_left_seconds: f64,
}

/// Fired when a paused timer resumes consuming ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResumedEvent {
    /// The remaining time at the moment of resumption, in seconds.
    pub time_left_seconds: f64,
}

/// Fired whenever a run ends, for any reason.
///
/// This is the stream [`run_until_stopped`](crate::engine::TimerEngine::run_until_stopped)
/// awaits; the cause distinguishes cancellation from natural completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoppedEvent {
    /// Why the run ended.
    pub cause: StopCause,
}

/// Fired after `StoppedEvent` when a run exhausts its time naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedEvent;

/// Fired when the configured length changes via `set_length`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthChangedEvent {
    /// The newly configured length in seconds.
    pub new_length_seconds: f64,
    /// The length that was previously configured, in seconds.
    pub old_length_seconds: f64,
}

/// Fired at most once per whole integer second of remaining time,
/// in strictly decreasing order within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecondReachedEvent {
    /// The whole-second boundary just crossed (ceiling of the remaining time).
    pub seconds_left: u64,
}
