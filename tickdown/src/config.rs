//! Defines all configuration structures for the Tickdown engine.
//!
//! These structs are designed to be deserialized from a configuration file
//! (e.g., a TOML file) using `serde`. This allows the countdown length and
//! the tick rate of the driving [`FrameClock`](crate::time::FrameClock) to be
//! defined externally from the application code.

use serde::Deserialize;
use std::time::Duration;

/// The top-level configuration for a Tickdown timer.
///
/// Typically loaded from a TOML file at application startup; every field has
/// a default so a partial (or absent) file is fine.
#[derive(Debug, Clone, Deserialize)]
pub struct TimerConfig {
    /// The countdown length in seconds. Must be strictly positive.
    #[serde(default = "default_length_seconds")]
    pub length_seconds: f64,

    /// The tick speed of the driving `FrameClock`.
    #[serde(default)]
    pub resolution: ClockResolution,
}

/// Defines the operational speed of the [`FrameClock`](crate::time::FrameClock).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockResolution {
    /// ~60 ticks per second. Suitable for frame-locked applications.
    High,
    /// ~30 ticks per second. Suitable for general purpose timers.
    Medium,
    /// ~1 tick per second. Suitable for coarse, strategic countdowns.
    Low,
    /// A user-defined speed in ticks per second.
    Custom { ticks_per_second: u64 },
}

impl ClockResolution {
    /// The period between ticks at this resolution.
    ///
    /// A `Custom { ticks_per_second: 0 }` value is clamped to one tick per
    /// second rather than dividing by zero.
    pub fn period(&self) -> Duration {
        match self {
            ClockResolution::High => Duration::from_micros(16_667),
            ClockResolution::Medium => Duration::from_micros(33_333),
            ClockResolution::Low => Duration::from_secs(1),
            ClockResolution::Custom { ticks_per_second } => {
                Duration::from_secs_f64(1.0 / (*ticks_per_second).max(1) as f64)
            }
        }
    }
}

impl Default for ClockResolution {
    fn default() -> Self {
        ClockResolution::Medium
    }
}

fn default_length_seconds() -> f64 {
    60.0
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            length_seconds: default_length_seconds(),
            resolution: ClockResolution::default(),
        }
    }
}
