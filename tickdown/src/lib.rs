//! # Tickdown
//!
//! An event-driven, interruptible countdown timer engine for Rust.
//!
//! Tickdown provides a single component, the [`TimerEngine`](engine::TimerEngine):
//! a unit of time that can be started, paused, resumed, and stopped, emitting
//! strongly-typed events as it progresses and upon completion. It is driven
//! by an external tick stream and owns no clock of its own.
//!
//! ## Core Concepts
//!
//! - **TickSource**: the injectable tick capability. The engine subscribes to
//!   it only while Running, so several independent timers can share one
//!   source, or each bring their own.
//! - **FrameClock**: the batteries-included periodic driver that beats a
//!   `TickSource` at a configured [`ClockResolution`](config::ClockResolution),
//!   reporting the measured elapsed delta per tick.
//! - **Event-Driven**: every lifecycle moment (`started`, `paused`,
//!   `resumed`, `stopped`, `completed`, `length_changed`, `second_reached`)
//!   has its own broadcast stream. Subscribe to the ones you care about;
//!   unsubscribe by dropping the receiver.
//! - **Whole-second boundaries**: while counting down, the engine announces
//!   each integer second of remaining time exactly once, in strictly
//!   decreasing order — the hook for rendering `3… 2… 1…` displays.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use tickdown::prelude::*;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 1. A clock to drive time, and a ten-second timer wired to it.
//!     let clock = FrameClock::new(ClockResolution::Medium);
//!     let engine = TimerEngine::new(10.0, clock.ticks())?;
//!
//!     // 2. Subscribe to an event stream before starting the timer.
//!     let mut seconds = engine.subscribe_second_reached();
//!     tokio::spawn(async move {
//!         while let Ok(event) = seconds.recv().await {
//!             println!("{}s left", event.seconds_left);
//!         }
//!     });
//!
//!     // 3. Run the clock in the background.
//!     let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!     tokio::spawn(async move { clock.run(shutdown_rx).await });
//!
//!     // 4. Start the countdown and wait for it to end.
//!     let cause = engine.run_until_stopped().await?;
//!     println!("timer ended: {:?}", cause);
//!
//!     shutdown_tx.send(()).ok();
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Tickdown Engine";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Declare all the modules in the crate.
pub mod common;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod time;

/// A prelude module for easy importing of the most common Tickdown types.
pub mod prelude {
    pub use crate::common::{ListenerId, StopCause, TimerState};
    pub use crate::config::{ClockResolution, TimerConfig};
    pub use crate::engine::TimerEngine;
    pub use crate::error::TimerError;
    pub use crate::events::{
        CompletedEvent, LengthChangedEvent, PausedEvent, ResumedEvent, SecondReachedEvent,
        StartedEvent, StoppedEvent,
    };
    pub use crate::time::{FrameClock, TickEvent, TickSource};
}
