//! The tick capability: the clock-facing half of the engine.
//!
//! A [`TickSource`] is a clonable handle onto a broadcast stream of
//! [`TickEvent`]s. The engine subscribes to it only while a run is active;
//! anything can drive it. [`FrameClock`] is the batteries-included driver: a
//! tokio interval loop that measures the real elapsed time between beats and
//! broadcasts it. Hosts with their own frame loop (games, UIs, tests) can
//! instead create a manual source and call [`TickSource::emit`] themselves.

use crate::config::ClockResolution;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

const TICK_CHANNEL_CAPACITY: usize = 256;

/// A single beat of the clock.
#[derive(Debug, Clone)]
pub struct TickEvent {
    /// Monotonically increasing tick counter, starting at 1.
    pub tick_count: u64,
    /// Seconds elapsed since the previous tick was emitted.
    pub delta_seconds: f64,
    /// The instant this tick was emitted.
    pub timestamp: Instant,
}

/// A clonable handle to a stream of [`TickEvent`]s.
///
/// Exactly one subscription per [`TimerEngine`](crate::engine::TimerEngine)
/// instance is active at a time, and only while that engine is Running.
#[derive(Clone)]
pub struct TickSource {
    sender: broadcast::Sender<Arc<TickEvent>>,
    counter: Arc<std::sync::atomic::AtomicU64>,
}

impl TickSource {
    /// Creates a free-standing source with no driver attached.
    ///
    /// The holder is responsible for calling [`emit`](Self::emit); nothing
    /// ticks on its own. This is the entry point for hosts that already have
    /// a frame loop of their own.
    pub fn manual() -> Self {
        let (sender, _) = broadcast::channel(TICK_CHANNEL_CAPACITY);
        Self {
            sender,
            counter: Arc::new(std::sync::atomic::AtomicU64::new(0)),
        }
    }

    /// Subscribes to the tick stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<TickEvent>> {
        self.sender.subscribe()
    }

    /// Broadcasts one tick carrying the given elapsed delta.
    ///
    /// Lost sends (no live subscribers) are fine: ticks are a heartbeat, not
    /// a queue, and a timer that is not Running is not listening.
    pub fn emit(&self, delta_seconds: f64) {
        let tick_count = self
            .counter
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            + 1;
        trace!(tick_count, delta_seconds, "tick emitted");
        self.sender
            .send(Arc::new(TickEvent {
                tick_count,
                delta_seconds,
                timestamp: Instant::now(),
            }))
            .ok();
    }
}

/// A periodic driver that beats a [`TickSource`] at a configured resolution.
///
/// The reported `delta_seconds` is the *measured* wall time since the
/// previous beat, not the nominal period, so subscribers stay honest when the
/// runtime lags.
pub struct FrameClock {
    resolution: ClockResolution,
    ticks: TickSource,
}

impl FrameClock {
    /// Creates a clock (and its tick stream) at the given resolution.
    pub fn new(resolution: ClockResolution) -> Self {
        Self {
            resolution,
            ticks: TickSource::manual(),
        }
    }

    /// The tick stream this clock drives. Cheap to clone and hand out.
    pub fn ticks(&self) -> TickSource {
        self.ticks.clone()
    }

    /// Runs the clock loop until a shutdown signal is received.
    ///
    /// Meant to be spawned as its own tokio task; the paired shutdown sender
    /// ends it cleanly.
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        let period = self.resolution.period();
        info!(?period, "FrameClock starting");

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick fires immediately; swallow it so the first
        // emitted delta covers a full period.
        ticker.tick().await;

        let mut last = Instant::now();
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                beat = ticker.tick() => {
                    let delta = beat.duration_since(last).as_secs_f64();
                    last = beat;
                    self.ticks.emit(delta);
                }
            }
        }
        debug!("FrameClock shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn manual_source_delivers_to_subscriber() {
        let ticks = TickSource::manual();
        let mut rx = ticks.subscribe();

        ticks.emit(0.5);
        ticks.emit(0.25);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.tick_count, 1);
        assert_eq!(first.delta_seconds, 0.5);

        let second = rx.recv().await.unwrap();
        assert_eq!(second.tick_count, 2);
        assert_eq!(second.delta_seconds, 0.25);
    }

    #[tokio::test]
    async fn emit_without_subscribers_is_silent() {
        let ticks = TickSource::manual();
        // No subscriber; must not panic or error.
        ticks.emit(1.0);

        // A later subscriber only sees ticks from after it subscribed.
        let mut rx = ticks.subscribe();
        ticks.emit(2.0);
        let tick = rx.recv().await.unwrap();
        assert_eq!(tick.delta_seconds, 2.0);
        assert_eq!(tick.tick_count, 2);
    }

    #[tokio::test]
    async fn frame_clock_emits_measured_deltas() {
        let clock = FrameClock::new(ClockResolution::Custom { ticks_per_second: 50 });
        let mut rx = clock.ticks().subscribe();

        let (shutdown_tx, _) = broadcast::channel(1);
        let shutdown_rx = shutdown_tx.subscribe();
        let handle = tokio::spawn(async move { clock.run(shutdown_rx).await });

        let mut received = 0;
        let collected = timeout(Duration::from_secs(2), async {
            while received < 5 {
                let tick = rx.recv().await.unwrap();
                assert!(tick.delta_seconds > 0.0);
                received += 1;
            }
        })
        .await;

        shutdown_tx.send(()).ok();
        let _ = handle.await;

        assert!(collected.is_ok(), "expected 5 ticks within 2 seconds");
    }
}
