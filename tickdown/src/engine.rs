//! The core timer engine: state machine, tick accumulation, event emission.
//!
//! [`TimerEngine`] is a handle; it is designed to be cloned and shared across
//! tasks. One clone can sit in [`run_until_stopped`](TimerEngine::run_until_stopped)
//! while another pauses, resumes, or cancels the run.

use crate::common::{ListenerId, StopCause, TimerState};
use crate::error::TimerError;
use crate::events::{
    CompletedEvent, LengthChangedEvent, PausedEvent, ResumedEvent, SecondReachedEvent,
    StartedEvent, StoppedEvent,
};
use crate::time::TickSource;
use chrono::{DateTime, Utc};
use slotmap::SlotMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A callback invoked with each whole-second boundary as it is crossed.
pub type SecondCallback = Box<dyn FnMut(u64) + Send + Sync>;

/// A callback invoked when a run exhausts its time naturally.
pub type CompletedCallback = Box<dyn FnMut() + Send + Sync>;

/// The mutable heart of a timer. Lives behind the engine's lock.
struct TimerCore {
    /// Configured duration in seconds. Always strictly positive.
    length_seconds: f64,
    /// Remaining seconds in the current run. Meaningful while Paused or
    /// Running; may transiently go below zero inside a tick, which is what
    /// triggers completion.
    time_left_seconds: f64,
    state: TimerState,
    /// The last whole-second boundary already announced this run.
    last_emitted_second: Option<u64>,
    /// The tick subscription. `Some` exactly while Running.
    tick_task: Option<JoinHandle<()>>,
}

impl TimerCore {
    /// Ends the current run and hands back the tick subscription, if any.
    ///
    /// The caller decides whether to abort the returned task or merely drop
    /// it: completion happens *inside* the tick task, which must not abort
    /// itself before its event emission finishes.
    fn clear_run(&mut self) -> Option<JoinHandle<()>> {
        self.time_left_seconds = 0.0;
        self.last_emitted_second = None;
        self.state = TimerState::NotRunning;
        self.tick_task.take()
    }
}

impl Drop for TimerCore {
    fn drop(&mut self) {
        // No tick subscription may outlive the timer, whatever state it was
        // torn down in.
        if let Some(task) = self.tick_task.take() {
            task.abort();
        }
    }
}

/// An interruptible countdown timer driven by an external tick stream.
///
/// The engine subscribes to its [`TickSource`] only while Running. On each
/// tick it subtracts the elapsed delta from the remaining time, announces
/// whole-second boundaries exactly once each, and fires `stopped`/`completed`
/// when the time runs out. See the crate docs for a full example.
#[derive(Clone)]
pub struct TimerEngine {
    inner: Arc<RwLock<TimerCore>>,
    ticks: TickSource,
    started_sender: broadcast::Sender<StartedEvent>,
    paused_sender: broadcast::Sender<PausedEvent>,
    resumed_sender: broadcast::Sender<ResumedEvent>,
    stopped_sender: broadcast::Sender<StoppedEvent>,
    completed_sender: broadcast::Sender<CompletedEvent>,
    length_changed_sender: broadcast::Sender<LengthChangedEvent>,
    second_reached_sender: broadcast::Sender<SecondReachedEvent>,
    second_listeners: Arc<RwLock<SlotMap<ListenerId, SecondCallback>>>,
    completed_listeners: Arc<RwLock<SlotMap<ListenerId, CompletedCallback>>>,
}

// Core implementation block for construction and the state machine.
impl TimerEngine {
    /// Creates a new timer of `length_seconds`, wired to the given tick
    /// stream but not yet running.
    ///
    /// # Errors
    /// Returns [`TimerError::InvalidLength`] if `length_seconds` is not a
    /// strictly positive, finite number.
    pub fn new(length_seconds: f64, ticks: TickSource) -> Result<Self, TimerError> {
        validate_length(length_seconds)?;

        let (started_sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (paused_sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (resumed_sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (stopped_sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (completed_sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (length_changed_sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (second_reached_sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            inner: Arc::new(RwLock::new(TimerCore {
                length_seconds,
                time_left_seconds: 0.0,
                state: TimerState::NotRunning,
                last_emitted_second: None,
                tick_task: None,
            })),
            ticks,
            started_sender,
            paused_sender,
            resumed_sender,
            stopped_sender,
            completed_sender,
            length_changed_sender,
            second_reached_sender,
            second_listeners: Arc::new(RwLock::new(SlotMap::with_key())),
            completed_listeners: Arc::new(RwLock::new(SlotMap::with_key())),
        })
    }

    /// Creates a timer from a [`TimerConfig`](crate::config::TimerConfig).
    pub fn from_config(
        config: &crate::config::TimerConfig,
        ticks: TickSource,
    ) -> Result<Self, TimerError> {
        Self::new(config.length_seconds, ticks)
    }

    /// Begins a run at the full configured length and fires `started`.
    ///
    /// Legal from NotRunning and from Paused (a paused run is discarded and
    /// restarted from the top).
    ///
    /// # Errors
    /// Returns [`TimerError::InvalidTransition`] if already Running.
    pub async fn start(&self) -> Result<(), TimerError> {
        let mut core = self.inner.write().await;
        if core.state == TimerState::Running {
            return Err(TimerError::InvalidTransition {
                operation: "start",
                state: core.state,
            });
        }

        core.time_left_seconds = core.length_seconds;
        core.last_emitted_second = None;
        core.state = TimerState::Running;
        core.tick_task = Some(self.spawn_tick_task());

        debug!(length_seconds = core.length_seconds, "timer started");
        self.started_sender
            .send(StartedEvent {
                length_seconds: core.length_seconds,
            })
            .ok();
        Ok(())
    }

    /// Suspends tick consumption, freezing the remaining time, and fires
    /// `paused`.
    ///
    /// # Errors
    /// Returns [`TimerError::InvalidTransition`] unless Running.
    pub async fn pause(&self) -> Result<(), TimerError> {
        let task = {
            let mut core = self.inner.write().await;
            if core.state != TimerState::Running {
                return Err(TimerError::InvalidTransition {
                    operation: "pause",
                    state: core.state,
                });
            }
            core.state = TimerState::Paused;
            let task = core.tick_task.take();
            debug!(time_left_seconds = core.time_left_seconds, "timer paused");
            self.paused_sender
                .send(PausedEvent {
                    time_left_seconds: core.time_left_seconds,
                })
                .ok();
            task
        };
        if let Some(task) = task {
            task.abort();
        }
        Ok(())
    }

    /// Resumes a paused run where it left off and fires `resumed`.
    ///
    /// # Errors
    /// Returns [`TimerError::InvalidTransition`] unless Paused.
    pub async fn resume(&self) -> Result<(), TimerError> {
        let mut core = self.inner.write().await;
        if core.state != TimerState::Paused {
            return Err(TimerError::InvalidTransition {
                operation: "resume",
                state: core.state,
            });
        }
        core.state = TimerState::Running;
        core.tick_task = Some(self.spawn_tick_task());

        debug!(time_left_seconds = core.time_left_seconds, "timer resumed");
        self.resumed_sender
            .send(ResumedEvent {
                time_left_seconds: core.time_left_seconds,
            })
            .ok();
        Ok(())
    }

    /// Cancels the current run and fires `stopped` with
    /// [`StopCause::Stopped`].
    ///
    /// # Errors
    /// Returns [`TimerError::InvalidTransition`] if NotRunning.
    pub async fn stop(&self) -> Result<(), TimerError> {
        let task = {
            let mut core = self.inner.write().await;
            if core.state == TimerState::NotRunning {
                return Err(TimerError::InvalidTransition {
                    operation: "stop",
                    state: core.state,
                });
            }
            let task = core.clear_run();
            debug!("timer stopped");
            self.stopped_sender
                .send(StoppedEvent {
                    cause: StopCause::Stopped,
                })
                .ok();
            task
        };
        if let Some(task) = task {
            task.abort();
        }
        Ok(())
    }

    /// Changes the length used by the *next* `start()` and fires
    /// `length_changed`. The remaining time of a run already in progress is
    /// untouched. Setting the current length again is a no-op.
    ///
    /// # Errors
    /// Returns [`TimerError::InvalidLength`] if `length_seconds` is not a
    /// strictly positive, finite number.
    pub async fn set_length(&self, length_seconds: f64) -> Result<(), TimerError> {
        validate_length(length_seconds)?;

        let mut core = self.inner.write().await;
        if core.length_seconds == length_seconds {
            return Ok(());
        }
        let old_length_seconds = core.length_seconds;
        core.length_seconds = length_seconds;

        debug!(
            new_length_seconds = length_seconds,
            old_length_seconds, "timer length changed"
        );
        self.length_changed_sender
            .send(LengthChangedEvent {
                new_length_seconds: length_seconds,
                old_length_seconds,
            })
            .ok();
        Ok(())
    }

    /// Starts the timer and waits until the run ends, returning why.
    ///
    /// This is the one operation that suspends the caller. It resumes exactly
    /// once, on the next `stopped` event for this instance; a `stop()` from
    /// another clone of the engine is the designed way to unblock it early.
    ///
    /// # Errors
    /// Fails under the same condition as [`start`](Self::start).
    pub async fn run_until_stopped(&self) -> Result<StopCause, TimerError> {
        // Subscribe before starting so the stop event cannot be missed.
        let mut stopped_rx = self.stopped_sender.subscribe();
        self.start().await?;

        loop {
            match stopped_rx.recv().await {
                Ok(event) => return Ok(event.cause),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    // `self` holds the sender for as long as we are waiting.
                    unreachable!("stopped stream closed while an engine handle is alive")
                }
            }
        }
    }

    /// Advances the timer by one tick of `delta_seconds` elapsed time.
    ///
    /// This is the entry point the tick subscription drives; hosts that step
    /// time themselves (simulations, tests) may call it directly. Ticks are
    /// ignored unless the timer is Running. Returns `true` if the timer is
    /// still Running afterwards.
    ///
    /// If the delta exhausts the remaining time, only `stopped` (with
    /// [`StopCause::Completed`]) and `completed` fire for that tick; no
    /// trailing second boundary is announced at zero.
    pub async fn process_tick(&self, delta_seconds: f64) -> bool {
        // A tick cannot add time back; non-finite or negative deltas count
        // as zero elapsed.
        let delta_seconds = if delta_seconds.is_finite() && delta_seconds > 0.0 {
            delta_seconds
        } else {
            0.0
        };

        let mut core = self.inner.write().await;
        if core.state != TimerState::Running {
            return false;
        }

        core.time_left_seconds -= delta_seconds;

        if core.time_left_seconds <= 0.0 {
            // Completion takes precedence over second-boundary emission.
            let task = core.clear_run();
            debug!("timer completed");
            self.stopped_sender
                .send(StoppedEvent {
                    cause: StopCause::Completed,
                })
                .ok();
            self.completed_sender.send(CompletedEvent).ok();
            drop(core);

            let mut listeners = self.completed_listeners.write().await;
            for (_, callback) in listeners.iter_mut() {
                callback();
            }
            drop(listeners);

            // The subscription may be the very task executing this tick; the
            // abort lands at the next yield point, and its loop breaks on the
            // `false` return before yielding again. A host-driven completion
            // aborts an idle subscription the same way.
            if let Some(task) = task {
                task.abort();
            }
            return false;
        }

        // time_left is strictly positive here, so the ceiling is at least 1
        // and decreases monotonically across the run.
        let boundary = core.time_left_seconds.ceil() as u64;
        if Some(boundary) != core.last_emitted_second {
            core.last_emitted_second = Some(boundary);
            trace!(seconds_left = boundary, "second boundary reached");
            self.second_reached_sender
                .send(SecondReachedEvent {
                    seconds_left: boundary,
                })
                .ok();
            drop(core);

            let mut listeners = self.second_listeners.write().await;
            for (_, callback) in listeners.iter_mut() {
                callback(boundary);
            }
        }
        true
    }

    /// Tears the engine down: force-stops any in-progress run (firing
    /// `stopped` with [`StopCause::Stopped`]) and releases all registered
    /// callback listeners.
    pub async fn shutdown(&self) {
        if self.stop().await.is_ok() {
            debug!("shutdown force-stopped an active run");
        }
        self.second_listeners.write().await.clear();
        self.completed_listeners.write().await.clear();
    }

    /// Spawns the forwarding task that owns this run's tick subscription.
    fn spawn_tick_task(&self) -> JoinHandle<()> {
        let engine = self.clone();
        let mut tick_rx = self.ticks.subscribe();
        tokio::spawn(async move {
            loop {
                match tick_rx.recv().await {
                    Ok(tick) => {
                        if !engine.process_tick(tick.delta_seconds).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        debug!(missed, "tick subscription lagged; continuing");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

// Public API implementation block: getters, subscriptions, listeners.
impl TimerEngine {
    /// The current lifecycle state.
    pub async fn state(&self) -> TimerState {
        self.inner.read().await.state
    }

    /// The remaining seconds of the current run. Meaningful while Paused as
    /// well as Running; zero once NotRunning.
    pub async fn time_left(&self) -> f64 {
        self.inner.read().await.time_left_seconds
    }

    /// The configured length in seconds, as used by the next `start()`.
    pub async fn length(&self) -> f64 {
        self.inner.read().await.length_seconds
    }

    /// Estimates when the current run will end, as a UTC timestamp with
    /// whole-second resolution (host clock now + remaining time).
    ///
    /// # Errors
    /// Returns [`TimerError::InvalidTransition`] unless Running; a paused
    /// run has no meaningful end time.
    pub async fn current_end_time_utc(&self) -> Result<DateTime<Utc>, TimerError> {
        let core = self.inner.read().await;
        if core.state != TimerState::Running {
            return Err(TimerError::InvalidTransition {
                operation: "estimate end time",
                state: core.state,
            });
        }
        let end_secs = Utc::now()
            .timestamp()
            .saturating_add(core.time_left_seconds as i64);
        Ok(DateTime::<Utc>::from_timestamp(end_secs, 0).unwrap_or(DateTime::<Utc>::MAX_UTC))
    }

    /// Subscribes to the `started` stream.
    pub fn subscribe_started(&self) -> broadcast::Receiver<StartedEvent> {
        self.started_sender.subscribe()
    }

    /// Subscribes to the `paused` stream.
    pub fn subscribe_paused(&self) -> broadcast::Receiver<PausedEvent> {
        self.paused_sender.subscribe()
    }

    /// Subscribes to the `resumed` stream.
    pub fn subscribe_resumed(&self) -> broadcast::Receiver<ResumedEvent> {
        self.resumed_sender.subscribe()
    }

    /// Subscribes to the `stopped` stream. Fires for every run ending,
    /// cancelled or completed.
    pub fn subscribe_stopped(&self) -> broadcast::Receiver<StoppedEvent> {
        self.stopped_sender.subscribe()
    }

    /// Subscribes to the `completed` stream.
    pub fn subscribe_completed(&self) -> broadcast::Receiver<CompletedEvent> {
        self.completed_sender.subscribe()
    }

    /// Subscribes to the `length_changed` stream.
    pub fn subscribe_length_changed(&self) -> broadcast::Receiver<LengthChangedEvent> {
        self.length_changed_sender.subscribe()
    }

    /// Subscribes to the `second_reached` stream.
    pub fn subscribe_second_reached(&self) -> broadcast::Receiver<SecondReachedEvent> {
        self.second_reached_sender.subscribe()
    }

    /// Registers a callback invoked for each whole-second boundary crossed.
    ///
    /// # Returns
    /// A `ListenerId` which can be used to later remove this listener.
    pub async fn on_second_reached(
        &self,
        callback: impl FnMut(u64) + Send + Sync + 'static,
    ) -> ListenerId {
        self.second_listeners.write().await.insert(Box::new(callback))
    }

    /// Registers a callback invoked when a run completes naturally.
    ///
    /// # Returns
    /// A `ListenerId` which can be used to later remove this listener.
    pub async fn on_completed(
        &self,
        callback: impl FnMut() + Send + Sync + 'static,
    ) -> ListenerId {
        self.completed_listeners
            .write()
            .await
            .insert(Box::new(callback))
    }

    /// Removes a second-boundary listener.
    ///
    /// Returns `true` if the listener was found and removed.
    pub async fn remove_second_listener(&self, id: ListenerId) -> bool {
        self.second_listeners.write().await.remove(id).is_some()
    }

    /// Removes a completion listener.
    ///
    /// Returns `true` if the listener was found and removed.
    pub async fn remove_completed_listener(&self, id: ListenerId) -> bool {
        self.completed_listeners.write().await.remove(id).is_some()
    }
}

fn validate_length(length_seconds: f64) -> Result<(), TimerError> {
    if length_seconds.is_finite() && length_seconds > 0.0 {
        Ok(())
    } else {
        Err(TimerError::InvalidLength(length_seconds))
    }
}
