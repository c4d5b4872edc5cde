use anyhow::Result;
use tickdown::prelude::*;
use tokio::sync::broadcast;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    info!("{} v{}", tickdown::ENGINE_NAME, tickdown::VERSION);

    // 2. Load the timer configuration, falling back to defaults when no
    //    tickdown.toml is present.
    let timer_config: TimerConfig = config::Config::builder()
        .add_source(config::File::with_name("tickdown").required(false))
        .build()?
        .try_deserialize()?;
    info!(
        length_seconds = timer_config.length_seconds,
        "configuration loaded"
    );

    // 3. Create the clock and the engine wired to its tick stream.
    let clock = FrameClock::new(timer_config.resolution.clone());
    let engine = TimerEngine::from_config(&timer_config, clock.ticks())?;

    // 4. Spawn concurrent tasks to listen to the engine's event streams.
    spawn_event_listeners(&engine);

    // 5. Register a callback listener alongside the broadcast subscribers.
    let _listener_id = engine
        .on_second_reached(|seconds_left| info!("[CALLBACK] => {}s to go", seconds_left))
        .await;

    // 6. Run the clock in the background and the countdown to its end.
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move { clock.run(shutdown_rx).await });

    let cause = engine.run_until_stopped().await?;
    info!("countdown ended: {:?}", cause);

    shutdown_tx.send(()).ok();
    engine.shutdown().await;
    Ok(())
}

/// Spawns several tasks, each subscribing to a different event stream from the engine.
fn spawn_event_listeners(engine: &TimerEngine) {
    let mut started_rx = engine.subscribe_started();
    tokio::spawn(async move {
        while let Ok(event) = started_rx.recv().await {
            info!("[STARTED] => {}s countdown", event.length_seconds);
        }
    });

    let mut second_rx = engine.subscribe_second_reached();
    tokio::spawn(async move {
        while let Ok(event) = second_rx.recv().await {
            info!("[SECOND] => {}s left", event.seconds_left);
        }
    });

    let mut stopped_rx = engine.subscribe_stopped();
    tokio::spawn(async move {
        while let Ok(event) = stopped_rx.recv().await {
            info!("[STOPPED] => cause: {:?}", event.cause);
        }
    });

    let mut completed_rx = engine.subscribe_completed();
    tokio::spawn(async move {
        while let Ok(_event) = completed_rx.recv().await {
            info!("[COMPLETED] => countdown exhausted");
        }
    });
}
