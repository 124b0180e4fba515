//! Periodic task scheduler
//!
//! Spawns named loops that tick at a fixed period and stop when the
//! shutdown signal flips. A failing tick is logged and the loop keeps
//! going; one sweep's error never kills the schedule.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Spawn a loop that runs `tick` every `period` until `shutdown` becomes true.
///
/// The first tick fires after one full period, not immediately; callers that
/// need an eager first pass run it themselves before spawning.
pub fn spawn_periodic<F, Fut, E>(
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send,
    E: std::fmt::Display + Send,
{
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(period);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // interval() fires instantly the first time; consume that tick
        timer.tick().await;

        info!("{} task started (period {:?})", name, period);
        loop {
            tokio::select! {
                _ = timer.tick() => {
                    if let Err(e) = tick().await {
                        error!("{} tick failed: {}", name, e);
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        debug!("{} task stopping", name);
                        break;
                    }
                }
            }
        }
    })
}
