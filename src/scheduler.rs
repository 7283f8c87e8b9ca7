//! Recurring background task with an owned handle.
//!
//! The job runs once immediately, then on every interval tick. Runs are
//! serialized: the loop awaits the current run before taking the next tick,
//! and ticks missed during a slow run are delayed rather than fired in a
//! burst. A failing or panicking run is logged and the loop keeps going;
//! only [`Scheduler::shutdown`] (or process exit) stops it.

use log::{error, info};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub struct Scheduler {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl Scheduler {
    /// Spawns the recurring task. `job` builds one run's future per tick.
    pub fn spawn<F, Fut, E>(period: Duration, job: F) -> Scheduler
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let (shutdown, mut stop) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = stop.changed() => break,
                    _ = ticker.tick() => {
                        // Spawned so a panic inside the job surfaces as a
                        // JoinError here instead of killing the loop.
                        match tokio::spawn(job()).await {
                            Ok(Ok(())) => {}
                            Ok(Err(e)) => error!("scheduled run failed: {}", e),
                            Err(e) => error!("scheduled run aborted: {}", e),
                        }
                    }
                }
            }
            info!("scheduler stopped");
        });
        Scheduler { handle, shutdown }
    }

    /// Signals the loop to stop and waits for it. A run already in flight
    /// completes first; nothing is cancelled mid-write.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            error!("scheduler task failed to join: {}", e);
        }
    }
}
