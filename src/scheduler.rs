// src/scheduler.rs
use std::time::Duration;

use metrics::{counter, gauge};
use tokio::task::JoinHandle;

use crate::feed::entry::FeedEntry;
use crate::manager::FeedManager;

/// Spawn a polling loop that owns `manager`. Cycles never overlap: the next
/// tick is only awaited after the previous cycle's callbacks have finished.
pub fn spawn_polling<E>(mut manager: FeedManager<E>, interval: Duration) -> JoinHandle<()>
where
    E: AsRef<FeedEntry> + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let status = manager.update().await;

            counter!("quakeml_cycles_total").increment(1);
            gauge!("quakeml_last_cycle_ts").set(status.last_update.timestamp() as f64);

            tracing::debug!(target: "scheduler", %status, "polling tick");
        }
    })
}
