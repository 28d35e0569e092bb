// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinHandle;

use crate::ingest::types::MatchSource;
use crate::store::MatchStore;

#[derive(Clone, Copy, Debug)]
pub struct SyncSchedulerCfg {
    pub interval_secs: u64,
}

/// Spawn a background task that runs `sync_once` on every tick.
///
/// The first tick fires immediately. Failures are logged and the loop keeps
/// going; an upstream rate limit simply waits for the next tick.
pub fn spawn_sync_scheduler(
    cfg: SyncSchedulerCfg,
    source: Arc<dyn MatchSource>,
    store: Arc<MatchStore>,
) -> JoinHandle<()> {
    super::ensure_metrics_described();
    tokio::spawn(async move {
        let period = Duration::from_secs(cfg.interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            counter!("ingest_runs_total").increment(1);

            match crate::ingest::sync_once(source.as_ref(), &store).await {
                Ok(report) => tracing::info!(
                    target: "ingest",
                    created = report.created,
                    duplicates = report.duplicates,
                    "scheduled sync tick"
                ),
                Err(e) => tracing::warn!(target: "ingest", error = %e, "scheduled sync failed"),
            }
        }
    })
}
