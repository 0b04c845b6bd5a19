use crate::core::SyncError;
use crate::core::config::ScheduleConfig;
use crate::synchronizer::CurrencySynchronizer;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Runs a sweep of `days` look-back every `schedule.interval_secs` until `cancel` fires.
pub fn start_sync_scheduler(
    synchronizer: Arc<CurrencySynchronizer>,
    days: u32,
    schedule: &ScheduleConfig,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let period = schedule.interval();
    let start = if schedule.run_on_start {
        Instant::now()
    } else {
        Instant::now() + period
    };

    tokio::spawn(async move {
        info!(interval_secs = period.as_secs(), days, "Rate sync scheduler started");
        let mut interval = tokio::time::interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => run_scheduled_sync(&synchronizer, days, &cancel).await,
            }
        }
        info!("Rate sync scheduler stopped");
    })
}

async fn run_scheduled_sync(
    synchronizer: &CurrencySynchronizer,
    days: u32,
    cancel: &CancellationToken,
) {
    match synchronizer
        .update_rates_for_today_and_last_n_days(days, cancel)
        .await
    {
        Ok(summary) => info!(
            fetches = summary.fetches,
            rates_written = summary.rates_written,
            "Scheduled rate sync succeeded"
        ),
        Err(SyncError::Cancelled) => warn!("Scheduled rate sync interrupted by shutdown"),
        Err(e) => error!(error = %e, "Scheduled rate sync failed"),
    }
}
