use super::{build_synchronizer, ui};
use crate::core::config::AppConfig;
use crate::store::Stores;
use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Runs a single sweep now, `days` defaulting to the configured look-back.
pub async fn run(config: &AppConfig, days: Option<u32>) -> Result<()> {
    let stores = Stores::open(config)?;
    let synchronizer = build_synchronizer(config, &stores)?;
    let days = days.unwrap_or(config.days_look_back);

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping after the current fetch");
                cancel.cancel();
            }
        })
    };

    let spinner = ui::new_spinner(&format!(
        "Synchronizing {} currencies for today and {} previous day(s)",
        synchronizer.currencies().len(),
        days
    ));
    let result = synchronizer
        .update_rates_for_today_and_last_n_days(days, &cancel)
        .await;
    spinner.finish_and_clear();
    interrupt.abort();

    let summary = result.context("Rate sync failed")?;
    println!(
        "{} {} fetches, {} rates written",
        ui::style_text("Sync complete:", ui::StyleType::Success),
        summary.fetches,
        summary.rates_written
    );
    Ok(())
}
