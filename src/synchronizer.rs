//! Keeps stored rates fresh for every ordered pair of the configured currencies.
//!
//! A sweep walks the currencies in configured order and, for each base, the
//! dates from today back `days` days. Every `(base, date)` unit is one source
//! fetch followed by one repository write per returned rate. The first failure
//! ends the sweep; rates written before it stay persisted and a later sweep
//! converges because writes are upserts.

use crate::core::{Currency, RateSource, SyncError};
use crate::repository::CurrencyRepository;
use chrono::{Days, NaiveDate, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// One source fetch of a sweep: `base` quoted against `targets` on `date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepUnit {
    pub base: Currency,
    pub targets: Vec<Currency>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub fetches: usize,
    pub rates_written: usize,
}

pub struct CurrencySynchronizer {
    repository: CurrencyRepository,
    source: Arc<dyn RateSource>,
    currencies: Vec<Currency>,
}

impl CurrencySynchronizer {
    /// Repeated currencies are dropped, keeping the first occurrence.
    pub fn new(
        repository: CurrencyRepository,
        source: Arc<dyn RateSource>,
        currencies: impl IntoIterator<Item = Currency>,
    ) -> Self {
        let mut universe: Vec<Currency> = Vec::new();
        for currency in currencies {
            if !universe.contains(&currency) {
                universe.push(currency);
            }
        }

        Self {
            repository,
            source,
            currencies: universe,
        }
    }

    pub fn currencies(&self) -> &[Currency] {
        &self.currencies
    }

    /// The units of a sweep ending on `today`, in execution order.
    ///
    /// Empty when fewer than two currencies are configured.
    pub fn plan(&self, today: NaiveDate, days: u32) -> impl Iterator<Item = SweepUnit> + '_ {
        let universe = if self.currencies.len() < 2 {
            &self.currencies[..0]
        } else {
            &self.currencies[..]
        };

        universe.iter().flat_map(move |base| {
            let targets: Vec<Currency> = universe.iter().filter(|c| *c != base).cloned().collect();
            (0..=u64::from(days))
                .map_while(move |offset| today.checked_sub_days(Days::new(offset)))
                .map(move |date| SweepUnit {
                    base: base.clone(),
                    targets: targets.clone(),
                    date,
                })
        })
    }

    /// Refreshes today and the previous `days` days, today taken from the
    /// wall clock (UTC) at call time.
    #[instrument(name = "RateSweep", skip(self, cancel))]
    pub async fn update_rates_for_today_and_last_n_days(
        &self,
        days: u32,
        cancel: &CancellationToken,
    ) -> Result<SweepSummary, SyncError> {
        let today = Utc::now().date_naive();
        self.update_rates_ending_on(today, days, cancel).await
    }

    pub async fn update_rates_ending_on(
        &self,
        today: NaiveDate,
        days: u32,
        cancel: &CancellationToken,
    ) -> Result<SweepSummary, SyncError> {
        if self.currencies.len() < 2 {
            warn!(
                currencies = self.currencies.len(),
                "Fewer than two currencies configured, nothing to synchronize"
            );
        }

        let mut summary = SweepSummary::default();
        for unit in self.plan(today, days) {
            if cancel.is_cancelled() {
                warn!(?summary, "Rate sweep cancelled");
                return Err(SyncError::Cancelled);
            }

            let rates = self
                .source
                .get_rates(&unit.base, &unit.targets, unit.date)
                .await
                .map_err(|source| SyncError::SourceFetch {
                    base: unit.base.clone(),
                    date: unit.date,
                    source,
                })?;
            summary.fetches += 1;

            for rate in rates {
                if rate.currency == unit.base {
                    warn!(base = %unit.base, date = %unit.date, "Skipping self-referential rate");
                    continue;
                }

                self.repository
                    .create(unit.date, &unit.base, &rate.currency, rate.rate)
                    .await
                    .map_err(|source| SyncError::Storage {
                        base: unit.base.clone(),
                        currency: rate.currency.clone(),
                        date: unit.date,
                        source,
                    })?;
                summary.rates_written += 1;
            }

            debug!(base = %unit.base, date = %unit.date, "Synchronized rates");
        }

        info!(
            fetches = summary.fetches,
            rates_written = summary.rates_written,
            "Rate sweep finished"
        );
        Ok(summary)
    }
}
