//! Subcommand implementations and terminal helpers.

pub mod serve;
pub mod setup;
pub mod show;
pub mod sync;
pub mod ui;

use crate::core::config::AppConfig;
use crate::providers::jsdelivr::JsDelivrRateSource;
use crate::repository::CurrencyRepository;
use crate::store::Stores;
use crate::synchronizer::CurrencySynchronizer;
use anyhow::{Context, Result};
use std::sync::Arc;

fn build_synchronizer(config: &AppConfig, stores: &Stores) -> Result<CurrencySynchronizer> {
    let jsdelivr = &config.providers.jsdelivr;
    let source = JsDelivrRateSource::new(&jsdelivr.base_url, jsdelivr.timeout())
        .context("Failed to build HTTP client for the rate source")?;

    Ok(CurrencySynchronizer::new(
        CurrencyRepository::new(stores.rates.clone()),
        Arc::new(source),
        config.currencies.clone(),
    ))
}
