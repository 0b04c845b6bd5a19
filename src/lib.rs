pub mod api;
pub mod cli;
pub mod core;
pub mod providers;
pub mod repository;
pub mod request_log;
pub mod scheduler;
pub mod store;
pub mod synchronizer;

#[cfg(test)]
mod test_support;

use crate::core::config::AppConfig;
use anyhow::Result;
use chrono::NaiveDate;
use tracing::{debug, info};

pub enum AppCommand {
    Serve { in_memory: bool },
    Sync { days: Option<u32> },
    Show { base: String, date: Option<NaiveDate> },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxsync starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        currencies = ?config.currencies,
        days_look_back = config.days_look_back,
        "Loaded config"
    );
    run_with_config(command, &config).await
}

pub async fn run_with_config(command: AppCommand, config: &AppConfig) -> Result<()> {
    match command {
        AppCommand::Serve { in_memory } => cli::serve::run(config, in_memory).await,
        AppCommand::Sync { days } => cli::sync::run(config, days).await,
        AppCommand::Show { base, date } => cli::show::run(config, &base, date).await,
    }
}
