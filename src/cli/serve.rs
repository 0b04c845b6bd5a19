use super::build_synchronizer;
use crate::api::{AppState, app_router};
use crate::core::config::AppConfig;
use crate::repository::CurrencyRepository;
use crate::request_log::{RequestLogSink, spawn_log_worker};
use crate::scheduler::start_sync_scheduler;
use crate::store::Stores;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Serves the read API and keeps rates fresh in the background until Ctrl-C.
pub async fn run(config: &AppConfig, in_memory: bool) -> Result<()> {
    let api_key = config.require_api_key()?;
    let stores = if in_memory {
        info!("Using in-memory storage, rates are lost on exit");
        Stores::in_memory()
    } else {
        Stores::open(config)?
    };

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("Listening on {}", listener.local_addr()?);

    let synchronizer = Arc::new(build_synchronizer(config, &stores)?);

    let cancel = CancellationToken::new();
    let request_log = RequestLogSink::new(config.log_queue_capacity);
    let log_worker = spawn_log_worker(
        request_log.subscribe(),
        stores.request_logs.clone(),
        cancel.clone(),
    );
    let scheduler = start_sync_scheduler(
        synchronizer,
        config.days_look_back,
        &config.schedule,
        cancel.clone(),
    );

    let state = AppState::new(
        CurrencyRepository::new(stores.rates.clone()),
        request_log,
        api_key,
    );

    let served = axum::serve(listener, app_router(state))
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await;

    cancel.cancel();
    for (name, task) in [("scheduler", scheduler), ("request log worker", log_worker)] {
        if let Err(e) = task.await {
            error!(error = %e, "Background {} task failed", name);
        }
    }

    served.context("HTTP server failed")?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => {
                error!(error = %e, "Failed to listen for Ctrl-C, serving until cancelled");
                cancel.cancelled().await;
            }
        },
        _ = cancel.cancelled() => {}
    }
}
