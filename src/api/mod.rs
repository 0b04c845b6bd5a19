//! HTTP read API over the stored rates.

pub mod error;
pub mod middleware;
pub mod rates;

use crate::repository::CurrencyRepository;
use crate::request_log::RequestLogSink;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub repository: CurrencyRepository,
    pub request_log: RequestLogSink,
    pub api_key: Arc<str>,
}

impl AppState {
    pub fn new(repository: CurrencyRepository, request_log: RequestLogSink, api_key: &str) -> Self {
        Self {
            repository,
            request_log,
            api_key: Arc::from(api_key),
        }
    }
}

/// Every route is authorized first; authorized requests are logged after the handler runs.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .merge(rates::router())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::log_requests,
        ))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_api_key,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
