use super::AppState;
use super::error::ApiError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::warn;

/// Rejects requests whose `Authorization` header is not exactly the configured key.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == state.api_key.as_ref());

    if !authorized {
        warn!(path = %request.uri().path(), "Rejected request with missing or wrong API key");
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(request).await)
}

/// Enqueues the request path once the handler has produced a response,
/// whatever its status.
pub async fn log_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let response = next.run(request).await;
    state.request_log.enqueue(path);
    response
}
