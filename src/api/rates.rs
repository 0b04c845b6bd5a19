use super::AppState;
use super::error::{ApiError, ApiResult};
use crate::core::{Currency, CurrencyRate};
use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct LatestQuery {
    base: Option<String>,
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoricalQuery {
    base: Option<String>,
    date: Option<String>,
}

fn required_currency(value: Option<String>, name: &str) -> ApiResult<Currency> {
    match value.map(Currency::new) {
        Some(currency) if !currency.is_empty() => Ok(currency),
        _ => Err(ApiError::BadRequest(format!(
            "missing `{name}` query parameter"
        ))),
    }
}

fn is_iso_date_shape(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Strict `YYYY-MM-DD`. chrono alone also accepts signs, spaces and unpadded fields.
fn parse_date(raw: &str) -> ApiResult<NaiveDate> {
    let invalid = || ApiError::BadRequest("invalid date format, expected YYYY-MM-DD".to_string());
    if !is_iso_date_shape(raw) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())
}

async fn get_latest_rate(
    State(state): State<AppState>,
    Query(query): Query<LatestQuery>,
) -> ApiResult<Json<CurrencyRate>> {
    let base = required_currency(query.base, "base")?;
    let currency = required_currency(query.currency, "currency")?;
    let today = Utc::now().date_naive();

    let rate = state.repository.get(&base, &currency, today).await?;
    Ok(Json(rate))
}

async fn get_historical_rates(
    State(state): State<AppState>,
    Query(query): Query<HistoricalQuery>,
) -> ApiResult<Json<Vec<CurrencyRate>>> {
    let base = required_currency(query.base, "base")?;
    let date = match query.date.as_deref() {
        Some(raw) if !raw.is_empty() => parse_date(raw)?,
        _ => {
            return Err(ApiError::BadRequest(
                "missing `date` query parameter".to_string(),
            ));
        }
    };

    let rates = state.repository.get_many(&base, date).await?;
    Ok(Json(rates))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rates/latest", get(get_latest_rate))
        .route("/rates/historical", get(get_historical_rates))
}
