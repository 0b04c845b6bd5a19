use crate::core::{Currency, CurrencyRate, RateSource, SourceError};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Daily rates from the `@fawazahmed0/currency-api` package served by jsDelivr.
///
/// A day's rates for a base live at `{base_url}@{YYYY-MM-DD}/v1/currencies/{base}.json`.
pub struct JsDelivrRateSource {
    base_url: String,
    client: reqwest::Client,
}

impl JsDelivrRateSource {
    pub fn new(base_url: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("fxsync/1.0")
            .timeout(timeout)
            .build()?;

        Ok(JsDelivrRateSource {
            base_url: base_url.to_string(),
            client,
        })
    }

    fn url(&self, base: &Currency, date: NaiveDate) -> String {
        format!(
            "{}@{}/v1/currencies/{}.json",
            self.base_url,
            date.format("%Y-%m-%d"),
            base
        )
    }
}

/// `{"date": "2025-01-13", "usd": {"eur": 0.92, ...}}`
#[derive(Debug, Deserialize)]
struct CurrencyApiResponse {
    date: Option<String>,
    #[serde(flatten)]
    tables: HashMap<Currency, HashMap<Currency, f64>>,
}

fn select_rates(
    mut response: CurrencyApiResponse,
    base: &Currency,
    targets: &[Currency],
    date: NaiveDate,
) -> Result<Vec<CurrencyRate>, SourceError> {
    let table = response
        .tables
        .remove(base)
        .ok_or_else(|| SourceError::MissingBase { base: base.clone() })?;

    targets
        .iter()
        .map(|target| {
            let rate = *table.get(target).ok_or_else(|| SourceError::MissingTarget {
                base: base.clone(),
                target: target.clone(),
            })?;
            if !rate.is_finite() || rate <= 0.0 {
                return Err(SourceError::InvalidRate {
                    base: base.clone(),
                    target: target.clone(),
                    rate,
                });
            }
            Ok(CurrencyRate::new(date, base.clone(), target.clone(), rate))
        })
        .collect()
}

#[async_trait]
impl RateSource for JsDelivrRateSource {
    #[instrument(
        name = "JsDelivrRateFetch",
        skip(self, targets),
        fields(base = %base, date = %date, targets = targets.len())
    )]
    async fn get_rates(
        &self,
        base: &Currency,
        targets: &[Currency],
        date: NaiveDate,
    ) -> Result<Vec<CurrencyRate>, SourceError> {
        let url = self.url(base, date);
        debug!("Requesting currency rates from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| SourceError::Request {
                base: base.clone(),
                source,
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|source| SourceError::Request {
            base: base.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(SourceError::Status {
                base: base.clone(),
                status: status.as_u16(),
                body: text,
            });
        }

        let data: CurrencyApiResponse = match serde_json::from_str(&text) {
            Ok(data) => data,
            Err(source) => {
                error!(
                    error = ?source,
                    response = %text,
                    "Failed to parse currency rates response"
                );
                return Err(SourceError::Decode {
                    base: base.clone(),
                    source,
                });
            }
        };

        if let Some(published) = &data.date {
            debug!(published = %published, "Rates API response received");
        }
        select_rates(data, base, targets, date)
    }
}
