use crate::core::{Currency, CurrencyRate, RateStorage, RequestLog, RequestLogStore, StorageError};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

type RateKey = (Currency, NaiveDate, Currency);

/// In-memory rate storage keyed by `(base, date, currency)`.
#[derive(Clone, Default)]
pub struct MemoryRateStorage {
    inner: Arc<Mutex<BTreeMap<RateKey, f64>>>,
}

impl MemoryRateStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[async_trait]
impl RateStorage for MemoryRateStorage {
    async fn get(
        &self,
        base: &Currency,
        currency: &Currency,
        date: NaiveDate,
    ) -> Result<CurrencyRate, StorageError> {
        let rates = self.inner.lock().await;
        let key = (base.clone(), date, currency.clone());
        match rates.get(&key) {
            Some(rate) => {
                debug!(%base, %currency, %date, "Rate HIT");
                Ok(CurrencyRate::new(date, base.clone(), currency.clone(), *rate))
            }
            None => {
                debug!(%base, %currency, %date, "Rate MISS");
                Err(StorageError::NotFound {
                    base: base.clone(),
                    currency: currency.clone(),
                    date,
                })
            }
        }
    }

    async fn get_many(
        &self,
        base: &Currency,
        date: NaiveDate,
    ) -> Result<Vec<CurrencyRate>, StorageError> {
        let rates = self.inner.lock().await;
        Ok(rates
            .iter()
            .filter(|((b, d, _), _)| b == base && *d == date)
            .map(|((b, d, c), rate)| CurrencyRate::new(*d, b.clone(), c.clone(), *rate))
            .collect())
    }

    async fn set(&self, rate: &CurrencyRate) -> Result<(), StorageError> {
        let mut rates = self.inner.lock().await;
        let key = (rate.base.clone(), rate.date, rate.currency.clone());
        debug!(base = %rate.base, currency = %rate.currency, date = %rate.date, "Rate PUT");
        rates.insert(key, rate.rate);
        Ok(())
    }
}

/// In-memory append-only request log.
#[derive(Clone, Default)]
pub struct MemoryRequestLogStore {
    inner: Arc<Mutex<Vec<RequestLog>>>,
}

impl MemoryRequestLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RequestLogStore for MemoryRequestLogStore {
    async fn append(&self, entry: &RequestLog) -> Result<(), StorageError> {
        self.inner.lock().await.push(entry.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<RequestLog>, StorageError> {
        Ok(self.inner.lock().await.clone())
    }
}
