use crate::core::{Currency, CurrencyRate, RateStorage, RepositoryError};
use chrono::NaiveDate;
use std::sync::Arc;

/// Stateless view over [`RateStorage`] that annotates failures with the
/// currencies involved. Every call is a single storage round trip.
#[derive(Clone)]
pub struct CurrencyRepository {
    storage: Arc<dyn RateStorage>,
}

impl CurrencyRepository {
    pub fn new(storage: Arc<dyn RateStorage>) -> Self {
        Self { storage }
    }

    pub async fn get(
        &self,
        base: &Currency,
        currency: &Currency,
        date: NaiveDate,
    ) -> Result<CurrencyRate, RepositoryError> {
        self.storage
            .get(base, currency, date)
            .await
            .map_err(|source| RepositoryError::NotFoundOrStorage {
                base: base.clone(),
                source,
            })
    }

    pub async fn get_many(
        &self,
        base: &Currency,
        date: NaiveDate,
    ) -> Result<Vec<CurrencyRate>, RepositoryError> {
        self.storage
            .get_many(base, date)
            .await
            .map_err(|source| RepositoryError::NotFoundOrStorage {
                base: base.clone(),
                source,
            })
    }

    pub async fn create(
        &self,
        date: NaiveDate,
        base: &Currency,
        currency: &Currency,
        rate: f64,
    ) -> Result<CurrencyRate, RepositoryError> {
        let currency_rate = CurrencyRate::new(date, base.clone(), currency.clone(), rate);

        self.storage.set(&currency_rate).await.map_err(|source| {
            RepositoryError::StorageWrite {
                base: base.clone(),
                currency: currency.clone(),
                source,
            }
        })?;

        Ok(currency_rate)
    }
}
