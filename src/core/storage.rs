use crate::core::currency::{Currency, CurrencyRate};
use crate::core::error::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Persistence for rate facts keyed by `(date, base, currency)`.
#[async_trait]
pub trait RateStorage: Send + Sync {
    /// Fails with [`StorageError::NotFound`] when no rate exists for the key.
    async fn get(
        &self,
        base: &Currency,
        currency: &Currency,
        date: NaiveDate,
    ) -> Result<CurrencyRate, StorageError>;

    /// All rates recorded for `base` on `date`; empty when none exist.
    async fn get_many(
        &self,
        base: &Currency,
        date: NaiveDate,
    ) -> Result<Vec<CurrencyRate>, StorageError>;

    /// Upsert: a second write for the same key replaces the stored rate.
    async fn set(&self, rate: &CurrencyRate) -> Result<(), StorageError>;
}

/// A served request, as recorded by the request log pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestLog {
    pub timestamp: DateTime<Utc>,
    pub path: String,
}

/// Append-only log of served requests.
#[async_trait]
pub trait RequestLogStore: Send + Sync {
    async fn append(&self, entry: &RequestLog) -> Result<(), StorageError>;

    /// Entries in the order they were appended.
    async fn list(&self) -> Result<Vec<RequestLog>, StorageError>;
}
