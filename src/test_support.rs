//! Hand-written doubles for the rate source and storage seams.

use crate::core::{
    Currency, CurrencyRate, RateSource, RateStorage, SourceError, StorageError,
};
use crate::store::memory::MemoryRateStorage;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub type SourceCall = (Currency, Vec<Currency>, NaiveDate);

/// Quotes the same table for every date and records each request.
#[derive(Default)]
pub struct MockRateSource {
    quotes: HashMap<Currency, HashMap<Currency, f64>>,
    failing_base: Option<Currency>,
    calls: Mutex<Vec<SourceCall>>,
}

impl MockRateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(mut self, base: &str, target: &str, rate: f64) -> Self {
        self.quotes
            .entry(Currency::new(base))
            .or_default()
            .insert(Currency::new(target), rate);
        self
    }

    pub fn failing_for(mut self, base: &str) -> Self {
        self.failing_base = Some(Currency::new(base));
        self
    }

    pub fn calls(&self) -> Vec<SourceCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RateSource for MockRateSource {
    async fn get_rates(
        &self,
        base: &Currency,
        targets: &[Currency],
        date: NaiveDate,
    ) -> Result<Vec<CurrencyRate>, SourceError> {
        self.calls
            .lock()
            .unwrap()
            .push((base.clone(), targets.to_vec(), date));

        if self.failing_base.as_ref() == Some(base) {
            return Err(SourceError::Status {
                base: base.clone(),
                status: 502,
                body: "bad upstream".to_string(),
            });
        }

        let table = self
            .quotes
            .get(base)
            .ok_or_else(|| SourceError::MissingBase { base: base.clone() })?;
        targets
            .iter()
            .map(|target| {
                table
                    .get(target)
                    .map(|rate| CurrencyRate::new(date, base.clone(), target.clone(), *rate))
                    .ok_or_else(|| SourceError::MissingTarget {
                        base: base.clone(),
                        target: target.clone(),
                    })
            })
            .collect()
    }
}

/// Storage whose every operation fails; counts the calls it received.
#[derive(Default)]
pub struct FailingStorage {
    calls: AtomicUsize,
}

impl FailingStorage {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail(&self) -> StorageError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        StorageError::Io(std::io::Error::other("db error"))
    }
}

#[async_trait]
impl RateStorage for FailingStorage {
    async fn get(
        &self,
        _base: &Currency,
        _currency: &Currency,
        _date: NaiveDate,
    ) -> Result<CurrencyRate, StorageError> {
        Err(self.fail())
    }

    async fn get_many(
        &self,
        _base: &Currency,
        _date: NaiveDate,
    ) -> Result<Vec<CurrencyRate>, StorageError> {
        Err(self.fail())
    }

    async fn set(&self, _rate: &CurrencyRate) -> Result<(), StorageError> {
        Err(self.fail())
    }
}

/// Memory storage that starts rejecting writes after `writes_allowed` successes.
pub struct FlakyStorage {
    pub inner: MemoryRateStorage,
    writes_allowed: usize,
    writes: AtomicUsize,
}

impl FlakyStorage {
    pub fn new(writes_allowed: usize) -> Self {
        Self {
            inner: MemoryRateStorage::new(),
            writes_allowed,
            writes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RateStorage for FlakyStorage {
    async fn get(
        &self,
        base: &Currency,
        currency: &Currency,
        date: NaiveDate,
    ) -> Result<CurrencyRate, StorageError> {
        self.inner.get(base, currency, date).await
    }

    async fn get_many(
        &self,
        base: &Currency,
        date: NaiveDate,
    ) -> Result<Vec<CurrencyRate>, StorageError> {
        self.inner.get_many(base, date).await
    }

    async fn set(&self, rate: &CurrencyRate) -> Result<(), StorageError> {
        if self.writes.fetch_add(1, Ordering::SeqCst) >= self.writes_allowed {
            return Err(StorageError::Io(std::io::Error::other("disk full")));
        }
        self.inner.set(rate).await
    }
}
