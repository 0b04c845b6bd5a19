use crate::core::{Currency, CurrencyRate, RateStorage, RequestLog, RequestLogStore, StorageError};
use async_trait::async_trait;
use chrono::NaiveDate;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

const RATES_PARTITION: &str = "rates";
const REQUEST_LOGS_PARTITION: &str = "request_logs";

/// fjall-backed persistence for rates and the request log.
///
/// Rates are keyed `"{base}/{date}/{currency}"` so that every rate of a base
/// on one day shares the `"{base}/{date}/"` prefix. Request log keys are the
/// big-endian timestamp in nanoseconds followed by a sequence number, which
/// keeps iteration chronological even for entries within the same nanosecond.
pub struct DiskStore {
    keyspace: Keyspace,
    rates: PartitionHandle,
    request_logs: PartitionHandle,
    sequence: AtomicU64,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(path)?;

        let keyspace = fjall::Config::new(path.join("fjall_db")).open()?;
        let rates = keyspace.open_partition(RATES_PARTITION, PartitionCreateOptions::default())?;
        let request_logs =
            keyspace.open_partition(REQUEST_LOGS_PARTITION, PartitionCreateOptions::default())?;
        debug!("Opened rate store at {}", path.display());

        Ok(Self {
            keyspace,
            rates,
            request_logs,
            sequence: AtomicU64::new(0),
        })
    }

    fn day_prefix(base: &Currency, date: NaiveDate) -> String {
        format!("{base}/{date}/")
    }

    fn rate_key(base: &Currency, currency: &Currency, date: NaiveDate) -> String {
        format!("{}{currency}", Self::day_prefix(base, date))
    }

    fn log_key(&self, entry: &RequestLog) -> Vec<u8> {
        let nanos = entry.timestamp.timestamp_nanos_opt().unwrap_or_default() as u64;
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let mut key = Vec::with_capacity(16);
        key.extend_from_slice(&nanos.to_be_bytes());
        key.extend_from_slice(&sequence.to_be_bytes());
        key
    }
}

/// Runs fjall work, which may fsync, on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T, StorageError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

#[async_trait]
impl RateStorage for DiskStore {
    async fn get(
        &self,
        base: &Currency,
        currency: &Currency,
        date: NaiveDate,
    ) -> Result<CurrencyRate, StorageError> {
        let key = Self::rate_key(base, currency, date);
        let rates = self.rates.clone();
        let lookup_key = key.clone();
        let value = blocking(move || Ok(rates.get(lookup_key.as_bytes())?)).await?;

        match value {
            Some(value) => {
                debug!("Rate HIT for key: {}", key);
                Ok(serde_json::from_slice(&value)?)
            }
            None => {
                debug!("Rate MISS for key: {}", key);
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
        let prefix = Self::day_prefix(base, date);
        let partition = self.rates.clone();
        let scan_prefix = prefix.clone();
        let rates: Vec<CurrencyRate> = blocking(move || {
            let mut rates = Vec::new();
            for item in partition.prefix(scan_prefix.as_bytes()) {
                let (_, value) = item?;
                rates.push(serde_json::from_slice(&value)?);
            }
            Ok(rates)
        })
        .await?;
        debug!("Found {} rates for prefix: {}", rates.len(), prefix);
        Ok(rates)
    }

    async fn set(&self, rate: &CurrencyRate) -> Result<(), StorageError> {
        let key = Self::rate_key(&rate.base, &rate.currency, rate.date);
        let value = serde_json::to_vec(rate)?;
        let keyspace = self.keyspace.clone();
        let rates = self.rates.clone();
        let write_key = key.clone();
        blocking(move || {
            rates.insert(write_key.as_bytes(), value)?;
            keyspace.persist(PersistMode::SyncData)?;
            Ok(())
        })
        .await?;
        debug!("Rate PUT for key: {}", key);
        Ok(())
    }
}

#[async_trait]
impl RequestLogStore for DiskStore {
    async fn append(&self, entry: &RequestLog) -> Result<(), StorageError> {
        let key = self.log_key(entry);
        let value = serde_json::to_vec(entry)?;
        let request_logs = self.request_logs.clone();
        blocking(move || Ok(request_logs.insert(key, value)?)).await
    }

    async fn list(&self) -> Result<Vec<RequestLog>, StorageError> {
        let request_logs = self.request_logs.clone();
        blocking(move || {
            let mut entries = Vec::new();
            for item in request_logs.iter() {
                let (_, value) = item?;
                entries.push(serde_json::from_slice(&value)?);
            }
            Ok(entries)
        })
        .await
    }
}
