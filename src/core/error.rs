//! Error types for the rate source, storage, repository and synchronizer.
//!
//! Each layer wraps the one below it and adds the currency/date context needed
//! to diagnose a failure without re-running the sweep.

use crate::core::currency::Currency;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to get rates for {base} from external API: {source}")]
    Request {
        base: Currency,
        #[source]
        source: reqwest::Error,
    },
    #[error("bad response from rates API for {base}. status: {status}. response: {body}")]
    Status {
        base: Currency,
        status: u16,
        body: String,
    },
    #[error("failed to decode rates API response for {base}: {source}")]
    Decode {
        base: Currency,
        #[source]
        source: serde_json::Error,
    },
    #[error("rates API response has no section for base currency {base}")]
    MissingBase { base: Currency },
    #[error("rates API response for {base} has no quote for {target}")]
    MissingTarget { base: Currency, target: Currency },
    #[error("rates API returned an invalid rate {rate} for {base}-{target}")]
    InvalidRate {
        base: Currency,
        target: Currency,
        rate: f64,
    },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no rate stored for {base}-{currency} on {date}")]
    NotFound {
        base: Currency,
        currency: Currency,
        date: NaiveDate,
    },
    #[error("storage backend error: {0}")]
    Backend(#[from] fjall::Error),
    #[error("failed to encode or decode stored record: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The row is absent or the store failed while reading it.
    #[error("failed to get currency rates for {base}: {source}")]
    NotFoundOrStorage {
        base: Currency,
        #[source]
        source: StorageError,
    },
    #[error("failed to save currency rate {base}-{currency}: {source}")]
    StorageWrite {
        base: Currency,
        currency: Currency,
        #[source]
        source: StorageError,
    },
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RepositoryError::NotFoundOrStorage {
                source: StorageError::NotFound { .. },
                ..
            }
        )
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to get currency rates for {base} for {date}: {source}")]
    SourceFetch {
        base: Currency,
        date: NaiveDate,
        #[source]
        source: SourceError,
    },
    #[error("failed to create currency rate for {base}-{currency} for {date}: {source}")]
    Storage {
        base: Currency,
        currency: Currency,
        date: NaiveDate,
        #[source]
        source: RepositoryError,
    },
    #[error("currency synchronization was cancelled")]
    Cancelled,
}
