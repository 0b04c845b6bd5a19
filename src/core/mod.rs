//! Core business logic abstractions

pub mod config;
pub mod currency;
pub mod error;
pub mod log;
pub mod storage;

// Re-export main types for cleaner imports
pub use currency::{Currency, CurrencyRate, RateSource};
pub use error::{RepositoryError, SourceError, StorageError, SyncError};
pub use storage::{RateStorage, RequestLog, RequestLogStore};
