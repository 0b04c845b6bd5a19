pub mod disk;
pub mod memory;

use crate::core::config::AppConfig;
use crate::core::{RateStorage, RequestLogStore};
use anyhow::{Context, Result};
use disk::DiskStore;
use memory::{MemoryRateStorage, MemoryRequestLogStore};
use std::sync::Arc;
use tracing::info;

/// The storage handles shared by the synchronizer, the HTTP layer and the log worker.
#[derive(Clone)]
pub struct Stores {
    pub rates: Arc<dyn RateStorage>,
    pub request_logs: Arc<dyn RequestLogStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            rates: Arc::new(MemoryRateStorage::new()),
            request_logs: Arc::new(MemoryRequestLogStore::new()),
        }
    }

    /// Opens the on-disk store under the configured data path.
    pub fn open(config: &AppConfig) -> Result<Self> {
        let path = config.default_data_path()?.join("store");
        let store = Arc::new(
            DiskStore::open(&path)
                .with_context(|| format!("Failed to open rate store at {}", path.display()))?,
        );
        info!("Using rate store at {}", path.display());

        Ok(Self {
            rates: store.clone(),
            request_logs: store,
        })
    }
}
