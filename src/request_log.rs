//! Records served requests without putting the store on the request path.
//!
//! Handlers enqueue into a bounded broadcast channel and a single worker task
//! drains it into a [`RequestLogStore`]. When the queue is full the oldest
//! entries are overwritten, so enqueueing never blocks a request.

use crate::core::{RequestLog, RequestLogStore};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct RequestLogSink {
    sender: broadcast::Sender<RequestLog>,
}

impl RequestLogSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RequestLog> {
        self.sender.subscribe()
    }

    pub fn enqueue(&self, path: impl Into<String>) {
        let entry = RequestLog {
            timestamp: Utc::now(),
            path: path.into(),
        };
        if let Err(broadcast::error::SendError(entry)) = self.sender.send(entry) {
            debug!(path = %entry.path, "No request log worker attached, entry dropped");
        }
    }
}

async fn write_entry(store: &dyn RequestLogStore, entry: &RequestLog) {
    if let Err(e) = store.append(entry).await {
        error!(error = %e, path = %entry.path, "Failed to write request log entry");
    }
}

/// Spawns the task that persists queued entries until `cancel` fires.
///
/// Entries already queued at cancellation are still written before the task exits.
pub fn spawn_log_worker(
    mut receiver: broadcast::Receiver<RequestLog>,
    store: Arc<dyn RequestLogStore>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Request log worker started");
        loop {
            tokio::select! {
                biased;
                received = receiver.recv() => match received {
                    Ok(entry) => write_entry(store.as_ref(), &entry).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Request log queue overflowed, oldest entries dropped");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = cancel.cancelled() => {
                    loop {
                        match receiver.try_recv() {
                            Ok(entry) => write_entry(store.as_ref(), &entry).await,
                            Err(TryRecvError::Lagged(skipped)) => {
                                warn!(skipped, "Request log queue overflowed, oldest entries dropped");
                            }
                            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                        }
                    }
                    break;
                }
            }
        }
        info!("Request log worker stopped");
    })
}
