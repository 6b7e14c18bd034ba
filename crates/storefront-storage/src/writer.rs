//! # Write-Behind Storage
//!
//! Synchronous [`StorageBackend`] in front of the async [`SqliteStorage`].
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Write-Behind Pipeline                              │
//! │                                                                         │
//! │  CartState::persist()                                                  │
//! │       │ set("cart", json)          (sync, never blocks on disk)        │
//! │       ▼                                                                 │
//! │  ┌──────────────────────┐    WriteOp     ┌──────────────────────────┐  │
//! │  │ in-memory view       │ ─────────────► │ writer task (tokio)      │  │
//! │  │ HashMap<key, value>  │  mpsc (FIFO)   │                          │  │
//! │  │ answers get()        │                │ SqliteStorage::set       │  │
//! │  └──────────────────────┘                │   │ Err                  │  │
//! │                                          │   ▼                      │  │
//! │                                          │ ExponentialBackoff sleep │  │
//! │                                          │ retry ≤ max_attempts     │  │
//! │                                          └──────────────────────────┘  │
//! │                                                                         │
//! │  flush().await    → resolves once every queued write was attempted     │
//! │  shutdown().await → flushes, closes the pool, stops the task           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering
//! Writes are applied in the order they were queued. A write that exhausts
//! its retries is dropped and counted in [`WriteBehindStorage::failed_writes`];
//! later writes still go through, and because every write carries the whole
//! value the next successful one repairs the record.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use crate::sqlite::SqliteStorage;

// =============================================================================
// Retry Policy
// =============================================================================

/// Retry settings for background writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_backoff: Duration,

    /// Upper bound for a single delay.
    pub max_backoff: Duration,

    /// Total attempts per write, including the first one.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_backoff,
            max_interval: self.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

// =============================================================================
// Queue Messages
// =============================================================================

#[derive(Debug)]
enum WriteOp {
    Set { key: String, value: String },
    Remove { key: String },
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

// =============================================================================
// Write-Behind Storage
// =============================================================================

/// In-memory view plus a background SQLite writer.
///
/// Must be opened from inside a tokio runtime.
#[derive(Debug)]
pub struct WriteBehindStorage {
    view: Mutex<HashMap<String, String>>,
    queue: mpsc::UnboundedSender<WriteOp>,
    failed: Arc<AtomicU64>,
}

impl WriteBehindStorage {
    /// Preloads `keys` from SQLite and spawns the writer task.
    pub async fn open(
        sqlite: SqliteStorage,
        keys: &[&str],
        policy: RetryPolicy,
    ) -> StorageResult<Self> {
        let view = sqlite.load(keys).await?;
        info!(preloaded = view.len(), "Write-behind storage opened");

        let (queue, rx) = mpsc::unbounded_channel();
        let failed = Arc::new(AtomicU64::new(0));

        let writer = Writer {
            sqlite,
            policy,
            rx,
            failed: failed.clone(),
        };
        tokio::spawn(writer.run());

        Ok(WriteBehindStorage {
            view: Mutex::new(view),
            queue,
            failed,
        })
    }

    /// Waits until every write queued so far has been attempted.
    pub async fn flush(&self) -> StorageResult<()> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(WriteOp::Flush(tx))?;
        rx.await.map_err(|_| StorageError::WriterClosed)
    }

    /// Flushes pending writes and closes the database.
    ///
    /// Writes after shutdown fail with [`StorageError::WriterClosed`].
    pub async fn shutdown(&self) -> StorageResult<()> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(WriteOp::Shutdown(tx))?;
        rx.await.map_err(|_| StorageError::WriterClosed)
    }

    /// Number of writes dropped after exhausting their retries.
    pub fn failed_writes(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    fn enqueue(&self, op: WriteOp) -> StorageResult<()> {
        self.queue.send(op).map_err(|_| StorageError::WriterClosed)
    }

    fn view(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorageBackend for WriteBehindStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.view().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        // Hold the view lock while queueing so queue order matches view order.
        let mut view = self.view();
        self.enqueue(WriteOp::Set {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        view.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut view = self.view();
        self.enqueue(WriteOp::Remove {
            key: key.to_string(),
        })?;
        view.remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

// =============================================================================
// Writer Task
// =============================================================================

struct Writer {
    sqlite: SqliteStorage,
    policy: RetryPolicy,
    rx: mpsc::UnboundedReceiver<WriteOp>,
    failed: Arc<AtomicU64>,
}

impl Writer {
    async fn run(mut self) {
        debug!("Storage writer started");

        while let Some(op) = self.rx.recv().await {
            match op {
                WriteOp::Flush(done) => {
                    let _ = done.send(());
                }
                WriteOp::Shutdown(done) => {
                    self.rx.close();
                    self.sqlite.close().await;
                    let _ = done.send(());
                    break;
                }
                op => self.persist(&op).await,
            }
        }

        info!("Storage writer stopped");
    }

    async fn persist(&self, op: &WriteOp) {
        let mut backoff = self.policy.create_backoff();
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let result = match op {
                WriteOp::Set { key, value } => self.sqlite.set(key, value).await,
                WriteOp::Remove { key } => self.sqlite.remove(key).await,
                WriteOp::Flush(_) | WriteOp::Shutdown(_) => Ok(()),
            };

            let e = match result {
                Ok(()) => return,
                Err(e) => e,
            };

            if attempt >= self.policy.max_attempts {
                error!(?e, attempt, "Storage write dropped after retries");
                self.failed.fetch_add(1, Ordering::Relaxed);
                return;
            }

            match backoff.next_backoff() {
                Some(duration) => {
                    warn!(?e, attempt, ?duration, "Storage write failed, retrying");
                    tokio::time::sleep(duration).await;
                }
                None => {
                    error!(?e, "Backoff exhausted");
                    self.failed.fetch_add(1, Ordering::Relaxed);
                    return;
                }
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::SqliteConfig;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            max_attempts: 3,
        }
    }

    async fn sqlite() -> SqliteStorage {
        SqliteStorage::new(SqliteConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_writes_reach_sqlite_after_flush() {
        let db = sqlite().await;
        let storage = WriteBehindStorage::open(db.clone(), &["cart"], fast_policy())
            .await
            .unwrap();

        storage.set("cart", "[1]").unwrap();
        storage.set("cart", "[1,2]").unwrap();

        // Reads are served from the view immediately
        assert_eq!(storage.get("cart").unwrap().as_deref(), Some("[1,2]"));

        storage.flush().await.unwrap();
        assert_eq!(db.get("cart").await.unwrap().as_deref(), Some("[1,2]"));

        storage.remove("cart").unwrap();
        storage.flush().await.unwrap();
        assert_eq!(db.get("cart").await.unwrap(), None);
        assert_eq!(storage.failed_writes(), 0);
    }

    #[tokio::test]
    async fn test_open_preloads_requested_keys() {
        let db = sqlite().await;
        db.set("preferredCurrency", "USD").await.unwrap();
        db.set("unrelated", "x").await.unwrap();

        let storage = WriteBehindStorage::open(db, &["cart", "preferredCurrency"], fast_policy())
            .await
            .unwrap();

        assert_eq!(
            storage.get("preferredCurrency").unwrap().as_deref(),
            Some("USD")
        );
        assert_eq!(storage.get("cart").unwrap(), None);
        assert_eq!(storage.get("unrelated").unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_writes_are_counted() {
        let db = sqlite().await;
        let storage = WriteBehindStorage::open(db.clone(), &[], fast_policy())
            .await
            .unwrap();

        db.close().await;

        storage.set("cart", "[]").unwrap();
        storage.flush().await.unwrap();

        assert_eq!(storage.failed_writes(), 1);
        // The view still reflects the write
        assert_eq!(storage.get("cart").unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_writes_after_shutdown_fail() {
        let storage = WriteBehindStorage::open(sqlite().await, &[], fast_policy())
            .await
            .unwrap();

        storage.set("cart", "[]").unwrap();
        storage.shutdown().await.unwrap();

        assert!(matches!(
            storage.set("cart", "[1]"),
            Err(StorageError::WriterClosed)
        ));
        assert!(storage.flush().await.is_err());
        assert_eq!(storage.get("cart").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert!(policy.initial_backoff < policy.max_backoff);
    }
}
