//! # Storage State
//!
//! Opens the configured storage backend and keeps the handles needed to
//! shut it down cleanly.
//!
//! ```text
//! ConfigState.storage.backend
//!       │
//!       ├── memory ──► MemoryStorage
//!       ├── file   ──► FileStorage(<data dir>)
//!       └── sqlite ──► SqliteStorage(<data dir>/storefront.db)
//!                         ├─► health check (fails startup if unanswered)
//!                         └─► WriteBehindStorage (preloads cart keys)
//! ```

use std::sync::Arc;

use storefront_core::{CART_STORAGE_KEY, CURRENCY_STORAGE_KEY};
use storefront_storage::{
    FileStorage, MemoryStorage, SharedStorage, SqliteStorage, StorageError, WriteBehindStorage,
};
use tracing::{info, warn};

use super::config::{BackendKind, ConfigState};
use crate::error::ApiResult;

/// Keys the cart store reads at startup.
const PRELOAD_KEYS: [&str; 2] = [CART_STORAGE_KEY, CURRENCY_STORAGE_KEY];

/// The opened storage backend.
pub struct StorageState {
    shared: SharedStorage,
    writer: Option<Arc<WriteBehindStorage>>,
}

impl StorageState {
    /// Opens the backend selected by `config`.
    pub async fn open(config: &ConfigState) -> ApiResult<Self> {
        let state = match config.storage.backend {
            BackendKind::Memory => StorageState::new(Arc::new(MemoryStorage::new())),
            BackendKind::File => StorageState::new(Arc::new(FileStorage::open(config.data_dir())?)),
            BackendKind::Sqlite => {
                let sqlite = SqliteStorage::new(config.sqlite_config()).await?;
                if !sqlite.health_check().await {
                    sqlite.close().await;
                    return Err(StorageError::ConnectionFailed(
                        "database did not answer a health check".to_string(),
                    )
                    .into());
                }
                let writer = Arc::new(
                    WriteBehindStorage::open(sqlite, &PRELOAD_KEYS, config.retry_policy()).await?,
                );
                StorageState {
                    shared: writer.clone(),
                    writer: Some(writer),
                }
            }
        };

        info!(backend = state.shared.name(), "Storage opened");
        Ok(state)
    }

    /// Wraps an already constructed synchronous backend.
    pub fn new(shared: SharedStorage) -> Self {
        StorageState {
            shared,
            writer: None,
        }
    }

    /// Handle for the cart store.
    pub fn shared(&self) -> SharedStorage {
        self.shared.clone()
    }

    /// Waits for queued background writes and stops the writer.
    ///
    /// Synchronous backends have nothing to flush.
    pub async fn shutdown(&self) -> ApiResult<()> {
        if let Some(writer) = &self.writer {
            writer.shutdown().await?;
            let failed = writer.failed_writes();
            if failed > 0 {
                warn!(failed, "Some cart writes were not persisted");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use storefront_core::{CartLineItem, Currency, Money};

    use crate::state::CartState;

    fn config(backend: BackendKind, dir: PathBuf) -> ConfigState {
        let mut config = ConfigState::default();
        config.storage.backend = backend;
        config.storage.data_dir = Some(dir);
        config
    }

    async fn round_trip(backend: BackendKind) {
        let dir = tempfile::tempdir().unwrap();
        let config = config(backend, dir.path().to_path_buf());

        let storage = StorageState::open(&config).await.unwrap();
        let store = CartState::load(storage.shared(), Currency::Inr);
        store.add_to_cart(
            CartLineItem::new(1, "Linen Shirt")
                .with_prices(Money::from_minor(149_900), Money::from_minor(1_799))
                .with_quantity(2),
        );
        store.add_to_cart(CartLineItem::new("sku-9", "Socks").with_quantity(3));
        store.toggle_currency();
        storage.shutdown().await.unwrap();

        let reopened = StorageState::open(&config).await.unwrap();
        let reloaded = CartState::load(reopened.shared(), Currency::Inr);
        assert_eq!(reloaded.items(), store.items());
        assert_eq!(reloaded.currency(), Currency::Usd);
        reopened.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_backend_round_trip() {
        round_trip(BackendKind::File).await;
    }

    #[tokio::test]
    async fn test_sqlite_backend_round_trip() {
        round_trip(BackendKind::Sqlite).await;
    }

    #[tokio::test]
    async fn test_memory_backend_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageState::open(&config(BackendKind::Memory, dir.path().to_path_buf()))
            .await
            .unwrap();
        let store = CartState::load(storage.shared(), Currency::Inr);
        assert!(store.items().is_empty());
        storage.shutdown().await.unwrap();
    }
}
