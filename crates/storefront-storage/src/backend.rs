//! # Storage Backend Contract
//!
//! The synchronous key/value contract the cart store persists through.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  get(key)          → Ok(Some(value)) | Ok(None) | Err                   │
//! │  set(key, value)   → replaces the WHOLE value (no partial writes)       │
//! │  remove(key)       → removing a missing key is not an error             │
//! │                                                                         │
//! │  Keys used by the cart store:                                          │
//! │    "cart"              → JSON array of CartLineItem                    │
//! │    "preferredCurrency" → "INR" | "USD"                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why Synchronous?
//! The cart store mutates state synchronously and persists at the end of
//! every mutation. Backends that need async I/O (SQLite) are wrapped in
//! [`crate::writer::WriteBehindStorage`], which answers synchronously from
//! memory and writes in the background.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::StorageResult;

/// Key/value storage used by the cart store.
pub trait StorageBackend: Send + Sync {
    /// Reads the value stored under `key`.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replaces the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Deletes `key`. Deleting a missing key succeeds.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Shared handle to a storage backend.
pub type SharedStorage = Arc<dyn StorageBackend>;

// =============================================================================
// Memory Storage
// =============================================================================

/// In-process storage. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage pre-seeded with entries.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        MemoryStorage {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries().remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
