//! # storefront-storage: Persistence Layer for the Storefront Cart
//!
//! Key/value storage backends the cart store persists through.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Storefront Cart Data Flow                           │
//! │                                                                         │
//! │  CartState (apps/cart-cli)                                             │
//! │       │ get / set / remove   (synchronous)                             │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               storefront-storage (THIS CRATE)                   │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐   ┌──────────────┐   ┌───────────────────┐  │   │
//! │  │   │ MemoryStorage│   │ FileStorage  │   │WriteBehindStorage │  │   │
//! │  │   │ (backend.rs) │   │  (file.rs)   │   │   (writer.rs)     │  │   │
//! │  │   └──────────────┘   └──────────────┘   └─────────┬─────────┘  │   │
//! │  │                                                   │ async       │   │
//! │  │                                         ┌─────────▼─────────┐  │   │
//! │  │                                         │  SqliteStorage    │  │   │
//! │  │                                         │  + migrations     │  │   │
//! │  │                                         └───────────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`backend`] - The `StorageBackend` contract and `MemoryStorage`
//! - [`file`] - One JSON file per key
//! - [`sqlite`] - Pool configuration and the `storage_records` table
//! - [`writer`] - Synchronous front for SQLite with background retries
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Storage error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storefront_storage::{SqliteConfig, SqliteStorage, WriteBehindStorage, RetryPolicy};
//!
//! let sqlite = SqliteStorage::new(SqliteConfig::new("storefront.db")).await?;
//! let storage = WriteBehindStorage::open(sqlite, &["cart"], RetryPolicy::default()).await?;
//! storage.set("cart", "[]")?;
//! storage.flush().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod error;
pub mod file;
pub mod migrations;
pub mod sqlite;
pub mod writer;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::{MemoryStorage, SharedStorage, StorageBackend};
pub use error::{StorageError, StorageResult};
pub use file::FileStorage;
pub use sqlite::{SqliteConfig, SqliteStorage};
pub use writer::{RetryPolicy, WriteBehindStorage};
