//! # State Module
//!
//! Session state for the cart CLI.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐  │
//! │  │   ConfigState    │  │   StorageState   │  │      CartState       │  │
//! │  │                  │  │                  │  │                      │  │
//! │  │  storefront.toml │─►│  memory / file / │─►│  Mutex<Cart+Currency>│  │
//! │  │  STOREFRONT_*    │  │  sqlite writer   │  │  watch + broadcast   │  │
//! │  └──────────────────┘  └──────────────────┘  └──────────┬───────────┘  │
//! │                                                         │              │
//! │                                              CartProvider::scope       │
//! │                                                         │              │
//! │                                                    use_cart()          │
//! │                                                 (commands layer)       │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • ConfigState: read-only after initialization                        │
//! │  • StorageState: backends are Send + Sync                             │
//! │  • CartState: Mutex, operations totally ordered                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod config;
mod provider;
mod storage;

pub use cart::{CartState, CartView};
pub use config::{BackendKind, ConfigState, CONFIG_FILE_NAME};
pub use provider::{try_use_cart, use_cart, CartProvider};
pub use storage::StorageState;
