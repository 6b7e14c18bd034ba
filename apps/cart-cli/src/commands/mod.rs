//! # Commands Module
//!
//! One function per CLI command. Each resolves the cart store with
//! [`use_cart`](crate::state::use_cart), so it must run inside a
//! [`CartProvider`](crate::state::CartProvider) scope.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports)
//! ├── cart.rs      ◄─── show / add / remove / update / clear / totals / format
//! ├── currency.rs  ◄─── currency show / toggle
//! └── config.rs    ◄─── config show / path (no store needed)
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  storefront-cart add --id 7 --price 1499 --quantity 2                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  cli.rs (clap) ──► lib.rs::dispatch inside CartProvider::scope         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  commands::cart::add_to_cart(input)                                    │
//! │         │  use_cart().add_to_cart(item) → Notice                       │
//! │         ▼                                                               │
//! │  CartResponse { items, itemCount, currency, totals,                    │
//! │                 formattedTotal, notice }                               │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  output.rs ──► human table or --json                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cart;
pub mod config;
pub mod currency;
