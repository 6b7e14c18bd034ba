//! # storefront-core: Pure Cart Logic for the Storefront
//!
//! This crate is the **heart** of the storefront cart. It contains the cart
//! rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Storefront Cart Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Callers (product page, checkout)               │   │
//! │  │    add_to_cart ──► update_quantity ──► remove ──► clear         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                CartState (cart-cli, the store)                  │   │
//! │  │        persist after every mutation, notices, subscribers       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ storefront-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │ validation│  │   │
//! │  │   │ LineItem  │  │   Money   │  │   Cart    │  │   rules   │  │   │
//! │  │   │ Currency  │  │ coercion  │  │  totals   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Line items, variants, currency, totals, notices
//! - [`money`] - Money type with integer arithmetic and decimal coercion
//! - [`cart`] - The cart and its identity/merge rules
//! - [`error`] - Domain error types
//! - [`validation`] - Index, quantity and stock checks
//!
//! ## Example Usage
//!
//! ```rust
//! use storefront_core::{Cart, CartLineItem, Currency, Money};
//!
//! let mut cart = Cart::new();
//! let shirt = CartLineItem::new(1, "Linen Shirt")
//!     .with_prices(Money::from_minor(10_000), Money::from_minor(120));
//!
//! cart.add(shirt.clone().with_quantity(2)).unwrap();
//! cart.add(shirt.with_quantity(3)).unwrap();
//!
//! assert_eq!(cart.len(), 1);
//! assert_eq!(cart.item_count(), 5);
//! assert_eq!(Currency::Inr.format(cart.total_in(Currency::Inr)), "₹500.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{AddOutcome, Cart};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Storage Contract
// =============================================================================

/// Storage key holding the JSON array of `CartLineItem` records.
pub const CART_STORAGE_KEY: &str = "cart";

/// Storage key holding the literal `"INR"` or `"USD"`.
pub const CURRENCY_STORAGE_KEY: &str = "preferredCurrency";
