//! # Error Types
//!
//! Domain-specific error types for storefront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storefront-core errors (this file)                                    │
//! │  ├── CoreError        - Cart rule violations                           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  storefront-storage errors (separate crate)                            │
//! │  └── StorageError     - Backend read/write failures                    │
//! │                                                                         │
//! │  cart-cli errors (in app)                                              │
//! │  └── ApiError         - What the CLI reports (serialized)              │
//! │                                                                         │
//! │  CoreError never leaves the cart store: it is turned into a Notice.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Cart rule violations.
///
/// These are all recoverable: the cart is left untouched when one is
/// returned, and the store reports it to the shopper as a notice.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A position that does not exist in the cart.
    #[error("No cart item at position {index} (cart has {len} items)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Quantity would exceed the stock ceiling carried by the line item.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart: "Linen Shirt" x4 (maxStock 5)
    ///      │
    ///      ▼
    /// Add "Linen Shirt" x2  → would be 6
    ///      │
    ///      ▼
    /// StockExceeded { title: "Linen Shirt", max_stock: 5, requested: 6 }
    ///      │
    ///      ▼
    /// Toast: "Only 5 of Linen Shirt available"
    /// ```
    #[error("Only {max_stock} of {title} available (requested {requested})")]
    StockExceeded {
        title: String,
        max_stock: u32,
        requested: u64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Value is below the allowed minimum.
    #[error("{field} must be at least {min}")]
    BelowMinimum { field: String, min: u64 },

    /// Value is above the allowed maximum.
    #[error("{field} must be at most {max}")]
    AboveMaximum { field: String, max: u64 },

    /// Invalid format (e.g., unparsable price or currency code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
