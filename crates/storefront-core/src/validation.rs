//! # Validation Module
//!
//! Input validation for cart mutations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (types.rs)                                   │
//! │  ├── Price coercion (invalid → 0)                                      │
//! │  └── Quantity coercion (absent/0 → 1)                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Position must exist in the cart                                   │
//! │  ├── Explicit quantity updates must be >= 1                            │
//! │  └── Quantity must not exceed maxStock                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Cart store                                                   │
//! │  └── Turns any failure into a Notice, state untouched                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Smallest quantity a line item can hold.
pub const MIN_QUANTITY: u32 = 1;

/// Validates a zero-based cart position.
///
/// ## Example
/// ```rust
/// use storefront_core::validation::validate_index;
///
/// assert!(validate_index(0, 1).is_ok());
/// assert!(validate_index(1, 1).is_err());
/// ```
pub fn validate_index(index: usize, len: usize) -> CoreResult<()> {
    if index >= len {
        return Err(CoreError::IndexOutOfRange { index, len });
    }
    Ok(())
}

/// Validates an explicit quantity update.
///
/// ## Rules
/// - Must be at least 1; removal goes through `remove`, never quantity 0
pub fn validate_quantity(qty: i64) -> ValidationResult<u32> {
    if qty < i64::from(MIN_QUANTITY) {
        return Err(ValidationError::BelowMinimum {
            field: "quantity".to_string(),
            min: u64::from(MIN_QUANTITY),
        });
    }

    u32::try_from(qty).map_err(|_| ValidationError::InvalidFormat {
        field: "quantity".to_string(),
        reason: format!("must not exceed {}", u32::MAX),
    })
}

/// Validates a requested quantity against an optional stock ceiling.
///
/// ## Example
/// ```rust
/// use storefront_core::validation::validate_stock;
///
/// assert!(validate_stock("Tee", 5, Some(5)).is_ok());
/// assert!(validate_stock("Tee", 6, Some(5)).is_err());
/// assert!(validate_stock("Tee", 600, None).is_ok());
/// ```
pub fn validate_stock(title: &str, requested: u64, max_stock: Option<u32>) -> CoreResult<()> {
    match max_stock {
        Some(max) if requested > u64::from(max) => Err(CoreError::StockExceeded {
            title: title.to_string(),
            max_stock: max,
            requested,
        }),
        _ => Ok(()),
    }
}
