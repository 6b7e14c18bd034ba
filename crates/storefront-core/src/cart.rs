//! # Cart
//!
//! The pure, I/O-free shopping cart.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Operation                 Check                   Change               │
//! │  ─────────                 ─────                   ──────               │
//! │                                                                         │
//! │  add(item) ──────────────► same entry exists? ───► items[i].qty += n    │
//! │                            └─ no ────────────────► items.push(item)     │
//! │                                                                         │
//! │  update_quantity(i, n) ──► i < len, n >= 1 ──────► items[i].qty = n     │
//! │                                                                         │
//! │  remove(i) ──────────────► i < len ──────────────► items.remove(i)      │
//! │                                                                         │
//! │  clear() ────────────────────────────────────────► items.clear()        │
//! │                                                                         │
//! │  Every quantity change is checked against maxStock.                     │
//! │  A failed check returns Err and leaves the cart untouched.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CartLineItem, CartTotals, Currency};
use crate::validation::{validate_index, validate_quantity, validate_stock};

/// What `Cart::add` did with the incoming item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Merged into an existing entry, which now holds `quantity`.
    Merged { index: usize, quantity: u32 },

    /// Appended as a new entry at `index`.
    Added { index: usize },
}

/// The shopping cart.
///
/// ## Invariants
/// - At most one entry per identity (see `CartLineItem::same_entry`)
/// - Every quantity is >= 1
/// - No quantity exceeds the entry's `max_stock`, when one is declared
/// - Insertion order is preserved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Wraps an already persisted item sequence as-is.
    pub fn from_items(items: Vec<CartLineItem>) -> Self {
        Cart { items }
    }

    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<CartLineItem> {
        self.items
    }

    pub fn get(&self, index: usize) -> Option<&CartLineItem> {
        self.items.get(index)
    }

    /// Number of entries (not units).
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Position of the entry with the same identity as `item`.
    pub fn find(&self, item: &CartLineItem) -> Option<usize> {
        self.items.iter().position(|existing| existing.same_entry(item))
    }

    /// Adds an item, merging quantities into an existing entry with the same
    /// identity.
    ///
    /// ## Behavior
    /// - Same entry present: quantity becomes existing + incoming. The stock
    ///   ceiling is the incoming item's `max_stock`, falling back to the one
    ///   already stored. An incoming ceiling replaces the stored one. A sum
    ///   that doesn't fit a `u32` is refused.
    /// - No such entry: appended, provided its own quantity fits its ceiling.
    ///
    /// Repeated calls always add quantity; nothing de-duplicates calls.
    pub fn add(&mut self, item: CartLineItem) -> CoreResult<AddOutcome> {
        if let Some(index) = self.find(&item) {
            let existing = &mut self.items[index];
            let requested = u64::from(existing.quantity) + u64::from(item.quantity);
            let ceiling = item.max_stock.or(existing.max_stock);

            validate_stock(&existing.display_name(), requested, ceiling)?;
            let quantity = u32::try_from(requested).map_err(|_| ValidationError::AboveMaximum {
                field: "quantity".to_string(),
                max: u64::from(u32::MAX),
            })?;

            existing.quantity = quantity;
            existing.max_stock = ceiling;

            return Ok(AddOutcome::Merged {
                index,
                quantity: existing.quantity,
            });
        }

        validate_stock(&item.display_name(), u64::from(item.quantity), item.max_stock)?;

        self.items.push(item);
        Ok(AddOutcome::Added {
            index: self.items.len() - 1,
        })
    }

    /// Removes the entry at `index`, preserving the order of the rest.
    pub fn remove(&mut self, index: usize) -> CoreResult<CartLineItem> {
        validate_index(index, self.items.len())?;
        Ok(self.items.remove(index))
    }

    /// Replaces the quantity of the entry at `index`.
    ///
    /// ## Checks (in order)
    /// 1. `index` exists
    /// 2. `quantity >= 1`
    /// 3. `quantity <= max_stock` when declared
    pub fn update_quantity(&mut self, index: usize, quantity: i64) -> CoreResult<&CartLineItem> {
        validate_index(index, self.items.len())?;
        let quantity = validate_quantity(quantity)?;

        let item = &mut self.items[index];
        validate_stock(&item.display_name(), u64::from(quantity), item.max_stock)?;
        item.quantity = quantity;

        Ok(item)
    }

    /// Clears all items from the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    // =========================================================================
    // Derived values (recomputed on every call)
    // =========================================================================

    /// Total number of units across all entries.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Sum of line totals in the given currency.
    pub fn total_in(&self, currency: Currency) -> Money {
        self.items.iter().map(|i| i.line_total(currency)).sum()
    }

    /// Totals in both currencies plus the active one.
    pub fn totals(&self, currency: Currency) -> CartTotals {
        let inr = self.total_in(Currency::Inr);
        let usd = self.total_in(Currency::Usd);
        CartTotals {
            inr,
            usd,
            current: match currency {
                Currency::Inr => inr,
                Currency::Usd => usd,
            },
            currency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::types::CartVariant;

    fn tee(quantity: u32) -> CartLineItem {
        CartLineItem::new(1, "Tee")
            .with_prices(Money::from_minor(10_000), Money::from_minor(120))
            .with_quantity(quantity)
    }

    fn variant_item(variant_id: &str, price_minor: i64) -> CartLineItem {
        CartLineItem::new(1, "Tee")
            .with_prices(Money::from_minor(price_minor), Money::zero())
            .with_variant(CartVariant::new(variant_id))
    }

    #[test]
    fn test_add_same_product_merges_quantity() {
        let mut cart = Cart::new();

        assert_eq!(cart.add(tee(2)), Ok(AddOutcome::Added { index: 0 }));
        assert_eq!(
            cart.add(tee(3)),
            Ok(AddOutcome::Merged { index: 0, quantity: 5 })
        );

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.total_in(Currency::Inr), Money::from_minor(50_000));
    }

    #[test]
    fn test_distinct_variants_are_distinct_entries() {
        let mut cart = Cart::new();
        cart.add(variant_item("A", 5_000)).unwrap();
        cart.add(variant_item("B", 6_000)).unwrap();

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.total_in(Currency::Inr), Money::from_minor(11_000));
    }

    #[test]
    fn test_base_product_and_variant_do_not_merge() {
        let mut cart = Cart::new();
        cart.add(tee(1)).unwrap();
        cart.add(variant_item("A", 5_000)).unwrap();
        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn test_merge_rejected_over_max_stock() {
        let mut cart = Cart::new();
        cart.add(tee(4).with_max_stock(5)).unwrap();

        let err = cart.add(tee(2).with_max_stock(5)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::StockExceeded { max_stock: 5, requested: 6, .. }
        ));
        assert_eq!(cart.items()[0].quantity, 4);
    }

    #[test]
    fn test_merge_uses_stored_ceiling_when_incoming_has_none() {
        let mut cart = Cart::new();
        cart.add(tee(4).with_max_stock(5)).unwrap();

        assert!(cart.add(tee(2)).is_err());
        assert!(cart.add(tee(1)).is_ok());
        assert_eq!(cart.items()[0].quantity, 5);
    }

    #[test]
    fn test_merge_past_u32_max_is_refused() {
        let mut cart = Cart::new();
        cart.add(tee(u32::MAX - 1)).unwrap();

        let err = cart.add(tee(2)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::AboveMaximum { .. })
        ));
        assert_eq!(cart.items()[0].quantity, u32::MAX - 1);

        assert!(cart.add(tee(1)).is_ok());
        assert_eq!(cart.items()[0].quantity, u32::MAX);
    }

    #[test]
    fn test_new_item_over_its_own_ceiling_is_rejected() {
        let mut cart = Cart::new();
        assert!(cart.add(tee(7).with_max_stock(5)).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut cart = Cart::new();
        cart.add(CartLineItem::new(1, "A")).unwrap();
        cart.add(CartLineItem::new(2, "B")).unwrap();
        cart.add(CartLineItem::new(3, "C")).unwrap();

        let removed = cart.remove(1).unwrap();
        assert_eq!(removed.title, "B");
        let titles: Vec<_> = cart.items().iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["A", "C"]);
    }

    #[test]
    fn test_out_of_range_index_leaves_cart_untouched() {
        let mut cart = Cart::new();
        cart.add(tee(2)).unwrap();
        let before = cart.clone();

        assert!(matches!(
            cart.remove(1),
            Err(CoreError::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert!(cart.update_quantity(5, 3).is_err());
        assert_eq!(cart, before);
    }

    #[test]
    fn test_update_quantity_rules() {
        let mut cart = Cart::new();
        cart.add(tee(2).with_max_stock(5)).unwrap();

        assert!(matches!(
            cart.update_quantity(0, 0),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            cart.update_quantity(0, 6),
            Err(CoreError::StockExceeded { .. })
        ));
        assert_eq!(cart.items()[0].quantity, 2);

        assert_eq!(cart.update_quantity(0, 5).unwrap().quantity, 5);
    }

    #[test]
    fn test_totals_follow_currency() {
        let mut cart = Cart::new();
        cart.add(tee(2)).unwrap();

        let inr = cart.totals(Currency::Inr);
        assert_eq!(inr.inr, Money::from_minor(20_000));
        assert_eq!(inr.usd, Money::from_minor(240));
        assert_eq!(inr.current, inr.inr);

        let usd = cart.totals(Currency::Usd);
        assert_eq!(usd.current, usd.usd);
        assert_eq!(usd.inr, inr.inr);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add(tee(1)).unwrap();
        cart.add(CartLineItem::new(2, "Cap")).unwrap();
        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
        assert!(cart.total_in(Currency::Inr).is_zero());
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let mut cart = Cart::new();
        cart.add(tee(1)).unwrap();

        let json = serde_json::to_string(&cart).unwrap();
        assert!(json.starts_with('['));

        let back: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cart);
    }
}
