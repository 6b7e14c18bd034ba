//! # Cart State
//!
//! The cart store: owns the session's cart and display currency, keeps
//! them in step with storage, and tells subscribers about every change.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Store Lifecycle                                 │
//! │                                                                         │
//! │  CartState::load(storage, default_currency)                            │
//! │       │                                                                 │
//! │       ├── get("cart") ──► parse JSON array, then each entry          │
//! │       │       │ missing / unreadable     → empty cart                  │
//! │       │       │ not an array             → remove("cart"), empty cart  │
//! │       │       └ bad entry                → dropped, cart rewritten     │
//! │       │                                                                 │
//! │       └── get("preferredCurrency")                                     │
//! │               missing / unknown          → default currency            │
//! │                                                                         │
//! │  Operation (add / remove / update / clear / toggle)                    │
//! │       │                                                                 │
//! │       ├── lock ──► mutate Cart/Currency ──► persist (full overwrite)   │
//! │       ├── publish CartView on the watch channel                        │
//! │       └── send Notice on the broadcast channel, return it              │
//! │                                                                         │
//! │  The store lives for the whole session; there is no teardown.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Handling
//! Operations never return `Err` and never panic. Rule violations (bad
//! index, quantity below 1, stock ceiling) become notices and leave state
//! untouched. Storage write failures are logged; in-memory state stays
//! authoritative.
//!
//! ## Thread Safety
//! State sits behind a `Mutex`, so operations are totally ordered. The lock
//! is held through the persist step, which keeps storage writes in the same
//! order as the mutations that produced them.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use storefront_core::{
    AddOutcome, Cart, CartLineItem, CartTotals, CoreError, Currency, Money, Notice,
    CART_STORAGE_KEY, CURRENCY_STORAGE_KEY,
};
use storefront_storage::{SharedStorage, StorageBackend};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

/// Capacity of the notice broadcast channel. Slow receivers lag, they do
/// not block the store.
const NOTICE_CHANNEL_CAPACITY: usize = 64;

// =============================================================================
// Cart View
// =============================================================================

/// Read-only snapshot of the store, published after every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartLineItem>,
    pub item_count: u64,
    pub currency: Currency,
    pub totals: CartTotals,
}

impl CartView {
    fn of(inner: &Inner) -> Self {
        CartView {
            items: inner.cart.items().to_vec(),
            item_count: inner.cart.item_count(),
            currency: inner.currency,
            totals: inner.cart.totals(inner.currency),
        }
    }

    /// `totals.current` rendered in the active currency.
    pub fn formatted_total(&self) -> String {
        self.currency.format(self.totals.current)
    }
}

// =============================================================================
// Cart State
// =============================================================================

#[derive(Debug)]
struct Inner {
    cart: Cart,
    currency: Currency,
}

/// The cart store.
///
/// ## Usage
/// ```rust,ignore
/// let store = CartState::load(storage, Currency::Inr);
/// let notice = store.add_to_cart(item);
/// println!("{} ({} items)", notice.message, store.item_count());
/// ```
pub struct CartState {
    inner: Mutex<Inner>,
    storage: SharedStorage,
    view_tx: watch::Sender<CartView>,
    notice_tx: broadcast::Sender<Notice>,
    session_id: Uuid,
}

impl fmt::Debug for CartState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartState")
            .field("session_id", &self.session_id)
            .field("storage", &self.storage.name())
            .field("inner", &*self.lock())
            .finish()
    }
}

impl CartState {
    /// Builds the store from whatever `storage` holds.
    ///
    /// Never fails: unreadable or corrupt data degrades to an empty cart.
    pub fn load(storage: SharedStorage, default_currency: Currency) -> Self {
        let session_id = Uuid::new_v4();
        let span = info_span!("cart_store", session = %session_id, backend = storage.name());
        let _enter = span.enter();

        let cart = load_cart(storage.as_ref());
        let currency = load_currency(storage.as_ref(), default_currency);

        info!(
            items = cart.len(),
            currency = %currency,
            "Cart store initialized"
        );

        let inner = Inner { cart, currency };
        let (view_tx, _) = watch::channel(CartView::of(&inner));
        let (notice_tx, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);

        CartState {
            inner: Mutex::new(inner),
            storage,
            view_tx,
            notice_tx,
            session_id,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Name of the storage backend in use.
    pub fn storage_name(&self) -> &'static str {
        self.storage.name()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Adds an item, merging into an existing entry with the same identity.
    pub fn add_to_cart(&self, item: CartLineItem) -> Notice {
        let mut inner = self.lock();
        let name = item.display_name();

        let notice = match inner.cart.add(item) {
            Ok(AddOutcome::Merged { index, quantity }) => {
                debug!(session = %self.session_id, index, quantity, "Merged into existing cart entry");
                self.persist_cart(&inner.cart);
                Notice::success(format!("{} quantity updated to {}", name, quantity))
            }
            Ok(AddOutcome::Added { index }) => {
                debug!(session = %self.session_id, index, "Added new cart entry");
                self.persist_cart(&inner.cart);
                Notice::success(format!("{} added to cart", name))
            }
            Err(e) => {
                info!(session = %self.session_id, error = %e, "Add to cart rejected");
                Notice::error(e.to_string())
            }
        };

        self.publish(&inner, notice)
    }

    /// Removes the entry at `index`.
    pub fn remove_from_cart(&self, index: usize) -> Notice {
        let mut inner = self.lock();

        let notice = match inner.cart.remove(index) {
            Ok(removed) => {
                debug!(session = %self.session_id, index, "Removed cart entry");
                self.persist_cart(&inner.cart);
                Notice::info(format!("{} removed from cart", removed.display_name()))
            }
            Err(e) => {
                warn!(session = %self.session_id, index, len = inner.cart.len(), "Remove from cart rejected");
                Notice::error(e.to_string())
            }
        };

        self.publish(&inner, notice)
    }

    /// Sets the quantity of the entry at `index`.
    ///
    /// Quantities below 1 are refused with an informational notice; use
    /// [`CartState::remove_from_cart`] to drop an entry.
    pub fn update_quantity(&self, index: usize, quantity: i64) -> Notice {
        let mut inner = self.lock();

        let updated = inner
            .cart
            .update_quantity(index, quantity)
            .map(|item| format!("{} quantity set to {}", item.display_name(), item.quantity));

        let notice = match updated {
            Ok(message) => {
                debug!(session = %self.session_id, index, quantity, "Updated cart quantity");
                self.persist_cart(&inner.cart);
                Notice::success(message)
            }
            Err(CoreError::Validation(e)) => {
                debug!(session = %self.session_id, index, quantity, "Quantity below minimum");
                Notice::info(format!("Quantity not changed: {}", e))
            }
            Err(e @ CoreError::IndexOutOfRange { .. }) => {
                warn!(session = %self.session_id, index, len = inner.cart.len(), "Update quantity rejected");
                Notice::error(e.to_string())
            }
            Err(e) => {
                info!(session = %self.session_id, error = %e, "Update quantity rejected");
                Notice::error(e.to_string())
            }
        };

        self.publish(&inner, notice)
    }

    /// Empties the cart and deletes the stored record. The currency
    /// preference is kept.
    pub fn clear_cart(&self) -> Notice {
        let mut inner = self.lock();

        let removed = inner.cart.len();
        inner.cart.clear();
        if let Err(e) = self.storage.remove(CART_STORAGE_KEY) {
            error!(session = %self.session_id, error = %e, "Failed to remove saved cart");
        }
        debug!(session = %self.session_id, removed, "Cart cleared");

        self.publish(&inner, Notice::info("Cart cleared"))
    }

    /// Switches between INR and USD and saves the preference.
    pub fn toggle_currency(&self) -> Notice {
        let mut inner = self.lock();

        inner.currency = inner.currency.toggle();
        let currency = inner.currency;
        if let Err(e) = self.storage.set(CURRENCY_STORAGE_KEY, currency.code()) {
            error!(session = %self.session_id, error = %e, "Failed to save currency preference");
        }
        debug!(session = %self.session_id, currency = %currency, "Currency toggled");

        self.publish(&inner, Notice::info(format!("Prices now shown in {}", currency)))
    }

    // =========================================================================
    // Reads (derived values are recomputed on every call)
    // =========================================================================

    pub fn items(&self) -> Vec<CartLineItem> {
        self.lock().cart.items().to_vec()
    }

    pub fn currency(&self) -> Currency {
        self.lock().currency
    }

    /// Total units across all entries.
    pub fn item_count(&self) -> u64 {
        self.lock().cart.item_count()
    }

    pub fn totals(&self) -> CartTotals {
        let inner = self.lock();
        inner.cart.totals(inner.currency)
    }

    /// Formats `amount` in `currency`, or in the active currency when `None`.
    pub fn format_price(&self, amount: Money, currency: Option<Currency>) -> String {
        let currency = currency.unwrap_or_else(|| self.currency());
        currency.format(amount)
    }

    /// Current snapshot.
    pub fn view(&self) -> CartView {
        CartView::of(&self.lock())
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Receiver that always holds the latest [`CartView`].
    pub fn subscribe(&self) -> watch::Receiver<CartView> {
        self.view_tx.subscribe()
    }

    /// Receiver for notices produced after this call.
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notice_tx.subscribe()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Overwrites the stored cart with the full item sequence.
    fn persist_cart(&self, cart: &Cart) {
        let result = serde_json::to_string(cart)
            .map_err(storefront_storage::StorageError::from)
            .and_then(|json| self.storage.set(CART_STORAGE_KEY, &json));

        if let Err(e) = result {
            error!(session = %self.session_id, error = %e, "Failed to persist cart");
        }
    }

    fn publish(&self, inner: &Inner, notice: Notice) -> Notice {
        self.view_tx.send_replace(CartView::of(inner));
        // No receivers is fine
        let _ = self.notice_tx.send(notice.clone());
        notice
    }
}

// =============================================================================
// Loading
// =============================================================================

fn load_cart(storage: &dyn StorageBackend) -> Cart {
    let raw = match storage.get(CART_STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Cart::new(),
        Err(e) => {
            warn!(error = %e, "Could not read saved cart, starting empty");
            return Cart::new();
        }
    };

    let entries = match serde_json::from_str::<Vec<Value>>(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "Discarding corrupt saved cart");
            if let Err(e) = storage.remove(CART_STORAGE_KEY) {
                warn!(error = %e, "Could not remove corrupt saved cart");
            }
            return Cart::new();
        }
    };

    let total = entries.len();
    let items: Vec<CartLineItem> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(position, entry)| match CartLineItem::deserialize(entry) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(position, error = %e, "Dropping unreadable saved cart entry");
                None
            }
        })
        .collect();

    let cart = Cart::from_items(items);
    if cart.len() < total {
        // Rewrite so the dropped entries don't come back on the next load
        let result = serde_json::to_string(&cart)
            .map_err(storefront_storage::StorageError::from)
            .and_then(|json| storage.set(CART_STORAGE_KEY, &json));
        if let Err(e) = result {
            warn!(error = %e, "Could not rewrite saved cart");
        }
    }
    cart
}

fn load_currency(storage: &dyn StorageBackend, default: Currency) -> Currency {
    match storage.get(CURRENCY_STORAGE_KEY) {
        Ok(Some(raw)) => raw.parse().unwrap_or_else(|_| {
            warn!(value = %raw, "Unknown saved currency, using default");
            default
        }),
        Ok(None) => default,
        Err(e) => {
            warn!(error = %e, "Could not read saved currency, using default");
            default
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use storefront_core::{CartVariant, EntityId, NoticeLevel};
    use storefront_storage::{MemoryStorage, StorageError, StorageResult};

    fn memory() -> Arc<MemoryStorage> {
        Arc::new(MemoryStorage::new())
    }

    fn store_on(storage: Arc<MemoryStorage>) -> CartState {
        CartState::load(storage, Currency::Inr)
    }

    fn item(id: i64, price_inr: i64, price_usd: i64, quantity: u32) -> CartLineItem {
        CartLineItem::new(id, format!("Item {}", id))
            .with_prices(Money::from_minor(price_inr), Money::from_minor(price_usd))
            .with_quantity(quantity)
    }

    fn saved_items(storage: &MemoryStorage) -> Vec<CartLineItem> {
        let raw = storage.get(CART_STORAGE_KEY).unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    /// Backend whose writes always fail.
    struct BrokenStorage;

    impl StorageBackend for BrokenStorage {
        fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Err(StorageError::Internal("disk gone".to_string()))
        }
        fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Internal("disk gone".to_string()))
        }
        fn remove(&self, _key: &str) -> StorageResult<()> {
            Err(StorageError::Internal("disk gone".to_string()))
        }
        fn name(&self) -> &'static str {
            "broken"
        }
    }

    #[test]
    fn test_same_identity_merges_quantities() {
        let storage = memory();
        let store = store_on(storage.clone());

        let first = store.add_to_cart(item(1, 10_000, 120, 2));
        let second = store.add_to_cart(item(1, 10_000, 120, 3));

        assert_eq!(first.level, NoticeLevel::Success);
        assert_eq!(second.level, NoticeLevel::Success);
        assert_ne!(first.message, second.message);

        let items = store.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
        assert_eq!(store.totals().inr, Money::from_minor(50_000));
        assert_eq!(saved_items(&storage), items);
    }

    #[test]
    fn test_distinct_variants_stay_separate() {
        let store = store_on(memory());

        store.add_to_cart(item(1, 5_000, 60, 1).with_variant(CartVariant::new("A")));
        store.add_to_cart(item(1, 6_000, 72, 1).with_variant(CartVariant::new("B")));

        assert_eq!(store.items().len(), 2);
        assert_eq!(store.item_count(), 2);
    }

    #[test]
    fn test_stock_ceiling_rejects_add() {
        let storage = memory();
        let store = store_on(storage.clone());

        store.add_to_cart(item(7, 1_000, 12, 4).with_max_stock(5));
        let notice = store.add_to_cart(item(7, 1_000, 12, 2).with_max_stock(5));

        assert!(notice.is_error());
        assert_eq!(store.items()[0].quantity, 4);
        assert_eq!(saved_items(&storage)[0].quantity, 4);
    }

    #[test]
    fn test_update_quantity_rules() {
        let store = store_on(memory());
        store.add_to_cart(item(1, 1_000, 12, 2).with_max_stock(3));

        let below = store.update_quantity(0, 0);
        assert_eq!(below.level, NoticeLevel::Info);
        assert_eq!(store.items()[0].quantity, 2);

        let over = store.update_quantity(0, 4);
        assert!(over.is_error());
        assert_eq!(store.items()[0].quantity, 2);

        let ok = store.update_quantity(0, 3);
        assert_eq!(ok.level, NoticeLevel::Success);
        assert_eq!(store.items()[0].quantity, 3);
    }

    #[test]
    fn test_out_of_range_index_never_mutates() {
        let storage = memory();
        let store = store_on(storage.clone());
        store.add_to_cart(item(1, 1_000, 12, 1));
        let before = store.view();

        assert!(store.remove_from_cart(1).is_error());
        assert!(store.remove_from_cart(usize::MAX).is_error());
        assert!(store.update_quantity(5, 2).is_error());

        assert_eq!(store.view(), before);
        assert_eq!(saved_items(&storage).len(), 1);
    }

    #[test]
    fn test_remove_preserves_order() {
        let store = store_on(memory());
        for id in 1..=3 {
            store.add_to_cart(item(id, 1_000, 12, 1));
        }

        let notice = store.remove_from_cart(1);
        assert_eq!(notice.level, NoticeLevel::Info);
        assert!(notice.message.contains("Item 2"));

        let ids: Vec<_> = store.items().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![EntityId::from(1), EntityId::from(3)]);
    }

    #[test]
    fn test_clear_removes_stored_cart_and_keeps_currency() {
        let storage = memory();
        let store = store_on(storage.clone());
        for id in 1..=3 {
            store.add_to_cart(item(id, 1_000, 12, 1));
        }
        store.toggle_currency();

        let notice = store.clear_cart();

        assert_eq!(notice.level, NoticeLevel::Info);
        assert!(store.items().is_empty());
        assert_eq!(store.item_count(), 0);
        assert_eq!(storage.get(CART_STORAGE_KEY).unwrap(), None);
        assert_eq!(store.currency(), Currency::Usd);
        assert_eq!(
            storage.get(CURRENCY_STORAGE_KEY).unwrap().as_deref(),
            Some("USD")
        );
    }

    #[test]
    fn test_toggle_only_changes_currency() {
        let store = store_on(memory());
        store.add_to_cart(item(1, 10_000, 120, 2));
        let items_before = store.items();
        let totals_before = store.totals();

        store.toggle_currency();
        let totals_after = store.totals();

        assert_eq!(store.items(), items_before);
        assert_eq!(totals_after.inr, totals_before.inr);
        assert_eq!(totals_after.usd, totals_before.usd);
        assert_eq!(totals_after.current, Money::from_minor(240));
        assert_eq!(totals_after.currency, Currency::Usd);
    }

    #[test]
    fn test_reload_reproduces_items_and_currency() {
        let storage = memory();
        let store = store_on(storage.clone());
        store.add_to_cart(item(1, 10_000, 120, 2));
        store.add_to_cart(
            item(2, 2_550, 31, 1)
                .with_variant(CartVariant::new("blue-m"))
                .with_max_stock(9),
        );
        store.toggle_currency();

        let reloaded = store_on(storage);
        assert_eq!(reloaded.items(), store.items());
        assert_eq!(reloaded.currency(), Currency::Usd);
    }

    #[test]
    fn test_corrupt_cart_loads_empty_and_is_removed() {
        let storage = Arc::new(MemoryStorage::with_entries([
            (CART_STORAGE_KEY, "{not json"),
            (CURRENCY_STORAGE_KEY, "USD"),
        ]));

        let store = store_on(storage.clone());

        assert!(store.items().is_empty());
        assert_eq!(storage.get(CART_STORAGE_KEY).unwrap(), None);
        assert_eq!(store.currency(), Currency::Usd);
    }

    #[test]
    fn test_saved_object_instead_of_array_is_removed() {
        let storage = Arc::new(MemoryStorage::with_entries([(
            CART_STORAGE_KEY,
            r#"{"id":1,"title":"Mug"}"#,
        )]));

        let store = store_on(storage.clone());

        assert!(store.items().is_empty());
        assert_eq!(storage.get(CART_STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_unreadable_entries_are_dropped_and_the_rest_kept() {
        let saved = r#"[
            {"id":1,"title":"Mug","price":100,"quantity":2},
            {"id":2,"title":"Cup","price":"50","maxStock":"5"},
            {"id":3,"title":"Tee","variant":{"sku":"X","attributes":[]}},
            {"title":"No id"},
            "not an item"
        ]"#;
        let storage = Arc::new(MemoryStorage::with_entries([(CART_STORAGE_KEY, saved)]));

        let store = store_on(storage.clone());

        let items = store.items();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].id, EntityId::from(1));
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[1].max_stock, Some(5));
        assert_eq!(items[1].price, Money::from_minor(5_000));
        assert!(items[2].variant.is_none());
        assert_eq!(store.item_count(), 4);

        // Stored record now holds only the readable entries
        assert_eq!(saved_items(&storage), items);

        // Ceiling read from the string still applies
        let notice = store.update_quantity(1, 6);
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(store.items()[1].quantity, 1);
    }

    #[test]
    fn test_unknown_currency_uses_default() {
        let storage = Arc::new(MemoryStorage::with_entries([(CURRENCY_STORAGE_KEY, "EUR")]));
        let store = CartState::load(storage, Currency::Usd);
        assert_eq!(store.currency(), Currency::Usd);
    }

    #[test]
    fn test_storage_failures_are_absorbed() {
        let store = CartState::load(Arc::new(BrokenStorage), Currency::Inr);

        let notice = store.add_to_cart(item(1, 1_000, 12, 1));
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(store.item_count(), 1);

        store.toggle_currency();
        store.clear_cart();
        assert_eq!(store.item_count(), 0);
        assert_eq!(store.currency(), Currency::Usd);
    }

    #[test]
    fn test_format_price() {
        let store = store_on(memory());
        assert_eq!(store.format_price(Money::from_minor(12_345_650), None), "₹1,23,456.50");
        assert_eq!(
            store.format_price(Money::from_minor(12_345_650), Some(Currency::Usd)),
            "$123,456.50"
        );
        assert_eq!(store.format_price(Money::zero(), None), "₹0.00");
    }

    #[test]
    fn test_subscribers_see_every_change() {
        let store = store_on(memory());
        let mut views = store.subscribe();
        let mut notices = store.notices();

        store.add_to_cart(item(1, 1_000, 12, 3));

        assert!(views.has_changed().unwrap());
        assert_eq!(views.borrow_and_update().item_count, 3);

        let notice = notices.try_recv().unwrap();
        assert!(notice.message.contains("added to cart"));

        store.update_quantity(0, 0);
        assert_eq!(notices.try_recv().unwrap().level, NoticeLevel::Info);
    }

    #[test]
    fn test_totals_match_line_sums() {
        let store = store_on(memory());
        store.add_to_cart(item(1, 1_999, 25, 3));
        store.add_to_cart(item(2, 50_000, 600, 1));
        store.add_to_cart(item(1, 1_999, 25, 1));
        store.remove_from_cart(1);
        store.add_to_cart(item(3, 10, 1, 7));

        let items = store.items();
        let inr: i64 = items.iter().map(|i| i.price.minor() * i64::from(i.quantity)).sum();
        let usd: i64 = items
            .iter()
            .map(|i| i.price_dollars.minor() * i64::from(i.quantity))
            .sum();
        let count: u64 = items.iter().map(|i| u64::from(i.quantity)).sum();

        let totals = store.totals();
        assert_eq!(totals.inr.minor(), inr);
        assert_eq!(totals.usd.minor(), usd);
        assert_eq!(store.item_count(), count);
        assert_eq!(store.view().formatted_total(), store.format_price(totals.current, None));
    }
}
