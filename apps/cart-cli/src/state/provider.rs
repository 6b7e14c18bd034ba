//! # Cart Provider
//!
//! Scoped access to the cart store for code that does not receive it as
//! an argument.
//!
//! ```text
//! CartProvider::scope(store_a, || {
//!     use_cart()                       → store_a
//!     CartProvider::scope(store_b, || {
//!         use_cart()                   → store_b   (innermost wins)
//!     });
//!     use_cart()                       → store_a   (restored on exit or unwind)
//! });
//! use_cart()                           → panic: wiring defect
//! ```
//!
//! Scopes are per thread.

use std::cell::RefCell;
use std::sync::Arc;

use super::cart::CartState;

thread_local! {
    static STORES: RefCell<Vec<Arc<CartState>>> = const { RefCell::new(Vec::new()) };
}

/// Installs a cart store for the duration of a closure.
pub struct CartProvider;

impl CartProvider {
    /// Runs `f` with `store` as the innermost store on this thread.
    pub fn scope<F, R>(store: Arc<CartState>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        STORES.with(|stores| stores.borrow_mut().push(store));
        let _guard = ScopeGuard;
        f()
    }
}

/// Pops the store when the scope ends, including on panic.
struct ScopeGuard;

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        STORES.with(|stores| {
            stores.borrow_mut().pop();
        });
    }
}

/// Returns the innermost cart store.
///
/// # Panics
/// When called outside any [`CartProvider::scope`].
pub fn use_cart() -> Arc<CartState> {
    match try_use_cart() {
        Some(store) => store,
        None => panic!("use_cart must be used within a CartProvider"),
    }
}

/// Returns the innermost cart store, or `None` outside a provider.
pub fn try_use_cart() -> Option<Arc<CartState>> {
    STORES.with(|stores| stores.borrow().last().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::Currency;
    use storefront_storage::MemoryStorage;

    fn store() -> Arc<CartState> {
        Arc::new(CartState::load(Arc::new(MemoryStorage::new()), Currency::Inr))
    }

    #[test]
    #[should_panic(expected = "use_cart must be used within a CartProvider")]
    fn test_use_cart_outside_provider_panics() {
        use_cart();
    }

    #[test]
    fn test_scope_installs_store() {
        let outer = store();
        let inner = store();

        CartProvider::scope(outer.clone(), || {
            assert_eq!(use_cart().session_id(), outer.session_id());

            CartProvider::scope(inner.clone(), || {
                assert_eq!(use_cart().session_id(), inner.session_id());
            });

            assert_eq!(use_cart().session_id(), outer.session_id());
        });

        assert!(try_use_cart().is_none());
    }

    #[test]
    fn test_scope_restored_after_panic() {
        let outer = store();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            CartProvider::scope(outer.clone(), || panic!("boom"))
        }));

        assert!(result.is_err());
        assert!(try_use_cart().is_none());
    }

    #[test]
    fn test_scope_returns_closure_value() {
        let count = CartProvider::scope(store(), || use_cart().item_count());
        assert_eq!(count, 0);
    }
}
