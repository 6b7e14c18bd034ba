//! # Currency Commands
//!
//! Display currency selection. Switching never touches item prices; each
//! item carries both.

use serde::Serialize;
use storefront_core::Currency;
use tracing::debug;

use super::cart::CartResponse;
use crate::state::use_cart;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyResponse {
    pub currency: Currency,
    pub symbol: String,
}

/// Gets the active display currency.
pub fn show_currency() -> CurrencyResponse {
    debug!("show_currency command");
    let currency = use_cart().currency();
    CurrencyResponse {
        currency,
        symbol: currency.symbol().to_string(),
    }
}

/// Flips between INR and USD and saves the preference.
pub fn toggle_currency() -> CartResponse {
    debug!("toggle_currency command");
    let store = use_cart();
    let notice = store.toggle_currency();
    CartResponse::new(store.view(), Some(notice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use storefront_storage::MemoryStorage;

    use crate::state::{CartProvider, CartState};

    #[test]
    fn test_toggle_round_trip() {
        let store = Arc::new(CartState::load(Arc::new(MemoryStorage::new()), Currency::Inr));

        CartProvider::scope(store, || {
            assert_eq!(show_currency().symbol, "₹");

            let response = toggle_currency();
            assert_eq!(response.currency, Currency::Usd);
            assert_eq!(response.formatted_total, "$0.00");
            assert_eq!(show_currency().currency, Currency::Usd);

            toggle_currency();
            assert_eq!(show_currency().currency, Currency::Inr);
        });
    }
}
