//! # Cart Commands
//!
//! Commands for cart manipulation.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐  add        ┌──────────┐  clear      ┌──────────┐        │
//! │  │  Empty   │────────────►│ In Cart  │────────────►│  Empty   │        │
//! │  │  Cart    │             │          │             │  Cart    │        │
//! │  └──────────┘             └──────────┘             └──────────┘        │
//! │                             │  ▲                                        │
//! │                 add (merge) │  │ update / remove                        │
//! │                             └──┘                                        │
//! │                                                                         │
//! │  Every command answers with the full cart so the caller never needs    │
//! │  a second round trip to redraw.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use serde_json::{json, Map, Value};
use storefront_core::{
    CartLineItem, CartTotals, Currency, EntityId, Money, Notice, ValidationError,
};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::{use_cart, CartView};

/// Cart response including items, totals and the notice of the operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<CartLineItem>,
    pub item_count: u64,
    pub currency: Currency,
    pub totals: CartTotals,
    pub formatted_total: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

impl CartResponse {
    pub fn new(view: CartView, notice: Option<Notice>) -> Self {
        let formatted_total = view.formatted_total();
        CartResponse {
            items: view.items,
            item_count: view.item_count,
            currency: view.currency,
            totals: view.totals,
            formatted_total,
            notice,
        }
    }

    fn with_notice(notice: Notice) -> Self {
        CartResponse::new(use_cart().view(), Some(notice))
    }
}

// =============================================================================
// Add Input
// =============================================================================

/// Item fields given one by one on the command line.
///
/// Prices and quantity stay raw strings here; they go through the same
/// lenient coercion as JSON input.
#[derive(Debug, Clone, Default)]
pub struct ItemFields {
    pub id: String,
    pub title: Option<String>,
    pub price: Option<String>,
    pub price_dollars: Option<String>,
    pub quantity: Option<String>,
    pub variant_id: Option<String>,
    pub sku: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub max_stock: Option<u32>,
    pub image: Option<String>,
}

/// Input for [`add_to_cart`].
#[derive(Debug, Clone)]
pub enum AddItemInput {
    /// A `CartLineItem` JSON document.
    Json(String),
    Fields(ItemFields),
}

impl AddItemInput {
    /// Builds the line item, applying the storage coercion rules.
    pub fn into_item(self) -> ApiResult<CartLineItem> {
        let value = match self {
            AddItemInput::Json(raw) => serde_json::from_str::<Value>(&raw)?,
            AddItemInput::Fields(fields) => fields.into_value()?,
        };
        Ok(serde_json::from_value(value)?)
    }
}

impl ItemFields {
    fn into_value(self) -> ApiResult<Value> {
        if self.id.trim().is_empty() {
            return Err(ApiError::validation("id must not be empty"));
        }

        let mut map = Map::new();
        map.insert("id".into(), json!(EntityId::parse_lenient(&self.id)));

        if let Some(title) = self.title {
            map.insert("title".into(), Value::String(title));
        }
        if let Some(price) = self.price {
            map.insert("price".into(), Value::String(price));
        }
        if let Some(price) = self.price_dollars {
            map.insert("priceDollars".into(), Value::String(price));
        }
        if let Some(quantity) = self.quantity {
            map.insert("quantity".into(), Value::String(quantity));
        }

        match self.variant_id {
            Some(variant_id) => {
                let attributes: Vec<Value> = self
                    .attributes
                    .into_iter()
                    .map(|(name, value)| json!({ "name": name, "value": value }))
                    .collect();
                let mut variant = json!({
                    "id": EntityId::parse_lenient(&variant_id),
                    "attributes": attributes,
                });
                if let Some(sku) = self.sku {
                    variant["sku"] = Value::String(sku);
                }
                map.insert("variant".into(), variant);
            }
            None if self.sku.is_some() || !self.attributes.is_empty() => {
                return Err(ValidationError::InvalidFormat {
                    field: "variant".to_string(),
                    reason: "--sku and --attr need --variant-id".to_string(),
                }
                .into());
            }
            None => {}
        }

        if let Some(max_stock) = self.max_stock {
            map.insert("maxStock".into(), json!(max_stock));
        }
        if let Some(image) = self.image {
            map.insert("image".into(), Value::String(image));
        }

        Ok(Value::Object(map))
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Gets the current cart contents.
pub fn show_cart() -> CartResponse {
    debug!("show_cart command");
    CartResponse::new(use_cart().view(), None)
}

/// Adds an item to the cart.
///
/// ## Behavior
/// - Same id and variant id already in cart: quantities are summed
/// - Otherwise: appended as a new entry
/// - Over the stock ceiling: rejected, error notice
///
/// Only malformed input is an `Err`; cart rule violations come back as
/// the response notice.
pub fn add_to_cart(input: AddItemInput) -> ApiResult<CartResponse> {
    let item = input.into_item()?;
    debug!(id = %item.id, quantity = item.quantity, "add_to_cart command");

    let notice = use_cart().add_to_cart(item);
    Ok(CartResponse::with_notice(notice))
}

/// Removes the entry at zero-based `index`.
pub fn remove_from_cart(index: usize) -> CartResponse {
    debug!(index, "remove_from_cart command");
    CartResponse::with_notice(use_cart().remove_from_cart(index))
}

/// Sets the quantity of the entry at zero-based `index`.
pub fn update_quantity(index: usize, quantity: i64) -> CartResponse {
    debug!(index, quantity, "update_quantity command");
    CartResponse::with_notice(use_cart().update_quantity(index, quantity))
}

/// Empties the cart.
pub fn clear_cart() -> CartResponse {
    debug!("clear_cart command");
    CartResponse::with_notice(use_cart().clear_cart())
}

/// Totals plus their rendered forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsResponse {
    pub item_count: u64,
    pub totals: CartTotals,
    pub formatted: FormattedTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedTotals {
    #[serde(rename = "INR")]
    pub inr: String,
    #[serde(rename = "USD")]
    pub usd: String,
    pub current: String,
}

/// Gets the derived totals.
pub fn totals() -> TotalsResponse {
    debug!("totals command");
    let store = use_cart();
    let totals = store.totals();

    TotalsResponse {
        item_count: store.item_count(),
        formatted: FormattedTotals {
            inr: Currency::Inr.format(totals.inr),
            usd: Currency::Usd.format(totals.usd),
            current: totals.currency.format(totals.current),
        },
        totals,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedPrice {
    pub currency: Currency,
    pub formatted: String,
}

/// Formats a decimal amount in `currency`, or the active currency.
///
/// Unparsable amounts format as zero.
pub fn format_price(amount: &str, currency: Option<Currency>) -> FormattedPrice {
    debug!(amount, ?currency, "format_price command");
    let store = use_cart();
    let currency = currency.unwrap_or_else(|| store.currency());
    let amount = Money::parse_decimal(amount).unwrap_or_default();

    FormattedPrice {
        currency,
        formatted: store.format_price(amount, Some(currency)),
    }
}
