//! # Domain Types
//!
//! Core domain types of the storefront cart.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CartLineItem   │   │   CartVariant   │   │    Currency     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (EntityId)  │──►│  id (EntityId)  │   │  INR (default)  │       │
//! │  │  title          │   │  sku            │   │  USD            │       │
//! │  │  price (INR)    │   │  attributes     │   └─────────────────┘       │
//! │  │  priceDollars   │   └─────────────────┘                              │
//! │  │  quantity       │                         ┌─────────────────┐       │
//! │  │  maxStock       │                         │     Notice      │       │
//! │  │  image          │                         │  ─────────────  │       │
//! │  └─────────────────┘                         │  level, message │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Persisted Shape
//! `CartLineItem` is exactly the record stored under the `cart` key, so its
//! serde attributes define the storage contract:
//! ```json
//! {"id":1,"title":"Linen Shirt","price":1499,"priceDollars":17.99,
//!  "quantity":2,"variant":{"id":"L-BLUE","sku":"LS-L-BL",
//!  "attributes":[{"name":"Size","value":"L"}]},"maxStock":5}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{self, Grouping, Money};

/// Title used when an incoming item has none.
pub const DEFAULT_TITLE: &str = "Product";

// =============================================================================
// Identifiers
// =============================================================================

/// Product or variant identifier.
///
/// Storefront ids arrive either as database integers or as opaque strings.
/// Equality is strict: `1` and `"1"` are different ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Number(n) => write!(f, "{}", n),
            EntityId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        EntityId::Number(value)
    }
}

impl From<i32> for EntityId {
    fn from(value: i32) -> Self {
        EntityId::Number(i64::from(value))
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId::Text(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        EntityId::Text(value)
    }
}

impl EntityId {
    /// Parses command-line input: all-digit input becomes a number id.
    pub fn parse_lenient(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed.parse::<i64>() {
            Ok(n) => EntityId::Number(n),
            Err(_) => EntityId::Text(trimmed.to_string()),
        }
    }
}

// =============================================================================
// Currency
// =============================================================================

/// Display currency of the cart.
///
/// Every line item carries a price in both currencies, so switching the
/// currency never touches item data; it only selects which total is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Currency {
    #[default]
    #[serde(rename = "INR")]
    Inr,

    #[serde(rename = "USD")]
    Usd,
}

impl Currency {
    /// The other currency.
    pub const fn toggle(self) -> Self {
        match self {
            Currency::Inr => Currency::Usd,
            Currency::Usd => Currency::Inr,
        }
    }

    /// ISO 4217 code, also the persisted `preferredCurrency` value.
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Currency::Inr => "₹",
            Currency::Usd => "$",
        }
    }

    /// Digit grouping of the currency's home locale (en-IN / en-US).
    pub const fn grouping(self) -> Grouping {
        match self {
            Currency::Inr => Grouping::Indian,
            Currency::Usd => Grouping::Thousands,
        }
    }

    /// Renders an amount as a currency string.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::{Currency, Money};
    ///
    /// assert_eq!(Currency::Inr.format(Money::from_minor(12_345_650)), "₹1,23,456.50");
    /// assert_eq!(Currency::Usd.format(Money::from_minor(12_345_650)), "$123,456.50");
    /// assert_eq!(Currency::Usd.format(Money::zero()), "$0.00");
    /// ```
    pub fn format(self, amount: Money) -> String {
        if amount.is_zero() {
            return format!("{}0.00", self.symbol());
        }
        let sign = if amount.is_negative() { "-" } else { "" };
        format!("{}{}{}", sign, self.symbol(), amount.format_grouped(self.grouping()))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INR" => Ok(Currency::Inr),
            "USD" => Ok(Currency::Usd),
            _ => Err(ValidationError::NotAllowed {
                field: "currency".to_string(),
                allowed: vec!["INR".to_string(), "USD".to_string()],
            }),
        }
    }
}

// =============================================================================
// Variant
// =============================================================================

/// One attribute binding of a variant, e.g. `Size = L`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VariantAttribute {
    pub name: String,
    pub value: String,
}

/// A specific attribute-bound configuration of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartVariant {
    /// Variant identity; drives the line item identity rule.
    pub id: EntityId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub sku: Option<String>,

    #[serde(default)]
    pub attributes: Vec<VariantAttribute>,
}

impl CartVariant {
    pub fn new(id: impl Into<EntityId>) -> Self {
        CartVariant {
            id: id.into(),
            sku: None,
            attributes: Vec::new(),
        }
    }

    /// Human label such as `Size: L, Color: Blue`.
    pub fn label(&self) -> String {
        self.attributes
            .iter()
            .map(|a| format!("{}: {}", a.name, a.value))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// =============================================================================
// Cart Line Item
// =============================================================================

/// One product (or product variant) selection in the cart.
///
/// ## Coercion on the way in
/// Deserialization never fails on bad price or quantity data:
/// - `price` / `priceDollars`: see [`Money::coerce`]; invalid → 0
/// - `quantity`: absent, zero or non-numeric → 1
/// - `title`: absent, null or blank → `"Product"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLineItem {
    pub id: EntityId,

    #[serde(default = "default_title", deserialize_with = "lenient_title")]
    pub title: String,

    /// Unit price in INR.
    #[serde(default, with = "money::decimal")]
    #[ts(type = "number")]
    pub price: Money,

    /// Unit price in USD.
    #[serde(default, with = "money::decimal")]
    #[ts(type = "number")]
    pub price_dollars: Money,

    #[serde(default = "default_quantity", deserialize_with = "lenient_quantity")]
    pub quantity: u32,

    /// A variant without a usable `id` is dropped, leaving the base product.
    #[serde(
        default,
        deserialize_with = "lenient_variant",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(optional)]
    pub variant: Option<CartVariant>,

    /// Upper bound on `quantity`, attached by the caller. Numeric strings
    /// are accepted; anything else means no ceiling.
    #[serde(
        default,
        deserialize_with = "lenient_max_stock",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(optional)]
    pub max_stock: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub image: Option<String>,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_quantity() -> u32 {
    1
}

fn lenient_title<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(match value {
        Some(title) if !title.trim().is_empty() => title,
        _ => default_title(),
    })
}

fn lenient_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_quantity(&value))
}

fn lenient_variant<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<CartVariant>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(CartVariant::deserialize(value).ok())
}

fn lenient_max_stock<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_max_stock(&value))
}

/// Coerces a JSON value into a stock ceiling. Unparsable input is no ceiling.
pub fn coerce_max_stock(value: &Value) -> Option<u32> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;

    Some(u32::try_from(parsed).unwrap_or(u32::MAX))
}

/// Coerces a JSON value into a line item quantity (minimum 1).
pub fn coerce_quantity(value: &Value) -> u32 {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    match parsed {
        Some(0) | None => 1,
        Some(n) => u32::try_from(n).unwrap_or(u32::MAX),
    }
}

impl CartLineItem {
    /// Creates a base-product line item with quantity 1 and zero prices.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::{CartLineItem, Money};
    ///
    /// let item = CartLineItem::new(1, "Linen Shirt")
    ///     .with_prices(Money::from_minor(149_900), Money::from_minor(1_799))
    ///     .with_quantity(2);
    /// assert_eq!(item.line_total_inr().minor(), 299_800);
    /// ```
    pub fn new(id: impl Into<EntityId>, title: impl Into<String>) -> Self {
        let title = title.into();
        CartLineItem {
            id: id.into(),
            title: if title.trim().is_empty() { default_title() } else { title },
            price: Money::zero(),
            price_dollars: Money::zero(),
            quantity: 1,
            variant: None,
            max_stock: None,
            image: None,
        }
    }

    pub fn with_prices(mut self, inr: Money, usd: Money) -> Self {
        self.price = inr;
        self.price_dollars = usd;
        self
    }

    /// Sets the quantity; zero is coerced to 1.
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity.max(1);
        self
    }

    pub fn with_variant(mut self, variant: CartVariant) -> Self {
        self.variant = Some(variant);
        self
    }

    pub fn with_max_stock(mut self, max_stock: u32) -> Self {
        self.max_stock = Some(max_stock);
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Line item identity rule.
    ///
    /// Same `id`, and either both base products or both variants with the
    /// same variant id.
    pub fn same_entry(&self, other: &CartLineItem) -> bool {
        if self.id != other.id {
            return false;
        }
        match (&self.variant, &other.variant) {
            (None, None) => true,
            (Some(a), Some(b)) => a.id == b.id,
            _ => false,
        }
    }

    /// Unit price in the given currency.
    pub fn unit_price(&self, currency: Currency) -> Money {
        match currency {
            Currency::Inr => self.price,
            Currency::Usd => self.price_dollars,
        }
    }

    pub fn line_total(&self, currency: Currency) -> Money {
        self.unit_price(currency).multiply_quantity(self.quantity)
    }

    pub fn line_total_inr(&self) -> Money {
        self.line_total(Currency::Inr)
    }

    pub fn line_total_usd(&self) -> Money {
        self.line_total(Currency::Usd)
    }

    /// Title with the variant label appended, for notices.
    pub fn display_name(&self) -> String {
        match &self.variant {
            Some(variant) if !variant.attributes.is_empty() => {
                format!("{} ({})", self.title, variant.label())
            }
            _ => self.title.clone(),
        }
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Derived totals over the whole cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    #[serde(rename = "INR", with = "money::decimal")]
    #[ts(type = "number")]
    pub inr: Money,

    #[serde(rename = "USD", with = "money::decimal")]
    #[ts(type = "number")]
    pub usd: Money,

    /// Total in the active currency.
    #[serde(with = "money::decimal")]
    #[ts(type = "number")]
    pub current: Money,

    pub currency: Currency,
}

// =============================================================================
// Notice
// =============================================================================

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A toast-style message produced by every cart store operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Notice {
            level,
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Notice::new(NoticeLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Notice::new(NoticeLevel::Info, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice::new(NoticeLevel::Error, message)
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_coerces_fields() {
        let item: CartLineItem = serde_json::from_value(json!({
            "id": 7,
            "price": "abc",
            "priceDollars": "1.20",
            "quantity": 0,
        }))
        .unwrap();

        assert_eq!(item.id, EntityId::Number(7));
        assert_eq!(item.title, "Product");
        assert!(item.price.is_zero());
        assert_eq!(item.price_dollars.minor(), 120);
        assert_eq!(item.quantity, 1);
        assert!(item.variant.is_none());
    }

    #[test]
    fn test_null_title_defaults() {
        let item: CartLineItem =
            serde_json::from_value(json!({"id": "sku-1", "title": null})).unwrap();
        assert_eq!(item.title, "Product");
        assert_eq!(item.id, EntityId::Text("sku-1".to_string()));
    }

    #[test]
    fn test_serialized_shape() {
        let item = CartLineItem::new(1, "Tee")
            .with_prices(Money::from_minor(10_000), Money::from_minor(120))
            .with_quantity(2)
            .with_max_stock(5);

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 1,
                "title": "Tee",
                "price": 100,
                "priceDollars": 1.2,
                "quantity": 2,
                "maxStock": 5,
            })
        );
    }

    #[test]
    fn test_identity_rule() {
        let base = CartLineItem::new(1, "Tee");
        let variant_a = CartLineItem::new(1, "Tee").with_variant(CartVariant::new("A"));
        let variant_a2 = CartLineItem::new(1, "Tee").with_variant(CartVariant::new("A"));
        let variant_b = CartLineItem::new(1, "Tee").with_variant(CartVariant::new("B"));
        let other = CartLineItem::new(2, "Tee");
        let text_id = CartLineItem::new("1", "Tee");

        assert!(base.same_entry(&CartLineItem::new(1, "Renamed")));
        assert!(variant_a.same_entry(&variant_a2));
        assert!(!variant_a.same_entry(&variant_b));
        assert!(!base.same_entry(&variant_a));
        assert!(!base.same_entry(&other));
        assert!(!base.same_entry(&text_id));
    }

    #[test]
    fn test_coerce_quantity() {
        assert_eq!(coerce_quantity(&json!(3)), 3);
        assert_eq!(coerce_quantity(&json!("4")), 4);
        assert_eq!(coerce_quantity(&json!(0)), 1);
        assert_eq!(coerce_quantity(&json!(-2)), 1);
        assert_eq!(coerce_quantity(&json!(2.5)), 1);
        assert_eq!(coerce_quantity(&json!(null)), 1);
    }

    #[test]
    fn test_coerce_max_stock() {
        assert_eq!(coerce_max_stock(&json!(5)), Some(5));
        assert_eq!(coerce_max_stock(&json!(" 5 ")), Some(5));
        assert_eq!(coerce_max_stock(&json!("lots")), None);
        assert_eq!(coerce_max_stock(&json!(-1)), None);
        assert_eq!(coerce_max_stock(&json!(null)), None);
    }

    #[test]
    fn test_loose_optional_fields_do_not_fail_the_item() {
        let item: CartLineItem = serde_json::from_value(json!({
            "id": 2,
            "title": "Mug",
            "maxStock": "5",
            "variant": {"sku": "X", "attributes": []},
        }))
        .unwrap();

        assert_eq!(item.max_stock, Some(5));
        assert!(item.variant.is_none());

        let item: CartLineItem = serde_json::from_value(json!({
            "id": 3,
            "maxStock": {"count": 5},
            "variant": "large",
        }))
        .unwrap();
        assert_eq!(item.max_stock, None);
        assert!(item.variant.is_none());

        let item: CartLineItem = serde_json::from_value(json!({
            "id": 4,
            "variant": {"id": "L", "attributes": [{"name": "Size", "value": "L"}]},
        }))
        .unwrap();
        assert_eq!(item.variant.map(|v| v.id), Some(EntityId::from("L")));
    }

    #[test]
    fn test_currency_parse_and_toggle() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!(" INR ".parse::<Currency>().unwrap(), Currency::Inr);
        assert!("EUR".parse::<Currency>().is_err());
        assert_eq!(Currency::Inr.toggle(), Currency::Usd);
        assert_eq!(Currency::default(), Currency::Inr);
        assert_eq!(serde_json::to_string(&Currency::Usd).unwrap(), r#""USD""#);
    }

    #[test]
    fn test_currency_format() {
        assert_eq!(Currency::Inr.format(Money::zero()), "₹0.00");
        assert_eq!(Currency::Usd.format(Money::zero()), "$0.00");
        assert_eq!(Currency::Inr.format(Money::from_minor(50_000)), "₹500.00");
        assert_eq!(Currency::Usd.format(Money::from_minor(600)), "$6.00");
        assert_eq!(Currency::Inr.format(Money::from_minor(-150)), "-₹1.50");
    }

    #[test]
    fn test_display_name_includes_variant() {
        let mut variant = CartVariant::new("L-BLUE");
        variant.attributes.push(VariantAttribute {
            name: "Size".to_string(),
            value: "L".to_string(),
        });
        let item = CartLineItem::new(1, "Linen Shirt").with_variant(variant);
        assert_eq!(item.display_name(), "Linen Shirt (Size: L)");
    }
}
