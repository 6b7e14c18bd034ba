//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Storefront prices arrive as JSON numbers or strings:                   │
//! │    price: 1.2   priceDollars: "0.1"                                     │
//! │                                                                         │
//! │  Summed as floats:                                                      │
//! │    0.1 × 3 = 0.30000000000000004  ❌ WRONG!                             │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (paise / cents)                      │
//! │    "0.1" is parsed digit by digit into 10 minor units                   │
//! │    10 × 3 = 30 → "$0.30"                                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::money::Money;
//!
//! let price = Money::parse_decimal("1.2").unwrap();
//! assert_eq!(price.minor(), 120);
//!
//! let line_total = price.multiply_quantity(3);
//! assert_eq!(line_total.minor(), 360);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use ts_rs::TS;

/// Minor units per major unit. Both INR (paise) and USD (cents) use 2 digits.
const MINOR_PER_MAJOR: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: arithmetic stays closed under subtraction; line item
///   prices themselves are always coerced to be non-negative
/// - **Currency-agnostic**: a line item carries one `Money` per currency,
///   so the currency lives next to the value, not inside it
///
/// ## Where Money is Used
/// ```text
/// CartLineItem.price ─────────┬──► × quantity ──► CartTotals.inr
/// CartLineItem.price_dollars ─┘                   CartTotals.usd
///                                                     │
///                                                     ▼
///                                     Currency::format → "₹1,23,456.00"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units (paise, cents).
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(10, 99).minor(), 1099);
    /// assert_eq!(Money::from_major_minor(-5, 50).minor(), -550);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * MINOR_PER_MAJOR - minor)
        } else {
            Money(major * MINOR_PER_MAJOR + minor)
        }
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / MINOR_PER_MAJOR
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % MINOR_PER_MAJOR).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a line item quantity.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(299);
    /// assert_eq!(unit_price.multiply_quantity(3).minor(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: u32) -> Self {
        Money(self.0.saturating_mul(qty as i64))
    }

    // =========================================================================
    // Decimal Parsing
    // =========================================================================

    /// Parses a decimal string into minor units, rounding half-up at the
    /// third fractional digit.
    ///
    /// Returns `None` for anything that is not a plain decimal number.
    /// Exponent notation (`1e3`) is accepted through a float fallback.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("12.345").unwrap().minor(), 1235);
    /// assert_eq!(Money::parse_decimal(" 100 ").unwrap().minor(), 10000);
    /// assert_eq!(Money::parse_decimal(".5").unwrap().minor(), 50);
    /// assert!(Money::parse_decimal("12abc").is_none());
    /// ```
    pub fn parse_decimal(input: &str) -> Option<Money> {
        let s = input.trim();
        if s.is_empty() {
            return None;
        }

        if s.contains(['e', 'E']) {
            return s.parse::<f64>().ok().and_then(Money::from_f64);
        }

        let (negative, unsigned) = match s.as_bytes()[0] {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };

        let (whole, fraction) = match unsigned.split_once('.') {
            Some((w, f)) => (w, f),
            None => (unsigned, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let mut minor: i64 = 0;
        for digit in whole.bytes() {
            minor = minor.checked_mul(10)?.checked_add(i64::from(digit - b'0'))?;
        }
        minor = minor.checked_mul(MINOR_PER_MAJOR)?;

        let mut frac = fraction.bytes().map(|b| i64::from(b - b'0'));
        let tenths = frac.next().unwrap_or(0);
        let hundredths = frac.next().unwrap_or(0);
        let round_up = frac.next().is_some_and(|d| d >= 5);

        minor = minor.checked_add(tenths * 10 + hundredths + i64::from(round_up))?;

        Some(Money(if negative { -minor } else { minor }))
    }

    /// Converts a float in major units, rejecting NaN, infinities and values
    /// outside the i64 range.
    fn from_f64(value: f64) -> Option<Money> {
        if !value.is_finite() {
            return None;
        }
        let minor = (value * MINOR_PER_MAJOR as f64).round();
        if minor >= i64::MIN as f64 && minor <= i64::MAX as f64 {
            Some(Money(minor as i64))
        } else {
            None
        }
    }

    /// Leniently coerces an arbitrary JSON value into a non-negative price.
    ///
    /// ## Rules
    /// - number or numeric string → parsed decimal
    /// - null, bool, array, object, unparsable string → zero
    /// - negative result → zero
    ///
    /// ## Example
    /// ```rust
    /// use serde_json::json;
    /// use storefront_core::money::Money;
    ///
    /// assert_eq!(Money::coerce(&json!(1.2)).minor(), 120);
    /// assert_eq!(Money::coerce(&json!("99.99")).minor(), 9999);
    /// assert_eq!(Money::coerce(&json!("abc")).minor(), 0);
    /// assert_eq!(Money::coerce(&json!(-5)).minor(), 0);
    /// ```
    pub fn coerce(value: &Value) -> Money {
        let parsed = match value {
            Value::Number(n) => match n.as_i64() {
                Some(major) => major.checked_mul(MINOR_PER_MAJOR).map(Money),
                None => Money::parse_decimal(&n.to_string()),
            },
            Value::String(s) => Money::parse_decimal(s),
            _ => None,
        };

        match parsed {
            Some(money) if !money.is_negative() => money,
            _ => Money::zero(),
        }
    }

    // =========================================================================
    // Formatting
    // =========================================================================

    /// Renders the absolute value with the given digit grouping and exactly
    /// two fractional digits. The caller adds sign and currency symbol.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::{Grouping, Money};
    ///
    /// let amount = Money::from_minor(12_345_650);
    /// assert_eq!(amount.format_grouped(Grouping::Thousands), "123,456.50");
    /// assert_eq!(amount.format_grouped(Grouping::Indian), "1,23,456.50");
    /// ```
    pub fn format_grouped(&self, grouping: Grouping) -> String {
        let whole = self.0.unsigned_abs() / MINOR_PER_MAJOR as u64;
        let digits = whole.to_string();
        format!("{}.{:02}", grouping.apply(&digits), self.minor_part())
    }
}

// =============================================================================
// Digit Grouping
// =============================================================================

/// How integer digits are separated when rendering an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// Groups of three: `1,234,567`
    Thousands,

    /// Last three, then groups of two (lakh/crore): `12,34,567`
    Indian,
}

impl Grouping {
    fn apply(self, digits: &str) -> String {
        if digits.len() <= 3 {
            return digits.to_string();
        }

        let (head, tail) = digits.split_at(digits.len() - 3);
        let step = match self {
            Grouping::Thousands => 3,
            Grouping::Indian => 2,
        };

        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 0 {
            let start = end.saturating_sub(step);
            groups.push(&head[start..end]);
            end = start;
        }
        groups.reverse();
        groups.push(tail);
        groups.join(",")
    }
}

// =============================================================================
// Serde Adapter
// =============================================================================

/// Serializes `Money` as a JSON decimal in major units and deserializes any
/// JSON value through [`Money::coerce`].
///
/// This keeps the persisted record shaped as `{"price": 1.2}` while the
/// program only ever handles integer minor units.
///
/// ## Usage
/// ```rust,ignore
/// #[serde(default, with = "crate::money::decimal")]
/// pub price: Money,
/// ```
pub mod decimal {
    use super::{Money, MINOR_PER_MAJOR};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(money: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        if money.minor_part() == 0 {
            serializer.serialize_i64(money.major())
        } else {
            serializer.serialize_f64(money.minor() as f64 / MINOR_PER_MAJOR as f64)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Money::coerce(&value))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering for logs. Use `Currency::format` for display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
