//! Output formatting for the CLI.
//!
//! Results go to stdout, diagnostics to stderr. With `--json` every result
//! is a single pretty-printed JSON document.

use serde::Serialize;
use storefront_core::{Notice, NoticeLevel};

use crate::commands::cart::{CartResponse, TotalsResponse};
use crate::error::ApiError;

/// Output handler for CLI messages.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Print JSON output.
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("✗ could not render output: {}", e),
        }
    }

    /// Print an error message.
    pub fn error(&self, err: &ApiError) {
        if self.json {
            match serde_json::to_string(err) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!(r#"{{"error": "{}"}}"#, err.message.replace('"', "\\\"")),
            }
            return;
        }
        eprintln!("✗ {}", err.message);
    }

    /// Print a notice. Error notices go to stderr.
    pub fn notice(&self, notice: &Notice) {
        if self.json {
            return;
        }
        match notice.level {
            NoticeLevel::Success => println!("✓ {}", notice.message),
            NoticeLevel::Info => println!("ℹ {}", notice.message),
            NoticeLevel::Error => eprintln!("✗ {}", notice.message),
        }
    }

    /// Print a key-value pair.
    pub fn kv(&self, key: &str, value: &str) {
        if self.json {
            return;
        }
        println!("  {}: {}", key, value);
    }

    /// Print a cart response.
    pub fn cart(&self, response: &CartResponse) {
        if self.json {
            self.json(response);
            return;
        }

        if let Some(notice) = &response.notice {
            self.notice(notice);
        }

        for line in render_cart(response) {
            println!("{}", line);
        }
    }

    pub fn totals(&self, response: &TotalsResponse) {
        if self.json {
            self.json(response);
            return;
        }
        self.kv("Items", &response.item_count.to_string());
        self.kv("INR", &response.formatted.inr);
        self.kv("USD", &response.formatted.usd);
        self.kv("Current", &response.formatted.current);
    }
}

/// Human-readable cart table.
///
/// ```text
///   #  Item                          Qty          Total
///   0  Linen Shirt (Size: M)           2      ₹2,998.00
///   ──────────────────────────────────────────────────
///      3 items                                ₹3,497.00
/// ```
pub fn render_cart(response: &CartResponse) -> Vec<String> {
    if response.items.is_empty() {
        return vec!["  Cart is empty".to_string()];
    }

    let mut lines = Vec::with_capacity(response.items.len() + 3);
    lines.push(format!("  {:>2}  {:<28} {:>4} {:>14}", "#", "Item", "Qty", "Total"));

    for (index, item) in response.items.iter().enumerate() {
        let total = response.currency.format(item.line_total(response.currency));
        lines.push(format!(
            "  {:>2}  {:<28} {:>4} {:>14}",
            index,
            truncate(&item.display_name(), 28),
            item.quantity,
            total
        ));
    }

    lines.push(format!("  {}", "─".repeat(52)));
    let units = if response.item_count == 1 { "item" } else { "items" };
    lines.push(format!(
        "      {:<28} {:>19}",
        format!("{} {}", response.item_count, units),
        response.formatted_total
    ));
    lines
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::{Cart, CartLineItem, Currency, Money};

    fn response(items: Vec<CartLineItem>) -> CartResponse {
        let cart = Cart::from_items(items);
        let totals = cart.totals(Currency::Inr);
        CartResponse {
            items: cart.items().to_vec(),
            item_count: cart.item_count(),
            currency: Currency::Inr,
            formatted_total: Currency::Inr.format(totals.current),
            totals,
            notice: None,
        }
    }

    #[test]
    fn test_empty_cart() {
        assert_eq!(render_cart(&response(vec![])), vec!["  Cart is empty"]);
    }

    #[test]
    fn test_cart_table() {
        let lines = render_cart(&response(vec![CartLineItem::new(1, "Linen Shirt")
            .with_prices(Money::from_minor(149_900), Money::from_minor(1_799))
            .with_quantity(2)]));

        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("Linen Shirt"));
        assert!(lines[1].contains("₹2,998.00"));
        assert!(lines[3].contains("2 items"));
        assert!(lines[3].ends_with("₹2,998.00"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long product name", 8), "a very …");
    }
}
