//! # Command Line
//!
//! clap definitions for `storefront-cart`.
//!
//! ```text
//! storefront-cart [--json] [--verbose] [--config <path>] <command>
//!
//!   show                              current cart
//!   add --id <id> [--price ..] ...    add or merge an item
//!   add --item '<CartLineItem JSON>'  same, from a JSON document
//!   remove <index>                    drop the entry at a position
//!   update <index> <quantity>         set an entry's quantity
//!   clear                             empty the cart
//!   totals                            INR / USD / current totals
//!   format <amount> [--currency X]    render an amount
//!   currency show | toggle            display currency
//!   config show | path                effective configuration
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use storefront_core::Currency;

use crate::commands::cart::{AddItemInput, ItemFields};

/// Storefront cart - manage the shopping cart from the terminal
#[derive(Debug, Parser)]
#[command(name = "storefront-cart")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the cart
    Show,

    /// Add an item (merges with an existing entry of the same id and variant)
    Add(AddArgs),

    /// Remove the entry at a zero-based position
    Remove {
        index: usize,
    },

    /// Set the quantity of the entry at a zero-based position
    Update {
        index: usize,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },

    /// Empty the cart
    Clear,

    /// Show totals in both currencies
    Totals,

    /// Format an amount as a price
    Format {
        #[arg(allow_negative_numbers = true)]
        amount: String,

        /// INR or USD (defaults to the active currency)
        #[arg(long)]
        currency: Option<Currency>,
    },

    /// Display currency
    #[command(subcommand)]
    Currency(CurrencyCommand),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum CurrencyCommand {
    /// Show the active currency
    Show,

    /// Switch between INR and USD
    Toggle,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Print the config file and data directory locations
    Path,
}

/// Arguments of `add`.
#[derive(Debug, Clone, Args)]
pub struct AddArgs {
    /// Whole item as JSON, e.g. '{"id":1,"price":100,"quantity":2}'
    #[arg(long, value_name = "JSON", conflicts_with_all = ["id", "title", "price", "price_dollars", "quantity", "variant_id", "sku", "attr", "max_stock", "image"])]
    pub item: Option<String>,

    /// Product id (digits become a numeric id)
    #[arg(long, required_unless_present = "item")]
    pub id: Option<String>,

    #[arg(long)]
    pub title: Option<String>,

    /// Unit price in INR
    #[arg(long)]
    pub price: Option<String>,

    /// Unit price in USD
    #[arg(long)]
    pub price_dollars: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    pub quantity: Option<String>,

    #[arg(long)]
    pub variant_id: Option<String>,

    /// Variant SKU (needs --variant-id)
    #[arg(long)]
    pub sku: Option<String>,

    /// Variant attribute as name=value; repeatable (needs --variant-id)
    #[arg(long = "attr", value_parser = parse_attribute)]
    pub attr: Vec<(String, String)>,

    /// Stock ceiling for this item
    #[arg(long)]
    pub max_stock: Option<u32>,

    #[arg(long)]
    pub image: Option<String>,
}

impl From<AddArgs> for AddItemInput {
    fn from(args: AddArgs) -> Self {
        if let Some(json) = args.item {
            return AddItemInput::Json(json);
        }
        AddItemInput::Fields(ItemFields {
            id: args.id.unwrap_or_default(),
            title: args.title,
            price: args.price,
            price_dollars: args.price_dollars,
            quantity: args.quantity,
            variant_id: args.variant_id,
            sku: args.sku,
            attributes: args.attr,
            max_stock: args.max_stock,
            image: args.image,
        })
    }
}

fn parse_attribute(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected name=value, got '{}'", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_fields() {
        let cli = Cli::try_parse_from([
            "storefront-cart",
            "add",
            "--id",
            "7",
            "--price",
            "1499",
            "--variant-id",
            "blue-m",
            "--attr",
            "Size=M",
            "--attr",
            "Color = Blue",
        ])
        .unwrap();

        let Command::Add(args) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(args.id.as_deref(), Some("7"));
        assert_eq!(
            args.attr,
            vec![
                ("Size".to_string(), "M".to_string()),
                ("Color".to_string(), "Blue".to_string())
            ]
        );
    }

    #[test]
    fn test_add_requires_id_or_json() {
        assert!(Cli::try_parse_from(["storefront-cart", "add"]).is_err());
        assert!(Cli::try_parse_from(["storefront-cart", "add", "--item", "{}", "--id", "1"]).is_err());
        assert!(Cli::try_parse_from(["storefront-cart", "add", "--item", "{}"]).is_ok());
    }

    #[test]
    fn test_global_flags_and_negative_quantity() {
        let cli = Cli::try_parse_from(["storefront-cart", "update", "0", "-1", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Command::Update { index: 0, quantity: -1 }));

        let cli = Cli::try_parse_from(["storefront-cart", "format", "10", "--currency", "usd"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Format { currency: Some(Currency::Usd), .. }
        ));
    }

    #[test]
    fn test_parse_attribute() {
        assert!(parse_attribute("Size").is_err());
        assert!(parse_attribute("=M").is_err());
        assert_eq!(parse_attribute("Size=").unwrap(), ("Size".to_string(), String::new()));
    }
}
