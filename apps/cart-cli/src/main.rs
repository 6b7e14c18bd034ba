//! # Storefront Cart Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        storefront-cart                                  │
//! │                                                                         │
//! │  main.rs ────► parse arguments, start the tokio runtime                │
//! │                                                                         │
//! │  lib.rs ─────► logging, config, storage, cart store, dispatch          │
//! │                                                                         │
//! │  commands/ ──► show, add, remove, update, clear, totals, format,      │
//! │                currency, config                                        │
//! │                                                                         │
//! │  state/ ─────► CartState, CartProvider, StorageState, ConfigState      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Exit status is 1 when the command could not run at all (bad config,
//! storage won't open, malformed input). Rejected cart operations still
//! exit 0 and report through their notice.

use clap::Parser;

use storefront_cart_lib::cli::Cli;
use storefront_cart_lib::output::Output;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let output = Output::new(cli.json);

    if let Err(e) = storefront_cart_lib::run(cli).await {
        output.error(&e);
        std::process::exit(1);
    }
}
