//! # Storefront Cart Library
//!
//! The cart store and its command line front end.
//!
//! ## Module Organization
//! ```text
//! storefront_cart_lib/
//! ├── lib.rs          ◄─── You are here (startup & dispatch)
//! ├── cli.rs          ◄─── clap argument definitions
//! ├── output.rs       ◄─── human / JSON rendering
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── cart.rs     ◄─── CartState (the cart store)
//! │   ├── provider.rs ◄─── CartProvider scope + use_cart()
//! │   ├── storage.rs  ◄─── Backend selection and shutdown
//! │   └── config.rs   ◄─── Configuration state
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command exports
//! │   ├── cart.rs     ◄─── Cart manipulation commands
//! │   ├── currency.rs ◄─── Currency commands
//! │   └── config.rs   ◄─── Config commands
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod state;

use std::sync::Arc;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, ConfigCommand, CurrencyCommand};
use error::ApiResult;
use output::Output;
use state::{CartProvider, CartState, ConfigState, StorageState};

/// Runs one CLI invocation.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Invocation                                        │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter, written to stderr             │
/// │     • Default: info,storefront=debug,sqlx=warn (RUST_LOG overrides)     │
/// │                                                                         │
/// │  2. Load Configuration ───────────────────────────────────────────────► │
/// │     • defaults → storefront.toml → STOREFRONT_* environment            │
/// │                                                                         │
/// │  3. Open Storage ─────────────────────────────────────────────────────► │
/// │     • memory / file / sqlite (write-behind)                             │
/// │                                                                         │
/// │  4. Load the Cart Store ──────────────────────────────────────────────► │
/// │     • corrupt saved cart → empty cart                                   │
/// │                                                                         │
/// │  5. Dispatch inside CartProvider::scope ──────────────────────────────► │
/// │                                                                         │
/// │  6. Shut Storage Down ────────────────────────────────────────────────► │
/// │     • waits for queued SQLite writes                                    │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(cli: Cli) -> ApiResult<()> {
    init_tracing(cli.verbose);

    let output = Output::new(cli.json);
    let config = ConfigState::load(cli.config.as_deref())?;

    if let Command::Config(action) = &cli.command {
        run_config(*action, &config, &cli, output);
        return Ok(());
    }

    let storage = StorageState::open(&config).await?;
    let store = Arc::new(CartState::load(
        storage.shared(),
        config.display.default_currency,
    ));
    info!(session = %store.session_id(), "Cart store ready");

    let result = CartProvider::scope(store, || dispatch(cli.command, output));

    storage.shutdown().await?;
    debug!("Storage shut down");
    result
}

/// Executes a cart command against the store installed by the caller.
pub fn dispatch(command: Command, output: Output) -> ApiResult<()> {
    match command {
        Command::Show => output.cart(&commands::cart::show_cart()),
        Command::Add(args) => output.cart(&commands::cart::add_to_cart(args.into())?),
        Command::Remove { index } => output.cart(&commands::cart::remove_from_cart(index)),
        Command::Update { index, quantity } => {
            output.cart(&commands::cart::update_quantity(index, quantity))
        }
        Command::Clear => output.cart(&commands::cart::clear_cart()),
        Command::Totals => output.totals(&commands::cart::totals()),
        Command::Format { amount, currency } => {
            let price = commands::cart::format_price(&amount, currency);
            if output.is_json() {
                output.json(&price);
            } else {
                println!("{}", price.formatted);
            }
        }
        Command::Currency(CurrencyCommand::Show) => {
            let currency = commands::currency::show_currency();
            if output.is_json() {
                output.json(&currency);
            } else {
                println!("{} ({})", currency.currency, currency.symbol);
            }
        }
        Command::Currency(CurrencyCommand::Toggle) => {
            output.cart(&commands::currency::toggle_currency())
        }
        Command::Config(action) => {
            return Err(error::ApiError::internal(format!(
                "config {:?} does not use the cart store",
                action
            )))
        }
    }
    Ok(())
}

fn run_config(action: ConfigCommand, config: &ConfigState, cli: &Cli, output: Output) {
    match action {
        ConfigCommand::Show => {
            let config = commands::config::show_config(config);
            if output.is_json() {
                output.json(&config);
            } else {
                match toml::to_string_pretty(&config) {
                    Ok(text) => print!("{}", text),
                    Err(e) => output.error(&e.into()),
                }
            }
        }
        ConfigCommand::Path => {
            let paths = commands::config::config_paths(config, cli.config.as_deref());
            if output.is_json() {
                output.json(&paths);
            } else {
                let file = paths
                    .config_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(none)".to_string());
                let marker = if paths.config_file_exists { "" } else { " (not found)" };
                output.kv("Config file", &format!("{}{}", file, marker));
                output.kv("Data dir", &paths.data_dir.display().to_string());
            }
        }
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=storefront=trace` - Show trace for storefront crates only
/// - Default: INFO, or DEBUG with `--verbose`
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "debug,sqlx=warn"
    } else {
        "info,storefront=debug,sqlx=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (e.g. run() called twice in one process) keeps the first
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
