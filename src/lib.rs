//! # nexus-dex-rs
//!
//! Trading core for the peer-to-peer token market on a Nexus node.
//! Normalizes ledger order records into a consistent base/quote view, keeps the
//! active order book, resolves the wallet accounts each trade draws from and
//! ranks token search results.
//!
//! ## Modules
//!
//! | Module | Role |
//! |--------|------|
//! | `units` | Display / wire unit conversion (NXS is stored in 1e-6 units) |
//! | `normalize` | Raw ledger order → `NormalizedOrder` for a pair |
//! | `book` | Bid / ask ordering, best prices |
//! | `accounts` | Source and destination account per trade leg |
//! | `pairs` | Pair registry, active pair, refresh tickets |
//! | `search` | Token relevance scoring and sorting |
//! | `nexus` | HTTP client for the node API |
//! | `trader` | State coordinator used by front ends |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use nexus_dex_rs::{Config, NexusApi, Side, Trader};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let api = NexusApi::from_config(&config)?;
//!     let trader = Trader::new(Arc::new(api), config);
//!
//!     trader.select_pair("GOLD/NXS")?;
//!     let book = trader.refresh_order_book().await?;
//!     if let Some(ask) = book.best_ask() {
//!         println!("best ask {} NXS for {} GOLD", ask.price, ask.base_amount);
//!     }
//!
//!     let receipt = trader.create_order(Side::Bid, "2.5", "0.25").await?;
//!     println!("submitted {}", receipt.txid);
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Order book for a pair
//! cargo run --release -- book GOLD/NXS
//!
//! # Search tokens, most recently modified first
//! cargo run --release -- search gold --sort modified --desc
//!
//! # Place a bid of 2.5 GOLD at 0.25 NXS each
//! cargo run --release -- create GOLD/NXS bid 2.5 0.25
//!
//! # Keep refreshing a book until Ctrl-C
//! cargo run --release -- watch GOLD/NXS
//! ```

pub mod accounts;
pub mod book;
pub mod cache;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod nexus;
pub mod normalize;
pub mod pairs;
pub mod search;
pub mod trader;
pub mod units;
pub mod utils;

pub use accounts::{AccountPreference, OrderAccounts, TradeIntent};
pub use cache::{load_from_file, save_to_file, TokenCatalog};
pub use config::Config;
pub use error::{DexError, Result};
pub use ledger::{LedgerApi, OrderRequest};
pub use models::{Account, NormalizedOrder, OrderBook, RawOrder, RawOrderBook, Side, Token, TradingPair};
pub use nexus::NexusApi;
pub use search::{SearchableToken, SortDirection, SortKey};
pub use trader::{OrderReceipt, PollOutcome, Trader};
