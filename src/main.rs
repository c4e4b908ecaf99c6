use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use nexus_dex_rs::{
    AccountPreference, Config, NexusApi, Side, SortDirection, SortKey, TokenCatalog, Trader,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_CATALOG: &str = "tokens_catalog.json";

#[derive(Parser, Debug)]
#[command(name = "nexus-dex")]
#[command(about = "Order books, token search and order entry for the Nexus P2P market", long_about = None)]
struct Args {
    /// JSON config file; missing fields use defaults
    #[arg(long, global = true)]
    config: Option<String>,

    /// Node API base URL, overrides the config file
    #[arg(long, env = "NEXUS_API_URL", global = true)]
    api_url: Option<String>,

    /// Token catalog used to seed search
    #[arg(long, global = true)]
    catalog: Option<String>,

    /// Trade from this account name or address instead of the largest balance
    #[arg(long, global = true)]
    account: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the normalized order book for a pair, e.g. GOLD/NXS
    Book { pair: String },
    /// Print your own open orders on a pair
    Mine { pair: String },
    /// Print recently executed orders on a pair
    Trades { pair: String },
    /// Search tokens by ticker, name or address
    Search {
        #[arg(default_value = "")]
        query: String,
        /// ticker, supply, max_supply or modified
        #[arg(long, default_value = "ticker")]
        sort: String,
        #[arg(long, default_value_t = false)]
        desc: bool,
    },
    /// List cross pairs for the given tickers, or pairs from your holdings
    Pairs { tickers: Vec<String> },
    /// List wallet accounts
    Accounts,
    /// Place a limit order: amount of base at price in quote per base
    Create {
        pair: String,
        side: String,
        amount: String,
        price: String,
    },
    /// Fill an order from a pair's book
    Execute { pair: String, txid: String },
    /// Cancel one of your orders
    Cancel {
        txid: String,
        #[arg(long)]
        pair: Option<String>,
    },
    /// Fetch every token and save the catalog file
    Catalog,
    /// Keep refreshing a pair's book until Ctrl-C
    Watch { pair: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(url) = &args.api_url {
        config.api_url = url.clone();
    }
    config.validate()?;
    Ok(config)
}

fn load_catalog(path: &str) -> Option<TokenCatalog> {
    if !std::path::Path::new(path).exists() {
        return None;
    }
    match TokenCatalog::load(path) {
        Ok(catalog) => Some(catalog),
        Err(e) => {
            warn!("ignoring token catalog: {:#}", e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".to_string().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let catalog_path = args.catalog.clone().unwrap_or_else(|| DEFAULT_CATALOG.to_string());

    let api = NexusApi::from_config(&config)?;
    let mut trader = Trader::new(Arc::new(api), config);
    if let Some(account) = &args.account {
        trader = trader.with_preference(AccountPreference::Named(account.clone()));
    }
    if let Some(catalog) = load_catalog(&catalog_path) {
        trader = trader.with_catalog(catalog);
    }

    match args.command {
        Command::Book { pair } => {
            trader.select_pair(&pair)?;
            print_json(&trader.refresh_order_book().await?)?;
        }
        Command::Mine { pair } => {
            trader.select_pair(&pair)?;
            print_json(&trader.refresh_user_orders().await?)?;
        }
        Command::Trades { pair } => {
            trader.select_pair(&pair)?;
            print_json(&trader.refresh_recent_trades().await?)?;
        }
        Command::Search { query, sort, desc } => {
            let key: SortKey = sort.parse()?;
            let direction = if desc {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            let results = trader.search_tokens(&query, key, direction).await?;
            eprintln!("Found {} token(s).", results.len());
            print_json(&results)?;
        }
        Command::Pairs { tickers } => {
            let added = if tickers.is_empty() {
                trader.add_holding_pairs().await?
            } else {
                trader.add_cross_pairs(&tickers)?
            };
            eprintln!("Registered {} pair(s).", added);
            print_json(&trader.pairs())?;
        }
        Command::Accounts => {
            print_json(&trader.refresh_accounts().await)?;
        }
        Command::Create {
            pair,
            side,
            amount,
            price,
        } => {
            let side: Side = side.parse()?;
            trader.select_pair(&pair)?;
            let receipt = trader.create_order(side, &amount, &price).await?;
            for warning in &receipt.warnings {
                warn!("{}", warning);
            }
            print_json(&receipt)?;
        }
        Command::Execute { pair, txid } => {
            trader.select_pair(&pair)?;
            trader.refresh_order_book().await?;
            let receipt = trader.execute_order(&txid).await?;
            for warning in &receipt.warnings {
                warn!("{}", warning);
            }
            print_json(&receipt)?;
        }
        Command::Cancel { txid, pair } => {
            if let Some(pair) = pair {
                trader.select_pair(&pair)?;
            }
            print_json(&trader.cancel_order(&txid).await?)?;
        }
        Command::Catalog => {
            let catalog = trader.discover_catalog().await?;
            catalog.save(&catalog_path)?;
            eprintln!(
                "Exported {} tokens to {}",
                catalog.tokens.len(),
                catalog_path
            );
        }
        Command::Watch { pair } => {
            trader.select_pair(&pair)?;
            let trader = Arc::new(trader);
            let cancel = CancellationToken::new();
            let handle = trader.spawn_auto_refresh(cancel.clone());
            info!(pair = %pair, interval_ms = trader.config().poll_interval_ms, "watching, Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
            cancel.cancel();
            handle
                .await
                .map_err(|e| anyhow!("auto refresh task failed: {}", e))?;
        }
    }

    Ok(())
}
