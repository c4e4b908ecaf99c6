use async_trait::async_trait;
use serde::Serialize;

use crate::models::{Account, RawOrderBook, Side, Token, TradingPair};

/// A limit order ready for submission. `amount` is in wire encoding for the
/// base token; `price` is quote per base in display units.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderRequest {
    pub side: Side,
    pub pair: String,
    pub amount: f64,
    pub price: f64,
    pub from: String,
    pub to: String,
}

/// The remote ledger and wallet procedures the trading core relies on.
///
/// Implementations report transport and decoding failures as errors; deciding
/// whether a failure degrades or surfaces is left to the caller.
#[async_trait]
pub trait LedgerApi: Send + Sync {
    async fn list_orders(&self, pair: &TradingPair, limit: usize) -> Result<RawOrderBook, anyhow::Error>;

    async fn list_user_orders(&self, pair: &TradingPair) -> Result<RawOrderBook, anyhow::Error>;

    /// Recently filled orders for the pair.
    async fn list_executed(&self, pair: &TradingPair, limit: usize) -> Result<RawOrderBook, anyhow::Error>;

    /// Returns the txid of the new order.
    async fn create_order(&self, request: &OrderRequest) -> Result<String, anyhow::Error>;

    async fn execute_order(&self, txid: &str, from: &str, to: &str) -> Result<String, anyhow::Error>;

    async fn cancel_order(&self, txid: &str) -> Result<String, anyhow::Error>;

    async fn list_accounts(&self) -> Result<Vec<Account>, anyhow::Error>;

    /// `filter` is a register query expression; empty lists everything.
    async fn list_tokens(&self, filter: &str) -> Result<Vec<Token>, anyhow::Error>;

    async fn resolve_token_by_name(&self, name: &str) -> Result<Token, anyhow::Error>;
}
