//! HTTP client for the Nexus ledger API.
//!
//! Every endpoint is a JSON POST returning `{"result": ...}` on success or
//! `{"error": {"code", "message"}}` on failure. Responses are decoded into
//! explicit types here; nothing past this module sees raw JSON.
//!
//! Read calls retry with backoff. Write calls (create/execute/cancel) are sent
//! exactly once.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::ledger::{LedgerApi, OrderRequest};
use crate::models::{
    is_native_ticker, Account, RawOrder, RawOrderBook, Side, Token, TradingPair,
};

pub struct NexusApi {
    api_url: String,
    client: reqwest::Client,
    retries: u32,
    retry_base_delay_ms: u64,
}

impl NexusApi {
    pub fn new(api_url: &str) -> Result<Self> {
        Self::from_config(&Config {
            api_url: api_url.to_string(),
            ..Config::default()
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;
        Ok(Self {
            api_url: crate::utils::remove_trailing_slash(&config.api_url),
            client,
            retries: config.read_retries,
            retry_base_delay_ms: config.retry_base_delay_ms,
        })
    }

    pub fn with_client(api_url: &str, client: reqwest::Client) -> Self {
        Self {
            api_url: crate::utils::remove_trailing_slash(api_url),
            client,
            retries: 0,
            retry_base_delay_ms: 0,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.api_url, endpoint)
    }

    async fn call(&self, endpoint: &str, params: &Value) -> Result<Value> {
        let url = self.build_url(endpoint);
        debug!(%url, "ledger request");
        let response = self.client.post(&url).json(params).send().await?;
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(anyhow!("rate_limited"));
        }
        let status = response.status();
        let body = response.text().await?;
        let parsed: Value = serde_json::from_str(&body)
            .map_err(|e| anyhow!("{} returned non-JSON ({}): {}", endpoint, status, e))?;
        unwrap_result(endpoint, parsed)
    }

    async fn read(&self, endpoint: &str, params: Value) -> Result<Value> {
        crate::utils::retry(self.retries, self.retry_base_delay_ms, || {
            self.call(endpoint, &params)
        })
        .await
    }

    async fn write(&self, endpoint: &str, params: Value) -> Result<String> {
        let result = self.call(endpoint, &params).await?;
        parse_txid(&result).ok_or_else(|| anyhow!("{} response has no txid", endpoint))
    }
}

fn unwrap_result(endpoint: &str, parsed: Value) -> Result<Value> {
    if let Some(err) = parsed.get("error").filter(|e| !e.is_null()) {
        let message = err
            .get("message")
            .and_then(|m| m.as_str())
            .map(String::from)
            .unwrap_or_else(|| err.to_string());
        return Err(anyhow!("{}: {}", endpoint, message));
    }
    match parsed {
        Value::Object(mut obj) if obj.contains_key("result") => {
            Ok(obj.remove("result").unwrap_or(Value::Null))
        }
        other => Ok(other),
    }
}

fn parse_txid(v: &Value) -> Option<String> {
    v.get("txid")
        .or_else(|| v.get("hash"))
        .and_then(|t| t.as_str())
        .map(String::from)
}

fn as_f64(v: Option<&Value>) -> Option<f64> {
    let v = v?;
    v.as_f64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

fn as_str<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|k| v.get(*k).and_then(|x| x.as_str()))
        .filter(|s| !s.is_empty())
}

/// Flatten the ledger's nested `contract`/`order` legs into a [`RawOrder`].
pub fn parse_order(v: &Value) -> Result<RawOrder> {
    let mut flat = Map::new();
    if let Some(obj) = v.as_object() {
        for (k, val) in obj {
            if k != "contract" && k != "order" {
                flat.insert(k.clone(), val.clone());
            }
        }
    }
    for (leg, amount_key, ticker_key) in [
        ("contract", "contractAmount", "contractTicker"),
        ("order", "orderAmount", "orderTicker"),
    ] {
        if let Some(obj) = v.get(leg).and_then(|l| l.as_object()) {
            if let Some(amount) = obj.get("amount") {
                flat.insert(amount_key.to_string(), amount.clone());
            }
            if let Some(ticker) = obj.get("ticker").or_else(|| obj.get("token")) {
                flat.insert(ticker_key.to_string(), ticker.clone());
            }
        }
    }
    serde_json::from_value(Value::Object(flat)).map_err(|e| anyhow!("malformed order: {}", e))
}

pub fn parse_order_book(v: &Value) -> RawOrderBook {
    let side = |key: &str| -> Vec<RawOrder> {
        v.get(key)
            .and_then(|s| s.as_array())
            .map(|orders| {
                orders
                    .iter()
                    .filter_map(|o| match parse_order(o) {
                        Ok(order) => Some(order),
                        Err(e) => {
                            warn!("skipping {}: {}", key, e);
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default()
    };
    RawOrderBook {
        bids: side("bids"),
        asks: side("asks"),
    }
}

/// Executed orders come back as one list; split by each record's side.
pub fn parse_executed(v: &Value) -> RawOrderBook {
    if v.get("bids").is_some() || v.get("asks").is_some() {
        return parse_order_book(v);
    }
    let mut book = RawOrderBook::default();
    for o in v.as_array().into_iter().flatten() {
        match parse_order(o) {
            Ok(order) if order.side == Side::Bid => book.bids.push(order),
            Ok(order) => book.asks.push(order),
            Err(e) => warn!("skipping executed order: {}", e),
        }
    }
    book
}

pub fn parse_account(v: &Value) -> Result<Account> {
    let name = as_str(v, &["name", "address"]).ok_or_else(|| anyhow!("account has no name or address"))?;
    let ticker = as_str(v, &["ticker", "token_name"]).map(String::from);
    let balance = match v.get("balance") {
        None | Some(Value::Null) => 0.0,
        some => as_f64(some).ok_or_else(|| anyhow!("account {} has a non-numeric balance", name))?,
    };
    Ok(Account {
        name_or_address: name.to_string(),
        ticker,
        balance,
    })
}

pub fn parse_token(v: &Value) -> Result<Token> {
    let ticker = as_str(v, &["ticker"]).ok_or_else(|| anyhow!("token has no ticker"))?;
    let address = as_str(v, &["address"]).ok_or_else(|| anyhow!("token {} has no address", ticker))?;
    let current_supply = as_f64(v.get("currentsupply").or_else(|| v.get("currentSupply")))
        .ok_or_else(|| anyhow!("token {} has no current supply", ticker))?;
    let max_supply = as_f64(v.get("maxsupply").or_else(|| v.get("maxSupply")))
        .ok_or_else(|| anyhow!("token {} has no max supply", ticker))?;
    let decimals = v.get("decimals").and_then(|d| d.as_u64()).unwrap_or(0);
    let decimals = u8::try_from(decimals).map_err(|_| anyhow!("token {} has {} decimals", ticker, decimals))?;

    let token = Token {
        ticker: ticker.to_string(),
        address: address.to_string(),
        current_supply,
        max_supply,
        decimals,
        uses_divisible_units: is_native_ticker(ticker),
        name: as_str(v, &["name"]).map(String::from),
        modified: v.get("modified").and_then(|m| m.as_u64()).unwrap_or(0),
    };
    token.validate()?;
    Ok(token)
}

fn parse_list<T>(v: &Value, what: &str, parse: fn(&Value) -> Result<T>) -> Vec<T> {
    v.as_array()
        .into_iter()
        .flatten()
        .filter_map(|item| match parse(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("skipping {}: {}", what, e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl LedgerApi for NexusApi {
    async fn list_orders(&self, pair: &TradingPair, limit: usize) -> Result<RawOrderBook> {
        let result = self
            .read("market/list/order", json!({ "market": pair.id, "limit": limit }))
            .await?;
        Ok(parse_order_book(&result))
    }

    async fn list_user_orders(&self, pair: &TradingPair) -> Result<RawOrderBook> {
        let result = self
            .read("market/user/order", json!({ "market": pair.id }))
            .await?;
        Ok(parse_order_book(&result))
    }

    async fn list_executed(&self, pair: &TradingPair, limit: usize) -> Result<RawOrderBook> {
        let result = self
            .read("market/list/executed", json!({ "market": pair.id, "limit": limit }))
            .await?;
        Ok(parse_executed(&result))
    }

    async fn create_order(&self, request: &OrderRequest) -> Result<String> {
        let endpoint = match request.side {
            Side::Bid => "market/create/bid",
            Side::Ask => "market/create/ask",
        };
        self.write(
            endpoint,
            json!({
                "market": request.pair,
                "amount": request.amount,
                "price": request.price,
                "from": request.from,
                "to": request.to,
            }),
        )
        .await
    }

    async fn execute_order(&self, txid: &str, from: &str, to: &str) -> Result<String> {
        self.write(
            "market/execute/order",
            json!({ "txid": txid, "from": from, "to": to }),
        )
        .await
    }

    async fn cancel_order(&self, txid: &str) -> Result<String> {
        self.write("market/cancel/order", json!({ "txid": txid })).await
    }

    async fn list_accounts(&self) -> Result<Vec<Account>> {
        let result = self.read("finance/list/accounts", json!({})).await?;
        Ok(parse_list(&result, "account", parse_account))
    }

    async fn list_tokens(&self, filter: &str) -> Result<Vec<Token>> {
        let params = if filter.is_empty() {
            json!({})
        } else {
            json!({ "where": filter })
        };
        let result = self.read("register/list/finance:token", params).await?;
        Ok(parse_list(&result, "token", parse_token))
    }

    async fn resolve_token_by_name(&self, name: &str) -> Result<Token> {
        let result = self
            .read("register/get/finance:token", json!({ "name": name }))
            .await?;
        parse_token(&result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_order() {
        let v = json!({
            "txid": "01ab",
            "type": "bid",
            "price": 2.5,
            "timestamp": 1700000000,
            "owner": "a1b2",
            "contract": { "amount": 2500000, "ticker": "NXS" },
            "order": { "amount": 10, "ticker": "GOLD" }
        });
        let order = parse_order(&v).unwrap();
        assert_eq!(order.side, Side::Bid);
        assert_eq!(order.contract_amount, 2_500_000.0);
        assert_eq!(order.contract_ticker.as_deref(), Some("NXS"));
        assert_eq!(order.order_amount, 10.0);
        assert_eq!(order.order_ticker.as_deref(), Some("GOLD"));
        assert_eq!(order.owner.as_deref(), Some("a1b2"));
    }

    #[test]
    fn test_parse_order_book_skips_malformed() {
        let v = json!({
            "bids": [
                { "txid": "1", "type": "bid", "price": 1, "contractAmount": 1, "orderAmount": 1 },
                { "txid": "2", "type": "bid" }
            ],
            "asks": []
        });
        let book = parse_order_book(&v);
        assert_eq!(book.bids.len(), 1);
        assert!(book.asks.is_empty());
    }

    #[test]
    fn test_parse_executed_splits_by_side() {
        let v = json!([
            { "txid": "1", "type": "bid", "price": 1, "contractAmount": 1, "orderAmount": 1 },
            { "txid": "2", "type": "ask", "price": 1, "contractAmount": 1, "orderAmount": 1 }
        ]);
        let book = parse_executed(&v);
        assert_eq!(book.bids.len(), 1);
        assert_eq!(book.asks.len(), 1);
    }

    #[test]
    fn test_parse_account() {
        let acct = parse_account(&json!({ "name": "default", "balance": "12.5" })).unwrap();
        assert_eq!(acct.name_or_address, "default");
        assert_eq!(acct.ticker, None);
        assert_eq!(acct.balance, 12.5);

        let acct = parse_account(&json!({ "address": "8Bx", "ticker": "GOLD" })).unwrap();
        assert_eq!(acct.name_or_address, "8Bx");
        assert_eq!(acct.balance, 0.0);

        assert!(parse_account(&json!({ "ticker": "GOLD" })).is_err());
        assert!(parse_account(&json!({ "name": "x", "balance": "lots" })).is_err());
    }

    #[test]
    fn test_parse_token_validates() {
        let token = parse_token(&json!({
            "ticker": "GOLD", "address": "8Aa", "currentsupply": 900, "maxsupply": 1000,
            "decimals": 2, "modified": 1700000000, "name": "gold"
        }))
        .unwrap();
        assert_eq!(token.max_supply, 1000.0);
        assert_eq!(token.name.as_deref(), Some("gold"));
        assert!(!token.uses_divisible_units);

        assert!(parse_token(&json!({
            "ticker": "BAD", "address": "8Ab", "currentsupply": -1, "maxsupply": 1
        }))
        .is_err());
    }

    #[test]
    fn test_unwrap_result_surfaces_ledger_error() {
        let err = unwrap_result(
            "market/create/bid",
            json!({ "error": { "code": -56, "message": "Insufficient funds" } }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Insufficient funds"));

        let ok = unwrap_result("x", json!({ "result": { "txid": "abc" } })).unwrap();
        assert_eq!(parse_txid(&ok).as_deref(), Some("abc"));
    }

    #[test]
    fn test_trailing_slash_removed() {
        let api = NexusApi::with_client("http://localhost:8080/", reqwest::Client::new());
        assert_eq!(api.api_url(), "http://localhost:8080");
        assert_eq!(api.build_url("market/list/order"), "http://localhost:8080/market/list/order");
    }
}
