use serde::{Deserialize, Serialize};

use crate::error::DexError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Bid => "bid",
            Side::Ask => "ask",
        }
    }

    pub fn opposite(&self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Side {
    type Err = DexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bid" | "buy" => Ok(Side::Bid),
            "ask" | "sell" => Ok(Side::Ask),
            other => Err(DexError::validation(format!("unknown order side: {}", other))),
        }
    }
}

/// An order record exactly as the ledger returned it.
///
/// Amounts are in wire encoding: the native leg is in divisible integer units,
/// every other leg is already decimal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawOrder {
    pub txid: String,
    #[serde(rename = "type")]
    pub side: Side,
    #[serde(deserialize_with = "deserialize_amount")]
    pub price: f64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub contract_amount: f64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub order_amount: f64,
    #[serde(default)]
    pub contract_ticker: Option<String>,
    #[serde(default)]
    pub order_ticker: Option<String>,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub owner: Option<String>,
}

/// The ledger is inconsistent about quoting numbers; accept both.
pub(crate) fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum A {
        Num(f64),
        Str(String),
    }
    match A::deserialize(deserializer)? {
        A::Num(n) => Ok(n),
        A::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Both sides of a market listing, before normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawOrderBook {
    #[serde(default)]
    pub bids: Vec<RawOrder>,
    #[serde(default)]
    pub asks: Vec<RawOrder>,
}

impl RawOrderBook {
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bids.len() + self.asks.len()
    }
}

/// An order expressed in display units for one trading pair.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NormalizedOrder {
    pub txid: String,
    pub side: Side,
    /// Quantity of the base token being bought (bid) or sold (ask).
    pub base_amount: f64,
    /// Total quote cost (bid) or proceeds (ask).
    pub quote_amount: f64,
    /// Quote per base.
    pub price: f64,
    /// What an executor of this order pays or receives; always the quote leg.
    pub counterparty_amount: f64,
    pub counterparty_ticker: String,
    pub timestamp: u64,
    pub owner: Option<String>,
}

/// Sorted bids and asks for a single trading pair.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderBook {
    pub pair: String,
    /// Best (highest) price first.
    pub bids: Vec<NormalizedOrder>,
    /// Best (lowest) price first.
    pub asks: Vec<NormalizedOrder>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_order_accepts_quoted_numbers() {
        let raw: RawOrder = serde_json::from_str(
            r#"{"txid":"01ab","type":"bid","price":"2.5","contractAmount":2500000,
                "orderAmount":"10","contractTicker":"NXS","timestamp":1700000000}"#,
        )
        .unwrap();
        assert_eq!(raw.side, Side::Bid);
        assert_eq!(raw.price, 2.5);
        assert_eq!(raw.contract_amount, 2_500_000.0);
        assert_eq!(raw.order_amount, 10.0);
        assert_eq!(raw.owner, None);
    }

    #[test]
    fn test_raw_order_rejects_garbage_amount() {
        let res: Result<RawOrder, _> = serde_json::from_str(
            r#"{"txid":"01ab","type":"ask","price":"abc","contractAmount":1,"orderAmount":1}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_side_parsing() {
        assert_eq!("BUY".parse::<Side>().unwrap(), Side::Bid);
        assert_eq!("ask".parse::<Side>().unwrap(), Side::Ask);
        assert!("hold".parse::<Side>().is_err());
        assert_eq!(Side::Bid.opposite(), Side::Ask);
    }
}
