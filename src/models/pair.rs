use serde::{Deserialize, Serialize};

use crate::error::{DexError, Result};
use crate::models::token::is_native_ticker;

/// A directional market `BASE/QUOTE`.
///
/// `A/B` and `B/A` are siblings but distinct markets; neither stands in for the other.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TradingPair {
    pub id: String,
    pub base_ticker: String,
    pub quote_ticker: String,
    pub is_cross_token: bool,
}

impl TradingPair {
    pub fn new(base: &str, quote: &str) -> Result<Self> {
        let base = base.trim();
        let quote = quote.trim();
        if base.is_empty() || quote.is_empty() {
            return Err(DexError::validation(format!(
                "pair {}/{} has an empty ticker",
                base, quote
            )));
        }
        if base.contains('/') || quote.contains('/') {
            return Err(DexError::validation(format!(
                "ticker may not contain '/': {}/{}",
                base, quote
            )));
        }
        if base == quote {
            return Err(DexError::validation(format!(
                "pair {}/{} trades a token against itself",
                base, quote
            )));
        }
        Ok(Self {
            id: format!("{}/{}", base, quote),
            base_ticker: base.to_string(),
            quote_ticker: quote.to_string(),
            is_cross_token: !is_native_ticker(base) && !is_native_ticker(quote),
        })
    }

    /// Parse a `BASE/QUOTE` id.
    pub fn parse(id: &str) -> Result<Self> {
        match id.split_once('/') {
            Some((base, quote)) => Self::new(base, quote),
            None => Err(DexError::validation(format!(
                "pair id must look like BASE/QUOTE, got {}",
                id
            ))),
        }
    }

    pub fn reversed(&self) -> Self {
        Self {
            id: format!("{}/{}", self.quote_ticker, self.base_ticker),
            base_ticker: self.quote_ticker.clone(),
            quote_ticker: self.base_ticker.clone(),
            is_cross_token: self.is_cross_token,
        }
    }

    /// Same unordered token set, including the pair itself.
    pub fn is_sibling_of(&self, other: &TradingPair) -> bool {
        (self.base_ticker == other.base_ticker && self.quote_ticker == other.quote_ticker)
            || (self.base_ticker == other.quote_ticker && self.quote_ticker == other.base_ticker)
    }

    pub fn involves(&self, ticker: &str) -> bool {
        self.base_ticker == ticker || self.quote_ticker == ticker
    }
}

impl std::fmt::Display for TradingPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

impl std::str::FromStr for TradingPair {
    type Err = DexError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
