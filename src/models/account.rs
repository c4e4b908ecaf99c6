use serde::{Deserialize, Serialize};

use crate::models::token::is_native_ticker;

/// A local wallet account as reported by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub name_or_address: String,
    /// `None` means the account holds the default (native) currency.
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub balance: f64,
}

impl Account {
    pub fn new(name_or_address: &str, ticker: Option<&str>, balance: f64) -> Self {
        Self {
            name_or_address: name_or_address.to_string(),
            ticker: ticker.map(String::from),
            balance,
        }
    }

    /// Whether this account can hold `ticker`.
    pub fn holds(&self, ticker: &str) -> bool {
        match &self.ticker {
            Some(t) if !t.is_empty() => t == ticker,
            _ => is_native_ticker(ticker),
        }
    }

    pub fn has_funds(&self) -> bool {
        self.balance.is_finite() && self.balance > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untickered_account_holds_native() {
        let default = Account::new("default", None, 1.0);
        assert!(default.holds("NXS"));
        assert!(!default.holds("GOLD"));

        let empty = Account::new("legacy", Some(""), 1.0);
        assert!(empty.holds("NXS"));
    }

    #[test]
    fn test_ticker_match_is_exact() {
        let gold = Account::new("gold", Some("GOLD"), 0.0);
        assert!(gold.holds("GOLD"));
        assert!(!gold.holds("gold"));
        assert!(!gold.holds("NXS"));
        assert!(!gold.has_funds());
    }
}
