use serde::{Deserialize, Serialize};

use crate::error::{DexError, Result};

/// Ticker of the network's native settlement currency.
pub const NATIVE_TICKER: &str = "NXS";

/// Largest `decimals` value a token register accepts.
pub const MAX_DECIMALS: u8 = 18;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    pub ticker: String,
    pub address: String,
    pub current_supply: f64,
    pub max_supply: f64,
    pub decimals: u8,
    /// Only the native currency travels on the wire in divisible integer units.
    pub uses_divisible_units: bool,
    /// Register name, when the token was created under one.
    #[serde(default)]
    pub name: Option<String>,
    /// Unix time of the last register update.
    #[serde(default)]
    pub modified: u64,
}

impl Token {
    pub fn new(
        ticker: &str,
        address: &str,
        current_supply: f64,
        max_supply: f64,
        decimals: u8,
    ) -> Self {
        Self {
            ticker: ticker.to_string(),
            address: address.to_string(),
            current_supply,
            max_supply,
            decimals,
            uses_divisible_units: is_native_ticker(ticker),
            name: None,
            modified: 0,
        }
    }

    pub fn native() -> Self {
        Self::new(NATIVE_TICKER, "0", 0.0, 0.0, 6)
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn is_native(&self) -> bool {
        is_native_ticker(&self.ticker)
    }

    /// Reject records that cannot describe a real token.
    pub fn validate(&self) -> Result<()> {
        if self.ticker.trim().is_empty() {
            return Err(DexError::validation(format!(
                "token {} has an empty ticker",
                self.address
            )));
        }
        if !self.current_supply.is_finite() || self.current_supply < 0.0 {
            return Err(DexError::validation(format!(
                "token {} has invalid current supply {}",
                self.ticker, self.current_supply
            )));
        }
        if !self.max_supply.is_finite() || self.max_supply < 0.0 {
            return Err(DexError::validation(format!(
                "token {} has invalid max supply {}",
                self.ticker, self.max_supply
            )));
        }
        if self.decimals > MAX_DECIMALS {
            return Err(DexError::validation(format!(
                "token {} has {} decimals (max {})",
                self.ticker, self.decimals, MAX_DECIMALS
            )));
        }
        Ok(())
    }
}

pub fn is_native_ticker(ticker: &str) -> bool {
    ticker == NATIVE_TICKER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_native_uses_divisible_units() {
        assert!(Token::native().uses_divisible_units);
        assert!(!Token::new("GOLD", "8Ab", 100.0, 100.0, 2).uses_divisible_units);
    }

    #[test]
    fn test_validate_rejects_bad_supply() {
        let mut token = Token::new("GOLD", "8Ab", 100.0, 100.0, 2);
        assert!(token.validate().is_ok());

        token.current_supply = -1.0;
        assert!(matches!(token.validate(), Err(DexError::Validation(_))));

        token.current_supply = f64::NAN;
        assert!(token.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_excess_decimals() {
        let token = Token::new("GOLD", "8Ab", 1.0, 1.0, 19);
        assert!(token.validate().is_err());
    }
}
