use thiserror::Error;

pub type Result<T> = std::result::Result<T, DexError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DexError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("No {ticker} account found. Create one with `finance/create/account` (token={ticker}) before trading this pair")]
    MissingAccount { ticker: String },

    #[error("{operation} failed: {message}")]
    RemoteCall { operation: String, message: String },

    #[error("Discarded order book for {pair}: no longer the active pair")]
    StaleDataDiscarded { pair: String },
}

impl DexError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn missing_account(ticker: impl Into<String>) -> Self {
        Self::MissingAccount {
            ticker: ticker.into(),
        }
    }

    pub fn remote(operation: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::RemoteCall {
            operation: operation.into(),
            message: err.to_string(),
        }
    }

    pub fn stale(pair: impl Into<String>) -> Self {
        Self::StaleDataDiscarded { pair: pair.into() }
    }

    /// True for errors that stay internal and should never reach a user.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::StaleDataDiscarded { .. })
    }
}
