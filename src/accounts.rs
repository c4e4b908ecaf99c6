//! Choosing which local accounts fund and receive each leg of a trade.

use serde::Serialize;

use crate::error::{DexError, Result};
use crate::models::{Account, Side, TradingPair};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum AccountPreference {
    /// Largest balance wins; first match when nothing is funded.
    #[default]
    HighestBalance,
    /// Use this account when it holds the ticker, otherwise fall back.
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeIntent {
    /// Placing a new order on the book.
    Create,
    /// Filling someone else's order.
    Execute,
}

/// Accounts for both legs of a trade.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderAccounts {
    pub from: Account,
    pub to: Account,
    /// Non-blocking notices, e.g. an empty funding account.
    pub warnings: Vec<String>,
}

pub fn resolve_account<'a>(
    ticker: &str,
    accounts: &'a [Account],
    preference: &AccountPreference,
) -> Option<&'a Account> {
    if let AccountPreference::Named(name) = preference {
        if let Some(named) = accounts
            .iter()
            .find(|a| a.holds(ticker) && &a.name_or_address == name)
        {
            return Some(named);
        }
    }

    let mut first = None;
    let mut richest: Option<&Account> = None;
    for account in accounts.iter().filter(|a| a.holds(ticker)) {
        first.get_or_insert(account);
        if account.has_funds() && richest.map_or(true, |r| account.balance > r.balance) {
            richest = Some(account);
        }
    }
    richest.or(first)
}

/// Tickers that are debited and credited, in that order.
///
/// Executing an order moves funds opposite to creating one on the same side:
/// filling a bid means selling the base, filling an ask means paying the quote.
pub fn trade_legs(pair: &TradingPair, side: Side, intent: TradeIntent) -> (&str, &str) {
    let side = match intent {
        TradeIntent::Create => side,
        TradeIntent::Execute => side.opposite(),
    };
    match side {
        Side::Bid => (pair.quote_ticker.as_str(), pair.base_ticker.as_str()),
        Side::Ask => (pair.base_ticker.as_str(), pair.quote_ticker.as_str()),
    }
}

pub fn resolve_order_accounts(
    pair: &TradingPair,
    side: Side,
    intent: TradeIntent,
    accounts: &[Account],
    preference: &AccountPreference,
) -> Result<OrderAccounts> {
    let (from_ticker, to_ticker) = trade_legs(pair, side, intent);

    let from = resolve_account(from_ticker, accounts, preference)
        .ok_or_else(|| DexError::missing_account(from_ticker))?;
    let to = resolve_account(to_ticker, accounts, &AccountPreference::HighestBalance)
        .ok_or_else(|| DexError::missing_account(to_ticker))?;

    let mut warnings = Vec::new();
    for (account, ticker) in [(from, from_ticker), (to, to_ticker)] {
        if !account.has_funds() {
            warnings.push(format!(
                "{} account {} has a zero balance",
                ticker, account.name_or_address
            ));
        }
    }

    Ok(OrderAccounts {
        from: from.clone(),
        to: to.clone(),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> Vec<Account> {
        vec![
            Account::new("default", None, 12.0),
            Account::new("gold-empty", Some("GOLD"), 0.0),
            Account::new("gold-main", Some("GOLD"), 5.0),
            Account::new("silver", Some("SILVER"), 0.0),
        ]
    }

    #[test]
    fn test_prefers_greatest_balance() {
        let accounts = wallet();
        let picked = resolve_account("GOLD", &accounts, &AccountPreference::default()).unwrap();
        assert_eq!(picked.name_or_address, "gold-main");
    }

    #[test]
    fn test_falls_back_to_first_when_unfunded() {
        let accounts = vec![
            Account::new("s1", Some("SILVER"), 0.0),
            Account::new("s2", Some("SILVER"), 0.0),
        ];
        let picked = resolve_account("SILVER", &accounts, &AccountPreference::default()).unwrap();
        assert_eq!(picked.name_or_address, "s1");
    }

    #[test]
    fn test_equal_balances_keep_first() {
        let accounts = vec![
            Account::new("g1", Some("GOLD"), 3.0),
            Account::new("g2", Some("GOLD"), 3.0),
        ];
        let picked = resolve_account("GOLD", &accounts, &AccountPreference::default()).unwrap();
        assert_eq!(picked.name_or_address, "g1");
    }

    #[test]
    fn test_native_matches_untickered_account() {
        let accounts = wallet();
        let picked = resolve_account("NXS", &accounts, &AccountPreference::default()).unwrap();
        assert_eq!(picked.name_or_address, "default");
    }

    #[test]
    fn test_missing_ticker_is_none() {
        assert!(resolve_account("COPPER", &wallet(), &AccountPreference::default()).is_none());
    }

    #[test]
    fn test_named_preference() {
        let accounts = wallet();
        let named = AccountPreference::Named("gold-empty".to_string());
        assert_eq!(
            resolve_account("GOLD", &accounts, &named).unwrap().name_or_address,
            "gold-empty"
        );
        let unknown = AccountPreference::Named("nope".to_string());
        assert_eq!(
            resolve_account("GOLD", &accounts, &unknown).unwrap().name_or_address,
            "gold-main"
        );
    }

    #[test]
    fn test_creation_legs() {
        let pair = TradingPair::parse("GOLD/NXS").unwrap();
        assert_eq!(trade_legs(&pair, Side::Bid, TradeIntent::Create), ("NXS", "GOLD"));
        assert_eq!(trade_legs(&pair, Side::Ask, TradeIntent::Create), ("GOLD", "NXS"));
    }

    #[test]
    fn test_execution_legs_are_opposite() {
        let pair = TradingPair::parse("GOLD/NXS").unwrap();
        assert_eq!(trade_legs(&pair, Side::Bid, TradeIntent::Execute), ("GOLD", "NXS"));
        assert_eq!(trade_legs(&pair, Side::Ask, TradeIntent::Execute), ("NXS", "GOLD"));
    }

    #[test]
    fn test_resolve_order_accounts_collects_warnings() {
        let pair = TradingPair::parse("SILVER/NXS").unwrap();
        let resolved = resolve_order_accounts(
            &pair,
            Side::Ask,
            TradeIntent::Create,
            &wallet(),
            &AccountPreference::default(),
        )
        .unwrap();
        assert_eq!(resolved.from.name_or_address, "silver");
        assert_eq!(resolved.to.name_or_address, "default");
        assert_eq!(resolved.warnings.len(), 1);
        assert!(resolved.warnings[0].contains("SILVER"));
    }

    #[test]
    fn test_resolve_order_accounts_reports_missing_leg() {
        let pair = TradingPair::parse("COPPER/NXS").unwrap();
        let err = resolve_order_accounts(
            &pair,
            Side::Bid,
            TradeIntent::Create,
            &wallet(),
            &AccountPreference::default(),
        )
        .unwrap_err();
        assert_eq!(err, DexError::missing_account("COPPER"));
    }
}
