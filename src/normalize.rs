//! Raw ledger orders → display-unit orders for one trading pair.
//!
//! Bids and asks are populated from different upstream fields:
//!   - Bid: one leg carries the total quote cost, the other the base quantity.
//!          Price is derived as quote / base.
//!   - Ask: one leg carries the base quantity being sold. The quote total is
//!          derived from the stated unit price, never read from the record.
//!
//! The leg holding each amount is identified by ticker. When the record does not
//! name its tickers, a bid's contract leg is the quote and an ask's is the base.

use tracing::warn;

use crate::error::{DexError, Result};
use crate::models::{NormalizedOrder, OrderBook, RawOrder, RawOrderBook, Side, TradingPair};
use crate::units::to_display;

pub fn normalize_order(raw: &RawOrder, pair: &TradingPair) -> Result<NormalizedOrder> {
    let base = pair.base_ticker.as_str();
    let quote = pair.quote_ticker.as_str();

    let (base_amount, quote_amount, price) = match raw.side {
        Side::Bid => {
            let (base_raw, quote_raw) = if contract_is_base(raw, pair, false) {
                (raw.contract_amount, raw.order_amount)
            } else {
                (raw.order_amount, raw.contract_amount)
            };
            let base_amount = to_display(base_raw, base)?;
            let quote_amount = to_display(quote_raw, quote)?;
            if base_amount <= 0.0 {
                return Err(DexError::validation(format!(
                    "bid {} has no {} quantity",
                    raw.txid, base
                )));
            }
            (base_amount, quote_amount, quote_amount / base_amount)
        }
        Side::Ask => {
            let base_raw = if contract_is_base(raw, pair, true) {
                raw.contract_amount
            } else {
                raw.order_amount
            };
            let base_amount = to_display(base_raw, base)?;
            if base_amount <= 0.0 {
                return Err(DexError::validation(format!(
                    "ask {} has no {} quantity",
                    raw.txid, base
                )));
            }
            if !raw.price.is_finite() {
                return Err(DexError::validation(format!(
                    "ask {} has price {}",
                    raw.txid, raw.price
                )));
            }
            (base_amount, base_amount * raw.price, raw.price)
        }
    };

    if !price.is_finite() || price <= 0.0 {
        return Err(DexError::validation(format!(
            "{} {} has non-positive price {}",
            raw.side, raw.txid, price
        )));
    }

    Ok(NormalizedOrder {
        txid: raw.txid.clone(),
        side: raw.side,
        base_amount,
        quote_amount,
        price,
        counterparty_amount: quote_amount,
        counterparty_ticker: quote.to_string(),
        timestamp: raw.timestamp,
        owner: raw.owner.clone(),
    })
}

fn contract_is_base(raw: &RawOrder, pair: &TradingPair, default: bool) -> bool {
    if let Some(t) = leg_ticker(&raw.contract_ticker, pair) {
        return t == pair.base_ticker;
    }
    if let Some(t) = leg_ticker(&raw.order_ticker, pair) {
        return t == pair.quote_ticker;
    }
    default
}

/// The leg's ticker, if it names one of the pair's tokens.
fn leg_ticker<'a>(ticker: &'a Option<String>, pair: &TradingPair) -> Option<&'a str> {
    ticker.as_deref().filter(|t| pair.involves(t))
}

/// Normalize a batch, skipping records that cannot describe a live order.
pub fn normalize_orders(raws: &[RawOrder], pair: &TradingPair) -> Vec<NormalizedOrder> {
    raws.iter()
        .filter_map(|raw| match normalize_order(raw, pair) {
            Ok(order) => Some(order),
            Err(e) => {
                warn!(pair = %pair, txid = %raw.txid, "skipping order: {}", e);
                None
            }
        })
        .collect()
}

/// Normalize both sides of a listing and sort them into a book.
pub fn normalize_book(raw: &RawOrderBook, pair: &TradingPair) -> OrderBook {
    let mut orders = normalize_orders(&raw.bids, pair);
    orders.extend(normalize_orders(&raw.asks, pair));
    OrderBook::from_orders(&pair.id, orders)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn raw(side: Side, price: f64, contract: f64, order: f64, contract_ticker: Option<&str>) -> RawOrder {
        RawOrder {
            txid: "01".to_string(),
            side,
            price,
            contract_amount: contract,
            order_amount: order,
            contract_ticker: contract_ticker.map(String::from),
            order_ticker: None,
            timestamp: 1_700_000_000,
            owner: None,
        }
    }

    fn gold_nxs() -> TradingPair {
        TradingPair::parse("GOLD/NXS").unwrap()
    }

    fn assert_price_consistent(o: &NormalizedOrder) {
        assert!(
            (o.price - o.quote_amount / o.base_amount).abs() < TOLERANCE,
            "price {} != {} / {}",
            o.price,
            o.quote_amount,
            o.base_amount
        );
    }

    #[test]
    fn test_bid_with_native_quote() {
        let order = normalize_order(
            &raw(Side::Bid, 2.5, 2_500_000.0, 10.0, Some("NXS")),
            &gold_nxs(),
        )
        .unwrap();
        assert_eq!(order.base_amount, 10.0);
        assert!((order.quote_amount - 2.5).abs() < TOLERANCE);
        assert!((order.price - 0.25).abs() < TOLERANCE);
        assert_eq!(order.counterparty_ticker, "NXS");
        assert_eq!(order.counterparty_amount, order.quote_amount);
        assert_price_consistent(&order);
    }

    #[test]
    fn test_bid_without_ticker_treats_contract_as_quote() {
        let order = normalize_order(&raw(Side::Bid, 0.0, 5_000_000.0, 20.0, None), &gold_nxs()).unwrap();
        assert_eq!(order.base_amount, 20.0);
        assert!((order.quote_amount - 5.0).abs() < TOLERANCE);
        assert!((order.price - 0.25).abs() < TOLERANCE);
    }

    #[test]
    fn test_ask_uses_stated_price() {
        // Seller deposits 8 GOLD, asks 0.5 NXS each; order field is ignored.
        let order = normalize_order(
            &raw(Side::Ask, 0.5, 8.0, 999_999_999.0, Some("GOLD")),
            &gold_nxs(),
        )
        .unwrap();
        assert_eq!(order.base_amount, 8.0);
        assert!((order.quote_amount - 4.0).abs() < TOLERANCE);
        assert_eq!(order.price, 0.5);
        assert_eq!(order.counterparty_ticker, "NXS");
        assert_price_consistent(&order);
    }

    #[test]
    fn test_ask_with_native_base() {
        let pair = TradingPair::parse("NXS/GOLD").unwrap();
        let order = normalize_order(&raw(Side::Ask, 3.0, 2_000_000.0, 6.0, Some("NXS")), &pair).unwrap();
        assert_eq!(order.base_amount, 2.0);
        assert_eq!(order.quote_amount, 6.0);
        assert_eq!(order.counterparty_ticker, "GOLD");
        assert_price_consistent(&order);
    }

    #[test]
    fn test_cross_token_bid_converts_nothing() {
        let pair = TradingPair::parse("GOLD/SILVER").unwrap();
        let order = normalize_order(&raw(Side::Bid, 0.0, 30.0, 10.0, Some("SILVER")), &pair).unwrap();
        assert_eq!(order.base_amount, 10.0);
        assert_eq!(order.quote_amount, 30.0);
        assert_eq!(order.price, 3.0);
    }

    #[test]
    fn test_order_ticker_identifies_legs() {
        let mut r = raw(Side::Bid, 0.0, 10.0, 2_500_000.0, None);
        r.order_ticker = Some("NXS".to_string());
        let order = normalize_order(&r, &gold_nxs()).unwrap();
        assert_eq!(order.base_amount, 10.0);
        assert!((order.quote_amount - 2.5).abs() < TOLERANCE);
    }

    #[test]
    fn test_rejects_non_positive_orders() {
        let pair = gold_nxs();
        assert!(normalize_order(&raw(Side::Bid, 1.0, 1_000_000.0, 0.0, Some("NXS")), &pair).is_err());
        assert!(normalize_order(&raw(Side::Bid, 1.0, 0.0, 10.0, Some("NXS")), &pair).is_err());
        assert!(normalize_order(&raw(Side::Ask, 0.0, 8.0, 0.0, Some("GOLD")), &pair).is_err());
        assert!(normalize_order(&raw(Side::Ask, -2.0, 8.0, 0.0, Some("GOLD")), &pair).is_err());
        assert!(normalize_order(&raw(Side::Ask, 1.0, -8.0, 0.0, Some("GOLD")), &pair).is_err());
        assert!(normalize_order(&raw(Side::Ask, f64::NAN, 8.0, 0.0, Some("GOLD")), &pair).is_err());
    }

    #[test]
    fn test_batch_skips_corrupt_orders() {
        let pair = gold_nxs();
        let mut bad = raw(Side::Ask, 0.0, 8.0, 0.0, Some("GOLD"));
        bad.txid = "bad".to_string();
        let good = raw(Side::Ask, 0.5, 8.0, 0.0, Some("GOLD"));
        let out = normalize_orders(&[bad, good], &pair);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].txid, "01");
    }
}
