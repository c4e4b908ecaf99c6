//! Price-time priority ordering for normalized orders.

use std::cmp::Ordering;

use crate::models::{NormalizedOrder, OrderBook, Side};

/// Highest price first, then oldest, then txid.
pub fn compare_bids(a: &NormalizedOrder, b: &NormalizedOrder) -> Ordering {
    b.price
        .total_cmp(&a.price)
        .then_with(|| a.timestamp.cmp(&b.timestamp))
        .then_with(|| a.txid.cmp(&b.txid))
}

/// Lowest price first, then oldest, then txid.
pub fn compare_asks(a: &NormalizedOrder, b: &NormalizedOrder) -> Ordering {
    a.price
        .total_cmp(&b.price)
        .then_with(|| a.timestamp.cmp(&b.timestamp))
        .then_with(|| a.txid.cmp(&b.txid))
}

pub fn sort_bids(orders: &mut [NormalizedOrder]) {
    orders.sort_by(compare_bids);
}

pub fn sort_asks(orders: &mut [NormalizedOrder]) {
    orders.sort_by(compare_asks);
}

impl OrderBook {
    pub fn empty(pair: &str) -> Self {
        Self {
            pair: pair.to_string(),
            bids: Vec::new(),
            asks: Vec::new(),
        }
    }

    /// Split orders by side and sort each side into priority order.
    pub fn from_orders(pair: &str, orders: Vec<NormalizedOrder>) -> Self {
        let (mut bids, mut asks): (Vec<_>, Vec<_>) =
            orders.into_iter().partition(|o| o.side == Side::Bid);
        sort_bids(&mut bids);
        sort_asks(&mut asks);
        Self {
            pair: pair.to_string(),
            bids,
            asks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    pub fn best_bid(&self) -> Option<&NormalizedOrder> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&NormalizedOrder> {
        self.asks.first()
    }

    pub fn spread(&self) -> Option<f64> {
        Some(self.best_ask()?.price - self.best_bid()?.price)
    }

    pub fn mid(&self) -> Option<f64> {
        Some((self.best_ask()?.price + self.best_bid()?.price) / 2.0)
    }

    pub fn find(&self, txid: &str) -> Option<&NormalizedOrder> {
        self.bids
            .iter()
            .chain(self.asks.iter())
            .find(|o| o.txid == txid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(txid: &str, side: Side, price: f64, timestamp: u64) -> NormalizedOrder {
        NormalizedOrder {
            txid: txid.to_string(),
            side,
            base_amount: 1.0,
            quote_amount: price,
            price,
            counterparty_amount: price,
            counterparty_ticker: "NXS".to_string(),
            timestamp,
            owner: None,
        }
    }

    #[test]
    fn test_bids_highest_price_then_oldest() {
        let mut bids = vec![
            order("a", Side::Bid, 1.0, 5),
            order("b", Side::Bid, 2.0, 9),
            order("c", Side::Bid, 2.0, 3),
            order("d", Side::Bid, 0.5, 1),
        ];
        sort_bids(&mut bids);
        let ids: Vec<_> = bids.iter().map(|o| o.txid.as_str()).collect();
        assert_eq!(ids, ["c", "b", "a", "d"]);

        let again = {
            let mut copy = bids.clone();
            sort_bids(&mut copy);
            copy
        };
        assert_eq!(again, bids);
    }

    #[test]
    fn test_asks_lowest_price_then_oldest() {
        let mut asks = vec![
            order("a", Side::Ask, 3.0, 1),
            order("b", Side::Ask, 1.0, 7),
            order("c", Side::Ask, 1.0, 2),
        ];
        sort_asks(&mut asks);
        let ids: Vec<_> = asks.iter().map(|o| o.txid.as_str()).collect();
        assert_eq!(ids, ["c", "b", "a"]);
    }

    #[test]
    fn test_txid_breaks_full_ties() {
        let mut bids = vec![order("z", Side::Bid, 1.0, 1), order("m", Side::Bid, 1.0, 1)];
        sort_bids(&mut bids);
        assert_eq!(bids[0].txid, "m");
        assert_eq!(compare_bids(&bids[0], &bids[0]), Ordering::Equal);
    }

    #[test]
    fn test_book_partitions_and_quotes() {
        let book = OrderBook::from_orders(
            "GOLD/NXS",
            vec![
                order("a1", Side::Ask, 0.30, 1),
                order("b1", Side::Bid, 0.20, 1),
                order("a2", Side::Ask, 0.28, 2),
                order("b2", Side::Bid, 0.22, 2),
            ],
        );
        assert_eq!(book.best_bid().unwrap().txid, "b2");
        assert_eq!(book.best_ask().unwrap().txid, "a2");
        assert!((book.spread().unwrap() - 0.06).abs() < 1e-9);
        assert!((book.mid().unwrap() - 0.25).abs() < 1e-9);
        assert_eq!(book.find("a1").unwrap().side, Side::Ask);
        assert!(OrderBook::empty("GOLD/NXS").spread().is_none());
    }
}
