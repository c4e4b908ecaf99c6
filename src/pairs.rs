//! The set of known trading pairs, the user's selection, and the active market.
//!
//! Every activation bumps a generation counter. A refresh captures a
//! [`RefreshTicket`] when it is issued and may only be applied while that
//! ticket is still current.

use serde::Serialize;

use crate::error::{DexError, Result};
use crate::models::{is_native_ticker, Account, TradingPair, NATIVE_TICKER};

/// Identifies the active pair at the moment a refresh was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshTicket {
    pub pair: TradingPair,
    generation: u64,
}

#[derive(Debug, Clone, Default)]
pub struct PairRegistry {
    pairs: Vec<TradingPair>,
    selected: Vec<String>,
    active: Option<TradingPair>,
    generation: u64,
}

/// `{ticker}/NXS` for every non-native token held with a positive balance.
pub fn pairs_from_holdings(holdings: &[Account]) -> Vec<TradingPair> {
    let mut pairs: Vec<TradingPair> = Vec::new();
    for account in holdings.iter().filter(|a| a.has_funds()) {
        let ticker = match account.ticker.as_deref() {
            Some(t) if !t.is_empty() && !is_native_ticker(t) => t,
            _ => continue,
        };
        if pairs.iter().any(|p| p.base_ticker == ticker) {
            continue;
        }
        if let Ok(pair) = TradingPair::new(ticker, NATIVE_TICKER) {
            pairs.push(pair);
        }
    }
    pairs
}

/// Both directions of every unordered combination of `tickers`.
///
/// `n` distinct tickers yield `n * (n - 1)` pairs; self-pairs never appear.
pub fn cross_pairs<S: AsRef<str>>(tickers: &[S]) -> Result<Vec<TradingPair>> {
    let mut unique: Vec<&str> = Vec::new();
    for t in tickers.iter().map(|t| t.as_ref().trim()) {
        if !t.is_empty() && !unique.contains(&t) {
            unique.push(t);
        }
    }
    if unique.len() < 2 {
        return Err(DexError::validation(format!(
            "cross pairs need at least two distinct tokens, got {}",
            unique.len()
        )));
    }

    let mut pairs = Vec::with_capacity(unique.len() * (unique.len() - 1));
    for (i, a) in unique.iter().enumerate() {
        for b in &unique[i + 1..] {
            pairs.push(TradingPair::new(a, b)?);
            pairs.push(TradingPair::new(b, a)?);
        }
    }
    Ok(pairs)
}

impl PairRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pairs(&self) -> &[TradingPair] {
        &self.pairs
    }

    pub fn get(&self, id: &str) -> Option<&TradingPair> {
        self.pairs.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Returns false when a pair with the same id is already known.
    pub fn add(&mut self, pair: TradingPair) -> bool {
        if self.contains(&pair.id) {
            return false;
        }
        self.pairs.push(pair);
        true
    }

    /// Add every pair, returning how many were new.
    pub fn extend<I: IntoIterator<Item = TradingPair>>(&mut self, pairs: I) -> usize {
        let mut added = 0;
        for pair in pairs {
            if self.add(pair) {
                added += 1;
            }
        }
        added
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.pairs.len();
        self.pairs.retain(|p| p.id != id);
        self.selected.retain(|s| s != id);
        if self.active.as_ref().is_some_and(|p| p.id == id) {
            self.active = None;
            self.generation += 1;
        }
        self.pairs.len() != before
    }

    pub fn select(&mut self, id: &str) -> Result<()> {
        if !self.contains(id) {
            return Err(DexError::validation(format!("unknown pair {}", id)));
        }
        if !self.selected.iter().any(|s| s == id) {
            self.selected.push(id.to_string());
        }
        Ok(())
    }

    pub fn deselect(&mut self, id: &str) -> bool {
        let before = self.selected.len();
        self.selected.retain(|s| s != id);
        self.selected.len() != before
    }

    pub fn selected(&self) -> Vec<&TradingPair> {
        self.selected.iter().filter_map(|id| self.get(id)).collect()
    }

    pub fn active(&self) -> Option<&TradingPair> {
        self.active.as_ref()
    }

    /// Make `id` the active pair, registering it if needed.
    ///
    /// Returns true when the active market changed; callers must then drop any
    /// state cached for the previous pair.
    pub fn activate(&mut self, id: &str) -> Result<bool> {
        if self.active.as_ref().is_some_and(|p| p.id == id) {
            return Ok(false);
        }
        let pair = match self.get(id) {
            Some(p) => p.clone(),
            None => {
                let p = TradingPair::parse(id)?;
                self.pairs.push(p.clone());
                p
            }
        };
        self.active = Some(pair);
        self.generation += 1;
        Ok(true)
    }

    pub fn ticket(&self) -> Option<RefreshTicket> {
        self.active.as_ref().map(|pair| RefreshTicket {
            pair: pair.clone(),
            generation: self.generation,
        })
    }

    pub fn is_current(&self, ticket: &RefreshTicket) -> bool {
        ticket.generation == self.generation
            && self.active.as_ref().is_some_and(|p| p.id == ticket.pair.id)
    }
}
