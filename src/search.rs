//! Free-text search over a token catalog.
//!
//! Each indexable field contributes only its strongest match (exact beats
//! prefix beats substring). Weights are spaced so a stronger signal always
//! outranks any combination of weaker ones.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::DexError;
use crate::models::Token;

pub const EXACT_TICKER: u32 = 10_000;
pub const EXACT_NAME: u32 = 5_000;
pub const EXACT_ADDRESS: u32 = 2_500;
pub const PREFIX_TICKER: u32 = 1_000;
pub const PREFIX_NAME: u32 = 500;
pub const SUBSTRING_TICKER: u32 = 250;
pub const SUBSTRING_NAME: u32 = 120;
pub const SUBSTRING_ADDRESS: u32 = 60;
pub const SUBSTRING_ALIAS: u32 = 30;
pub const ACTIVE_MARKET: u32 = 8;
pub const ACTIVE_BIDS: u32 = 4;
pub const ACTIVE_ASKS: u32 = 4;

/// Whether a token currently trades against the native currency.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarketActivity {
    pub has_market: bool,
    pub has_bids: bool,
    pub has_asks: bool,
}

impl MarketActivity {
    pub fn from_counts(bids: usize, asks: usize) -> Self {
        Self {
            has_market: bids + asks > 0,
            has_bids: bids > 0,
            has_asks: asks > 0,
        }
    }

    fn merge(&mut self, other: MarketActivity) {
        self.has_market |= other.has_market;
        self.has_bids |= other.has_bids;
        self.has_asks |= other.has_asks;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchableToken {
    pub token: Token,
    #[serde(skip)]
    ticker: String,
    #[serde(skip)]
    name: String,
    #[serde(skip)]
    address: String,
    /// Lower-cased global/local names the token resolves from.
    pub aliases: Vec<String>,
    pub activity: MarketActivity,
    pub relevance_score: u32,
}

impl SearchableToken {
    pub fn new(token: Token) -> Self {
        Self {
            ticker: token.ticker.to_lowercase(),
            name: token.name.as_deref().unwrap_or_default().to_lowercase(),
            address: token.address.to_lowercase(),
            token,
            aliases: Vec::new(),
            activity: MarketActivity::default(),
            relevance_score: 0,
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.push_alias(alias);
        self
    }

    pub fn with_activity(mut self, activity: MarketActivity) -> Self {
        self.activity = activity;
        self
    }

    fn push_alias(&mut self, alias: &str) {
        let alias = alias.trim().to_lowercase();
        if !alias.is_empty() && !self.aliases.contains(&alias) {
            self.aliases.push(alias);
        }
    }

    /// Relevance of this token for an already lower-cased, non-empty query.
    pub fn score(&self, query: &str) -> u32 {
        let ticker = field_score(&self.ticker, query, EXACT_TICKER, PREFIX_TICKER, SUBSTRING_TICKER);
        let name = field_score(&self.name, query, EXACT_NAME, PREFIX_NAME, SUBSTRING_NAME);
        let address = field_score(&self.address, query, EXACT_ADDRESS, 0, SUBSTRING_ADDRESS);
        let alias = if self.aliases.iter().any(|a| a.contains(query)) {
            SUBSTRING_ALIAS
        } else {
            0
        };

        let text = ticker + name + address + alias;
        if text == 0 {
            return 0;
        }

        let mut activity = 0;
        if self.activity.has_market {
            activity += ACTIVE_MARKET;
        }
        if self.activity.has_bids {
            activity += ACTIVE_BIDS;
        }
        if self.activity.has_asks {
            activity += ACTIVE_ASKS;
        }
        text + activity
    }
}

fn field_score(field: &str, query: &str, exact: u32, prefix: u32, substring: u32) -> u32 {
    if field.is_empty() {
        0
    } else if field == query {
        exact
    } else if prefix > 0 && field.starts_with(query) {
        prefix
    } else if field.contains(query) {
        substring
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Ticker,
    CurrentSupply,
    MaxSupply,
    Modified,
}

impl std::str::FromStr for SortKey {
    type Err = DexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "ticker" => Ok(SortKey::Ticker),
            "supply" | "current_supply" => Ok(SortKey::CurrentSupply),
            "max_supply" => Ok(SortKey::MaxSupply),
            "modified" => Ok(SortKey::Modified),
            other => Err(DexError::validation(format!("unknown sort key: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl std::str::FromStr for SortDirection {
    type Err = DexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(DexError::validation(format!("unknown sort direction: {}", other))),
        }
    }
}

fn compare_by_key(a: &SearchableToken, b: &SearchableToken, key: SortKey) -> Ordering {
    match key {
        SortKey::Ticker => a.ticker.cmp(&b.ticker),
        SortKey::CurrentSupply => a.token.current_supply.total_cmp(&b.token.current_supply),
        SortKey::MaxSupply => a.token.max_supply.total_cmp(&b.token.max_supply),
        SortKey::Modified => a.token.modified.cmp(&b.token.modified),
    }
}

fn compare_secondary(
    a: &SearchableToken,
    b: &SearchableToken,
    key: SortKey,
    direction: SortDirection,
) -> Ordering {
    let ord = compare_by_key(a, b, key);
    let ord = match direction {
        SortDirection::Ascending => ord,
        SortDirection::Descending => ord.reverse(),
    };
    ord.then_with(|| a.token.address.cmp(&b.token.address))
}

/// Collapse tokens found by several strategies into one entry per address.
///
/// Register addresses are base58 and compared exactly.
pub fn dedupe_by_address(tokens: Vec<SearchableToken>) -> Vec<SearchableToken> {
    let mut unique: Vec<SearchableToken> = Vec::with_capacity(tokens.len());
    for token in tokens {
        match unique
            .iter_mut()
            .find(|t| t.token.address == token.token.address)
        {
            Some(existing) => {
                for alias in &token.aliases {
                    existing.push_alias(alias);
                }
                existing.activity.merge(token.activity);
                if existing.token.name.is_none() && token.token.name.is_some() {
                    existing.name = token.name;
                    existing.token.name = token.token.name;
                }
            }
            None => unique.push(token),
        }
    }
    unique
}

/// Deduplicate, score and order tokens for `query`.
///
/// Tokens with no textual match are dropped. An empty query skips scoring and
/// orders everything by the secondary key.
pub fn rank(
    tokens: Vec<SearchableToken>,
    query: &str,
    key: SortKey,
    direction: SortDirection,
) -> Vec<SearchableToken> {
    let mut tokens = dedupe_by_address(tokens);
    let query = query.trim().to_lowercase();

    if query.is_empty() {
        for t in &mut tokens {
            t.relevance_score = 0;
        }
        tokens.sort_by(|a, b| compare_secondary(a, b, key, direction));
        return tokens;
    }

    for t in &mut tokens {
        t.relevance_score = t.score(&query);
    }
    tokens.retain(|t| t.relevance_score > 0);
    tokens.sort_by(|a, b| {
        b.relevance_score
            .cmp(&a.relevance_score)
            .then_with(|| compare_secondary(a, b, key, direction))
    });
    tokens
}
