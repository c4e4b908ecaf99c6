//! The trading coordinator exposed to a front end.
//!
//! `Trader` owns the screen state as named slices (pair registry, active book,
//! the user's own orders, recent trades, wallet accounts) and mutates them only
//! through the operations below. State is locked for short synchronous
//! sections and never across an await; results of remote calls are applied
//! only if the pair they were issued for is still active.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::accounts::{resolve_order_accounts, AccountPreference, OrderAccounts, TradeIntent};
use crate::cache::TokenCatalog;
use crate::config::Config;
use crate::error::{DexError, Result};
use crate::ledger::{LedgerApi, OrderRequest};
use crate::models::{is_native_ticker, Account, OrderBook, Side, Token, TradingPair, NATIVE_TICKER};
use crate::normalize::normalize_book;
use crate::pairs::{cross_pairs, pairs_from_holdings, PairRegistry, RefreshTicket};
use crate::search::{rank, MarketActivity, SearchableToken, SortDirection, SortKey};
use crate::units::{parse_order_input, to_wire};
use crate::utils::join_best_effort;

#[derive(Debug, Default)]
struct MarketState {
    registry: PairRegistry,
    book: Option<OrderBook>,
    user_orders: Option<OrderBook>,
    recent_trades: Option<OrderBook>,
    accounts: Option<Vec<Account>>,
}

#[derive(Debug, Clone, Copy)]
enum BookSlot {
    Market,
    User,
    Trades,
}

impl BookSlot {
    fn operation(&self) -> &'static str {
        match self {
            BookSlot::Market => "market/list/order",
            BookSlot::User => "market/user/order",
            BookSlot::Trades => "market/list/executed",
        }
    }
}

/// Confirmation of a submitted create, execute or cancel.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderReceipt {
    pub txid: String,
    pub pair: Option<String>,
    pub warnings: Vec<String>,
    /// False when the follow-up book refresh failed or timed out.
    pub book_refreshed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Refreshed(OrderBook),
    /// A previous poll was still outstanding.
    Skipped,
    /// The active pair changed while the poll was in flight.
    Discarded,
}

/// Clears the in-flight flag however the poll ends, including cancellation.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Trader {
    api: Arc<dyn LedgerApi>,
    config: Config,
    preference: AccountPreference,
    catalog: TokenCatalog,
    state: Mutex<MarketState>,
    poll_in_flight: AtomicBool,
}

impl Trader {
    pub fn new(api: Arc<dyn LedgerApi>, config: Config) -> Self {
        Self {
            api,
            config,
            preference: AccountPreference::default(),
            catalog: TokenCatalog::default(),
            state: Mutex::new(MarketState::default()),
            poll_in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_preference(mut self, preference: AccountPreference) -> Self {
        self.preference = preference;
        self
    }

    /// Seed search with a cached catalog snapshot.
    pub fn with_catalog(mut self, catalog: TokenCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, MarketState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn pairs(&self) -> Vec<TradingPair> {
        self.state().registry.pairs().to_vec()
    }

    pub fn add_pair(&self, id: &str) -> Result<bool> {
        let pair = TradingPair::parse(id)?;
        Ok(self.state().registry.add(pair))
    }

    pub fn remove_pair(&self, id: &str) -> bool {
        let mut state = self.state();
        let was_active = state.registry.active().is_some_and(|p| p.id == id);
        let removed = state.registry.remove(id);
        if was_active {
            Self::clear_books(&mut state);
        }
        removed
    }

    /// Register both directions for every combination of `tickers`.
    pub fn add_cross_pairs<S: AsRef<str>>(&self, tickers: &[S]) -> Result<usize> {
        let pairs = cross_pairs(tickers)?;
        Ok(self.state().registry.extend(pairs))
    }

    /// Register `{ticker}/NXS` for every funded token account.
    pub async fn add_holding_pairs(&self) -> Result<usize> {
        let accounts = self.accounts().await?;
        Ok(self.state().registry.extend(pairs_from_holdings(&accounts)))
    }

    pub fn mark_selected(&self, id: &str) -> Result<()> {
        self.state().registry.select(id)
    }

    pub fn unmark_selected(&self, id: &str) -> bool {
        self.state().registry.deselect(id)
    }

    pub fn selected_pairs(&self) -> Vec<TradingPair> {
        self.state().registry.selected().into_iter().cloned().collect()
    }

    pub fn active_pair(&self) -> Option<TradingPair> {
        self.state().registry.active().cloned()
    }

    /// Make `id` the active market, dropping every book cached for the old one.
    pub fn select_pair(&self, id: &str) -> Result<TradingPair> {
        let mut state = self.state();
        if state.registry.activate(id)? {
            Self::clear_books(&mut state);
            debug!(pair = id, "active pair changed");
        }
        state
            .registry
            .active()
            .cloned()
            .ok_or_else(|| DexError::validation(format!("pair {} could not be activated", id)))
    }

    fn clear_books(state: &mut MarketState) {
        state.book = None;
        state.user_orders = None;
        state.recent_trades = None;
    }

    pub fn active_order_book(&self) -> Option<OrderBook> {
        self.state().book.clone()
    }

    pub fn user_orders(&self) -> Option<OrderBook> {
        self.state().user_orders.clone()
    }

    pub fn recent_trades(&self) -> Option<OrderBook> {
        self.state().recent_trades.clone()
    }

    fn active_ticket(&self) -> Result<RefreshTicket> {
        self.state()
            .registry
            .ticket()
            .ok_or_else(|| DexError::validation("no active pair selected"))
    }

    fn apply(&self, ticket: &RefreshTicket, slot: BookSlot, book: OrderBook) -> Result<OrderBook> {
        let mut state = self.state();
        if !state.registry.is_current(ticket) {
            debug!(pair = %ticket.pair, ?slot, "discarding stale result");
            return Err(DexError::stale(&ticket.pair.id));
        }
        let target = match slot {
            BookSlot::Market => &mut state.book,
            BookSlot::User => &mut state.user_orders,
            BookSlot::Trades => &mut state.recent_trades,
        };
        *target = Some(book.clone());
        Ok(book)
    }

    async fn refresh_slot(&self, slot: BookSlot) -> Result<OrderBook> {
        let ticket = self.active_ticket()?;
        let pair = &ticket.pair;
        let fetched = match slot {
            BookSlot::Market => self.api.list_orders(pair, self.config.order_limit).await,
            BookSlot::User => self.api.list_user_orders(pair).await,
            BookSlot::Trades => self.api.list_executed(pair, self.config.trade_limit).await,
        };
        let book = match fetched {
            Ok(raw) => normalize_book(&raw, pair),
            Err(e) => {
                warn!(pair = %pair, "{}", DexError::remote(slot.operation(), format!("{:#}", e)));
                OrderBook::empty(&pair.id)
            }
        };
        self.apply(&ticket, slot, book)
    }

    /// Fetch and normalize the active pair's book.
    ///
    /// Fails with `StaleDataDiscarded` if the active pair changed while the
    /// request was in flight; the newer pair's state is left untouched.
    pub async fn refresh_order_book(&self) -> Result<OrderBook> {
        self.refresh_slot(BookSlot::Market).await
    }

    pub async fn refresh_user_orders(&self) -> Result<OrderBook> {
        self.refresh_slot(BookSlot::User).await
    }

    pub async fn refresh_recent_trades(&self) -> Result<OrderBook> {
        self.refresh_slot(BookSlot::Trades).await
    }

    /// One auto-refresh tick: at most one book request is ever outstanding.
    pub async fn poll_order_book(&self) -> Result<PollOutcome> {
        if self.poll_in_flight.swap(true, Ordering::AcqRel) {
            debug!("previous poll still in flight, skipping");
            return Ok(PollOutcome::Skipped);
        }
        let _guard = InFlight(&self.poll_in_flight);
        match self.refresh_order_book().await {
            Ok(book) => Ok(PollOutcome::Refreshed(book)),
            Err(DexError::StaleDataDiscarded { .. }) => Ok(PollOutcome::Discarded),
            Err(e) => Err(e),
        }
    }

    /// Poll the active book every `poll_interval` until `cancel` fires.
    ///
    /// Cancelling also drops a poll that is still in flight, so nothing is
    /// written to the book once the returned task has finished.
    pub fn spawn_auto_refresh(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let trader = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(trader.config.poll_interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    outcome = trader.poll_order_book() => match outcome {
                        Ok(PollOutcome::Refreshed(book)) => info!(
                            pair = %book.pair,
                            bids = book.bids.len(),
                            asks = book.asks.len(),
                            best_bid = ?book.best_bid().map(|o| o.price),
                            best_ask = ?book.best_ask().map(|o| o.price),
                            "book refreshed"
                        ),
                        Ok(_) => {}
                        Err(e) => debug!("poll skipped: {}", e),
                    },
                }
            }
            debug!("auto refresh stopped");
        })
    }

    /// Reload wallet accounts. A failed listing degrades to an empty result and
    /// keeps whatever was cached before.
    pub async fn refresh_accounts(&self) -> Vec<Account> {
        match self.api.list_accounts().await {
            Ok(accounts) => {
                self.state().accounts = Some(accounts.clone());
                accounts
            }
            Err(e) => {
                warn!("{}", DexError::remote("finance/list/accounts", format!("{:#}", e)));
                Vec::new()
            }
        }
    }

    /// Cached accounts, fetched once on first use. Failures surface here since
    /// trading decisions depend on them.
    async fn accounts(&self) -> Result<Vec<Account>> {
        if let Some(accounts) = self.state().accounts.clone() {
            return Ok(accounts);
        }
        let accounts = self
            .api
            .list_accounts()
            .await
            .map_err(|e| DexError::remote("finance/list/accounts", format!("{:#}", e)))?;
        self.state().accounts = Some(accounts.clone());
        Ok(accounts)
    }

    pub async fn resolve_accounts_for_pair(
        &self,
        pair: &TradingPair,
        side: Side,
        intent: TradeIntent,
    ) -> Result<OrderAccounts> {
        let accounts = self.accounts().await?;
        resolve_order_accounts(pair, side, intent, &accounts, &self.preference)
    }

    fn require_active(&self) -> Result<TradingPair> {
        self.active_pair()
            .ok_or_else(|| DexError::validation("no active pair selected"))
    }

    /// Refresh `pair`'s book after a write, but never hold up the confirmation.
    ///
    /// False when `pair` stopped being the active market in the meantime.
    async fn refresh_after_write(&self, pair: &TradingPair) -> bool {
        if self.active_pair().as_ref() != Some(pair) {
            debug!(pair = %pair, "active pair changed during submit, skipping refresh");
            return false;
        }
        match tokio::time::timeout(self.config.refresh_timeout(), self.refresh_order_book()).await {
            Ok(Ok(book)) => book.pair == pair.id,
            Ok(Err(e)) => {
                debug!("post-submit refresh not applied: {}", e);
                false
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.config.refresh_timeout_ms,
                    "post-submit refresh timed out"
                );
                false
            }
        }
    }

    /// Place a limit order on the active pair from user-entered strings.
    pub async fn create_order(&self, side: Side, amount: &str, price: &str) -> Result<OrderReceipt> {
        let pair = self.require_active()?;
        let (amount, price) = parse_order_input(amount, price)?;
        let accounts = self
            .resolve_accounts_for_pair(&pair, side, TradeIntent::Create)
            .await?;

        let request = OrderRequest {
            side,
            pair: pair.id.clone(),
            amount: to_wire(amount, pair.base_ticker.as_str())?,
            price,
            from: accounts.from.name_or_address.clone(),
            to: accounts.to.name_or_address.clone(),
        };
        let txid = self
            .api
            .create_order(&request)
            .await
            .map_err(|e| DexError::remote(format!("market/create/{}", side), format!("{:#}", e)))?;
        info!(pair = %pair, %side, amount, price, %txid, "order created");

        let book_refreshed = self.refresh_after_write(&pair).await;
        Ok(OrderReceipt {
            txid,
            pair: Some(pair.id),
            warnings: accounts.warnings,
            book_refreshed,
        })
    }

    /// Fill an order from the active book.
    pub async fn execute_order(&self, txid: &str) -> Result<OrderReceipt> {
        let pair = self.require_active()?;
        let side = self
            .state()
            .book
            .as_ref()
            .and_then(|b| b.find(txid))
            .map(|o| o.side)
            .ok_or_else(|| {
                DexError::validation(format!("order {} is not in the {} book", txid, pair.id))
            })?;
        let accounts = self
            .resolve_accounts_for_pair(&pair, side, TradeIntent::Execute)
            .await?;

        let executed = self
            .api
            .execute_order(txid, &accounts.from.name_or_address, &accounts.to.name_or_address)
            .await
            .map_err(|e| DexError::remote("market/execute/order", format!("{:#}", e)))?;
        info!(pair = %pair, order = txid, txid = %executed, "order executed");

        let book_refreshed = self.refresh_after_write(&pair).await;
        Ok(OrderReceipt {
            txid: executed,
            pair: Some(pair.id),
            warnings: accounts.warnings,
            book_refreshed,
        })
    }

    pub async fn cancel_order(&self, txid: &str) -> Result<OrderReceipt> {
        if txid.trim().is_empty() {
            return Err(DexError::validation("txid is required"));
        }
        let pair = self.active_pair();
        let cancelled = self
            .api
            .cancel_order(txid)
            .await
            .map_err(|e| DexError::remote("market/cancel/order", format!("{:#}", e)))?;
        info!(order = txid, txid = %cancelled, "order cancelled");

        let book_refreshed = match &pair {
            Some(pair) => self.refresh_after_write(pair).await,
            None => false,
        };
        Ok(OrderReceipt {
            txid: cancelled,
            pair: pair.map(|p| p.id),
            warnings: Vec::new(),
            book_refreshed,
        })
    }

    /// Every token the ledger knows about, for caching.
    pub async fn discover_catalog(&self) -> Result<TokenCatalog> {
        let tokens = self
            .api
            .list_tokens("")
            .await
            .map_err(|e| DexError::remote("register/list/finance:token", format!("{:#}", e)))?;
        Ok(TokenCatalog::new(tokens))
    }

    /// Search the ledger (and cached catalog) for tokens matching `query`.
    ///
    /// Several lookup strategies run concurrently; any that fail are dropped.
    /// The best text matches are then probed for an active `{ticker}/NXS` market.
    pub async fn search_tokens(
        &self,
        query: &str,
        sort_key: SortKey,
        direction: SortDirection,
    ) -> Result<Vec<SearchableToken>> {
        let query = query.trim();
        let mut found = self.discover_tokens(query).await;
        found.extend(
            self.catalog
                .tokens
                .iter()
                .cloned()
                .map(SearchableToken::new),
        );

        let ranked = rank(found, query, sort_key, direction);
        if query.is_empty() || self.config.activity_probe_limit == 0 {
            return Ok(ranked);
        }

        let probed = self.probe_activity(&ranked).await;
        let with_activity = ranked
            .into_iter()
            .map(|t| {
                let activity = probed
                    .iter()
                    .find(|(address, _)| *address == t.token.address)
                    .map(|(_, a)| *a)
                    .unwrap_or_default();
                t.with_activity(activity)
            })
            .collect();
        Ok(rank(with_activity, query, sort_key, direction))
    }

    async fn discover_tokens(&self, query: &str) -> Vec<SearchableToken> {
        if query.is_empty() {
            let probes = vec![("all tokens".to_string(), self.api.list_tokens(""))];
            return join_best_effort(probes)
                .await
                .into_iter()
                .flatten()
                .map(SearchableToken::new)
                .collect();
        }

        let upper = query.to_uppercase();
        let filters = [
            format!("results.ticker={}", upper),
            format!("results.ticker={}*", upper),
            format!("results.ticker=*{}*", upper),
        ];
        let probes = filters
            .iter()
            .map(|f| (format!("list_tokens({})", f), self.api.list_tokens(f)))
            .collect();

        let by_name = async {
            self.api
                .resolve_token_by_name(query)
                .await
                .map(|t| vec![SearchableToken::new(t).with_alias(query)])
        };

        let (listed, named) = tokio::join!(
            join_best_effort(probes),
            join_best_effort(vec![(format!("resolve_token_by_name({})", query), by_name)]),
        );

        listed
            .into_iter()
            .flatten()
            .map(SearchableToken::new)
            .chain(named.into_iter().flatten())
            .collect()
    }

    async fn probe_activity(&self, ranked: &[SearchableToken]) -> Vec<(String, MarketActivity)> {
        let probes = ranked
            .iter()
            .filter(|t| !is_native_ticker(&t.token.ticker))
            .take(self.config.activity_probe_limit)
            .filter_map(|t| {
                let pair = TradingPair::new(&t.token.ticker, NATIVE_TICKER).ok()?;
                let address = t.token.address.clone();
                Some((format!("activity({})", pair), async move {
                    let book = self.api.list_orders(&pair, 1).await?;
                    let activity = MarketActivity::from_counts(book.bids.len(), book.asks.len());
                    Ok::<_, anyhow::Error>((address, activity))
                }))
            })
            .collect();
        join_best_effort(probes).await
    }

    /// Resolve a token by its register name.
    pub async fn resolve_token(&self, name: &str) -> Result<Token> {
        self.api
            .resolve_token_by_name(name)
            .await
            .map_err(|e| DexError::remote("register/get/finance:token", format!("{:#}", e)))
    }
}
