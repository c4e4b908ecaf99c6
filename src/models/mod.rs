pub mod account;
pub mod order;
pub mod pair;
pub mod token;

pub use account::Account;
pub use order::{NormalizedOrder, OrderBook, RawOrder, RawOrderBook, Side};
pub use pair::TradingPair;
pub use token::{is_native_ticker, Token, NATIVE_TICKER};
