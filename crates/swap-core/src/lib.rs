//! Exact-arithmetic routing core for constant-product token swaps.
//!
//! This library provides:
//! - Exact rational and integer amounts (`Fraction`, `Wei`, `Percent`, `Price`)
//! - Currency-bound amounts for on-chain tokens
//! - A multiplicative shortest-path graph for best-rate route discovery
//! - Constant-product pair math, routes and trades with price impact limits
//! - A quoting facade over a snapshot of pairs
//!
//! Every computation is synchronous and works on caller-supplied snapshots.
//! "No route" and "no acceptable trade" are `Ok(None)`; broken invariants
//! are `Err`.

pub mod amount;
pub mod config;
pub mod currency;
pub mod fraction;
pub mod graph;
pub mod pair;
pub mod percent;
pub mod price;
pub mod quoter;
pub mod route;
pub mod trade;
pub mod types;
pub mod wei;

pub use amount::{AmountError, CurrencyAmount, TokenAmount};
pub use config::RoutingConfig;
pub use currency::{Currency, Denomination, Token};
pub use fraction::{Fraction, FractionError, Rounding};
pub use graph::{Edge, Graph, GraphError, GraphPath};
pub use pair::{Pair, PairError, MINIMUM_LIQUIDITY};
pub use percent::Percent;
pub use price::{Price, PriceError};
pub use quoter::{QuoteError, Quoter};
pub use route::{Route, RouteError};
pub use trade::{BestTradeOptions, Trade, TradeError, TradeRequest, TradeType};
pub use types::{Address, TokenSymbol, WeiAsToken, U256};
pub use wei::{Wei, WeiError, MAX_SAFE_INTEGER};
