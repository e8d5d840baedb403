//! Quoting facade over a snapshot of pairs.

use crate::amount::TokenAmount;
use crate::config::RoutingConfig;
use crate::currency::Token;
use crate::pair::{Pair, PairError};
use crate::route::{Route, RouteError};
use crate::trade::{Trade, TradeError, TradeRequest, TradeType};
use crate::types::Address;
use std::collections::HashMap;
use tracing::debug;

/// Answers swap and liquidity questions against one snapshot of pair reserves.
///
/// The quoter never refreshes its pairs. When on-chain reserves change, build
/// a new quoter (or call [`Quoter::upsert_pair`]) with the fresh snapshot.
#[derive(Debug, Clone, Default)]
pub struct Quoter {
    /// Routing and selection parameters.
    config: RoutingConfig,
    /// Pairs in insertion order.
    pairs: Vec<Pair>,
    /// Index of token address to positions in `pairs`.
    token_pairs: HashMap<Address, Vec<usize>>,
}

impl Quoter {
    /// Create a quoter with default configuration.
    pub fn new(pairs: Vec<Pair>) -> Self {
        Self::with_config(pairs, RoutingConfig::default())
    }

    /// Create a quoter with custom configuration.
    pub fn with_config(pairs: Vec<Pair>, config: RoutingConfig) -> Self {
        let mut quoter = Self {
            config,
            pairs: Vec::with_capacity(pairs.len()),
            token_pairs: HashMap::new(),
        };
        for pair in pairs {
            quoter.upsert_pair(pair);
        }
        quoter
    }

    /// Routing parameters applied to every quote.
    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Replace the routing parameters for later quotes.
    pub fn set_config(&mut self, config: RoutingConfig) {
        self.config = config;
    }

    /// The current snapshot, in insertion order.
    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    /// Insert a pair, replacing the snapshot of a pair with the same address.
    ///
    /// The token index follows the new snapshot, so a replacement that trades
    /// different tokens moves out of its old entries.
    pub fn upsert_pair(&mut self, pair: Pair) {
        let tokens = [pair.token0().address(), pair.token1().address()];
        let index = match self.pairs.iter().position(|p| p.address() == pair.address()) {
            Some(index) => {
                let existing = &self.pairs[index];
                for token in [existing.token0().address(), existing.token1().address()] {
                    if let Some(indices) = self.token_pairs.get_mut(&token) {
                        indices.retain(|&i| i != index);
                        if indices.is_empty() {
                            self.token_pairs.remove(&token);
                        }
                    }
                }
                self.pairs[index] = pair;
                index
            }
            None => {
                self.pairs.push(pair);
                self.pairs.len() - 1
            }
        };
        for token in tokens {
            let indices = self.token_pairs.entry(token).or_default();
            indices.push(index);
            // keep insertion order of pairs
            indices.sort_unstable();
        }
    }

    /// All pairs containing `token`.
    pub fn pairs_for_token(&self, token: &Token) -> Vec<&Pair> {
        self.token_pairs
            .get(&token.address())
            .map(|indices| indices.iter().map(|&i| &self.pairs[i]).collect())
            .unwrap_or_default()
    }

    /// The pair trading `token_a` against `token_b`, if any.
    pub fn pair_for(&self, token_a: &Token, token_b: &Token) -> Option<&Pair> {
        self.pairs_for_token(token_a)
            .into_iter()
            .find(|pair| pair.involves_token(token_b))
    }

    /// Best trade selling exactly `amount_in`.
    pub fn quote_exact_in(
        &self,
        amount_in: &TokenAmount,
        token_out: &Token,
    ) -> Result<Option<Trade>, QuoteError> {
        if amount_in.currency() == token_out {
            return Err(QuoteError::SameToken);
        }
        let request = TradeRequest::ExactIn {
            amount_in: amount_in.clone(),
            token_out: token_out.clone(),
        };
        Ok(Trade::best_trade(&self.pairs, &request, &self.config)?)
    }

    /// Best trade buying exactly `amount_out`.
    pub fn quote_exact_out(
        &self,
        token_in: &Token,
        amount_out: &TokenAmount,
    ) -> Result<Option<Trade>, QuoteError> {
        if amount_out.currency() == token_in {
            return Err(QuoteError::SameToken);
        }
        let request = TradeRequest::ExactOut {
            token_in: token_in.clone(),
            amount_out: amount_out.clone(),
        };
        Ok(Trade::best_trade(&self.pairs, &request, &self.config)?)
    }

    /// Best commission-adjusted route between two tokens for `amount`.
    ///
    /// `amount` is in `input` for an exact-input swap, in `output` otherwise.
    pub fn best_route(
        &self,
        input: &Token,
        output: &Token,
        amount: &TokenAmount,
    ) -> Result<Option<Route>, QuoteError> {
        if input == output {
            return Err(QuoteError::SameToken);
        }
        Ok(Route::from_best_rate(
            &self.pairs,
            input,
            output,
            amount,
            &self.config.commission,
        )?)
    }

    /// Trade along [`Quoter::best_route`], subject to the price impact limit.
    pub fn quote_by_best_rate(
        &self,
        input: &Token,
        output: &Token,
        amount: &TokenAmount,
    ) -> Result<Option<Trade>, QuoteError> {
        let Some(route) = self.best_route(input, output, amount)? else {
            return Ok(None);
        };
        let trade_type = if amount.currency() == input {
            TradeType::ExactInput
        } else {
            TradeType::ExactOutput
        };
        let trade = match Trade::new(route, amount.clone(), trade_type, &self.config.commission) {
            Ok(trade) => trade,
            Err(TradeError::Pair(
                PairError::InsufficientReserves | PairError::InsufficientInputAmount,
            )) => {
                debug!(%input, %output, "best-rate route cannot fill the amount");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        if trade.price_impact() >= &self.config.max_price_impact {
            debug!(
                route = %trade.route(),
                price_impact = %trade.price_impact(),
                "best-rate trade above price impact limit"
            );
            return Ok(None);
        }
        Ok(Some(trade))
    }

    /// Deposit of `token_b` matching `amount_a` in their shared pair, or `None`
    /// when no pair or no liquidity exists yet.
    pub fn quote_add_liquidity(
        &self,
        amount_a: &TokenAmount,
        token_b: &Token,
    ) -> Result<Option<TokenAmount>, QuoteError> {
        let Some(pair) = self.pair_for(amount_a.currency(), token_b) else {
            return Ok(None);
        };
        if pair.is_drained() {
            return Ok(None);
        }
        Ok(Some(pair.quote_liquidity_amount(amount_a)?))
    }
}

/// Errors from the quoting facade.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuoteError {
    #[error("input and output tokens are the same")]
    SameToken,

    #[error(transparent)]
    Trade(#[from] TradeError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Pair(#[from] PairError),
}
