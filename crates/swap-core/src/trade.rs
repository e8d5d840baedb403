//! Trades along a route, ranked trade enumeration and best-trade selection.

use crate::amount::{AmountError, TokenAmount};
use crate::config::RoutingConfig;
use crate::currency::Token;
use crate::fraction::{Fraction, FractionError};
use crate::pair::{Pair, PairError};
use crate::percent::Percent;
use crate::price::{Price, PriceError};
use crate::route::{Route, RouteError};
use crate::types::Address;
use std::cmp::Ordering;
use tracing::{debug, trace};

/// Which side of a trade is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeType {
    ExactInput,
    ExactOutput,
}

/// Limits for trade enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BestTradeOptions {
    /// How many ranked trades to keep.
    pub max_num_results: usize,
    /// Maximum number of pairs in a route.
    pub max_hops: usize,
}

impl Default for BestTradeOptions {
    fn default() -> Self {
        Self {
            max_num_results: 3,
            max_hops: 3,
        }
    }
}

/// The fixed side of a swap request.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeRequest {
    /// Sell exactly `amount_in`, buying as much `token_out` as possible.
    ExactIn {
        amount_in: TokenAmount,
        token_out: Token,
    },
    /// Buy exactly `amount_out`, selling as little `token_in` as possible.
    ExactOut {
        token_in: Token,
        amount_out: TokenAmount,
    },
}

/// A swap of a concrete size along a route.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    route: Route,
    trade_type: TradeType,
    input_amount: TokenAmount,
    output_amount: TokenAmount,
    execution_price: Price<Token>,
    price_impact: Percent,
}

impl Trade {
    /// Walk `amount` through the route's pairs.
    ///
    /// For [`TradeType::ExactInput`] `amount` must be in the route input token
    /// and is pushed forward hop by hop. For [`TradeType::ExactOutput`] it must
    /// be in the route output token and is pulled backward.
    pub fn new(
        route: Route,
        amount: TokenAmount,
        trade_type: TradeType,
        commission: &Percent,
    ) -> Result<Self, TradeError> {
        let (input_amount, output_amount) = match trade_type {
            TradeType::ExactInput => {
                if amount.currency() != route.input() {
                    return Err(TradeError::AmountNotOnRoute(amount.currency().address()));
                }
                let mut running = amount.clone();
                for pair in route.pairs() {
                    running = pair.get_output_amount(&running, commission)?;
                }
                (amount, running)
            }
            TradeType::ExactOutput => {
                if amount.currency() != route.output() {
                    return Err(TradeError::AmountNotOnRoute(amount.currency().address()));
                }
                let mut running = amount.clone();
                for pair in route.pairs().iter().rev() {
                    running = pair.get_input_amount(&running, commission)?;
                }
                (running, amount)
            }
        };

        let execution_price = Price::new(
            input_amount.currency().clone(),
            output_amount.currency().clone(),
            input_amount.raw().to_big_int(),
            output_amount.raw().to_big_int(),
        )?;
        let price_impact = price_impact(route.mid_price(), &input_amount, &output_amount)?;

        Ok(Self {
            route,
            trade_type,
            input_amount,
            output_amount,
            execution_price,
            price_impact,
        })
    }

    pub fn exact_in(
        route: Route,
        amount_in: TokenAmount,
        commission: &Percent,
    ) -> Result<Self, TradeError> {
        Self::new(route, amount_in, TradeType::ExactInput, commission)
    }

    pub fn exact_out(
        route: Route,
        amount_out: TokenAmount,
        commission: &Percent,
    ) -> Result<Self, TradeError> {
        Self::new(route, amount_out, TradeType::ExactOutput, commission)
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn trade_type(&self) -> TradeType {
        self.trade_type
    }

    pub fn input_amount(&self) -> &TokenAmount {
        &self.input_amount
    }

    pub fn output_amount(&self) -> &TokenAmount {
        &self.output_amount
    }

    /// Output per input actually realized by this trade.
    pub fn execution_price(&self) -> &Price<Token> {
        &self.execution_price
    }

    /// Shortfall of the realized output against the pre-trade mid price.
    pub fn price_impact(&self) -> &Percent {
        &self.price_impact
    }

    /// Token addresses the swap router walks, input first.
    pub fn route_path(&self) -> Vec<Address> {
        self.route.path_addresses()
    }

    /// Least output to accept with `slippage` tolerance.
    pub fn minimum_amount_out(&self, slippage: &Percent) -> Result<TokenAmount, TradeError> {
        if slippage.is_negative() {
            return Err(TradeError::InvalidSlippage(slippage.to_string()));
        }
        match self.trade_type {
            TradeType::ExactOutput => Ok(self.output_amount.clone()),
            TradeType::ExactInput => {
                let factor = Fraction::one().plus(slippage.as_fraction()).invert()?;
                Ok(self.output_amount.multiplied_by(&factor))
            }
        }
    }

    /// Most input to spend with `slippage` tolerance.
    pub fn maximum_amount_in(&self, slippage: &Percent) -> Result<TokenAmount, TradeError> {
        if slippage.is_negative() {
            return Err(TradeError::InvalidSlippage(slippage.to_string()));
        }
        match self.trade_type {
            TradeType::ExactInput => Ok(self.input_amount.clone()),
            TradeType::ExactOutput => {
                let factor = Fraction::one().plus(slippage.as_fraction());
                Ok(self.input_amount.multiplied_by(&factor))
            }
        }
    }

    /// The best ranked trades selling exactly `amount_in` for `token_out`.
    ///
    /// Routes are enumerated depth-first over `pairs`, each pair used at most
    /// once per route. Pairs that cannot fill a hop are skipped.
    pub fn best_trade_exact_in(
        pairs: &[Pair],
        amount_in: &TokenAmount,
        token_out: &Token,
        options: &BestTradeOptions,
        commission: &Percent,
    ) -> Result<Vec<Trade>, TradeError> {
        validate(options)?;
        let mut search = Search::new(amount_in, token_out, options, commission);
        search.exact_in(pairs, amount_in, options.max_hops, &mut Vec::new())?;
        Ok(search.best)
    }

    /// The best ranked trades buying exactly `amount_out` with `token_in`.
    pub fn best_trade_exact_out(
        pairs: &[Pair],
        token_in: &Token,
        amount_out: &TokenAmount,
        options: &BestTradeOptions,
        commission: &Percent,
    ) -> Result<Vec<Trade>, TradeError> {
        validate(options)?;
        let mut search = Search::new(amount_out, token_in, options, commission);
        search.exact_out(pairs, amount_out, options.max_hops, &mut Vec::new())?;
        Ok(search.best)
    }

    /// The best ranked trade whose price impact stays under
    /// `config.max_price_impact`, or `None`.
    pub fn best_trade(
        pairs: &[Pair],
        request: &TradeRequest,
        config: &RoutingConfig,
    ) -> Result<Option<Trade>, TradeError> {
        let options = config.best_trade_options();
        let candidates = match request {
            TradeRequest::ExactIn {
                amount_in,
                token_out,
            } => Self::best_trade_exact_in(
                pairs,
                amount_in,
                token_out,
                &options,
                &config.commission,
            )?,
            TradeRequest::ExactOut {
                token_in,
                amount_out,
            } => Self::best_trade_exact_out(
                pairs,
                token_in,
                amount_out,
                &options,
                &config.commission,
            )?,
        };

        let found = candidates.len();
        let chosen = candidates.into_iter().find(|trade| {
            let acceptable = trade.price_impact < config.max_price_impact;
            if !acceptable {
                debug!(
                    route = %trade.route,
                    price_impact = %trade.price_impact,
                    max_price_impact = %config.max_price_impact,
                    "rejecting trade above price impact limit"
                );
            }
            acceptable
        });
        if chosen.is_none() {
            debug!(candidates = found, "no trade within price impact limit");
        }
        Ok(chosen)
    }
}

/// `(quoted - output) / quoted` where `quoted` is `input` at the mid price.
fn price_impact(
    mid_price: &Price<Token>,
    input: &TokenAmount,
    output: &TokenAmount,
) -> Result<Percent, TradeError> {
    let quoted = mid_price.raw().multiplied_by(&input.as_fraction());
    let shortfall = quoted.minus(&output.as_fraction());
    Ok(Percent::from_fraction(shortfall.divided_by(&quoted)?))
}

fn validate(options: &BestTradeOptions) -> Result<(), TradeError> {
    if options.max_hops == 0 {
        return Err(TradeError::InvalidOptions("max_hops must be positive"));
    }
    if options.max_num_results == 0 {
        return Err(TradeError::InvalidOptions("max_num_results must be positive"));
    }
    Ok(())
}

/// Ranking: more output, then less input, then lower impact, then fewer hops.
fn compare_trades(a: &Trade, b: &Trade) -> Ordering {
    b.output_amount
        .raw()
        .cmp(a.output_amount.raw())
        .then_with(|| a.input_amount.raw().cmp(b.input_amount.raw()))
        .then_with(|| a.price_impact.cmp(&b.price_impact))
        .then_with(|| a.route.len().cmp(&b.route.len()))
}

/// Insert keeping `items` ranked and at most `max_size` long.
fn sorted_insert(items: &mut Vec<Trade>, trade: Trade, max_size: usize) {
    let at = items.partition_point(|t| compare_trades(t, &trade) != Ordering::Greater);
    if at >= max_size {
        return;
    }
    items.insert(at, trade);
    items.truncate(max_size);
}

/// Depth-first trade enumeration state.
struct Search<'a> {
    // the amount the caller fixed and the token at the open end
    fixed: &'a TokenAmount,
    other_end: &'a Token,
    max_num_results: usize,
    commission: &'a Percent,
    best: Vec<Trade>,
}

impl<'a> Search<'a> {
    fn new(
        fixed: &'a TokenAmount,
        other_end: &'a Token,
        options: &BestTradeOptions,
        commission: &'a Percent,
    ) -> Self {
        Self {
            fixed,
            other_end,
            max_num_results: options.max_num_results,
            commission,
            best: Vec::new(),
        }
    }

    fn exact_in(
        &mut self,
        pairs: &[Pair],
        amount_in: &TokenAmount,
        hops_left: usize,
        current: &mut Vec<Pair>,
    ) -> Result<(), TradeError> {
        for (i, pair) in pairs.iter().enumerate() {
            if !pair.involves_token(amount_in.currency()) || pair.is_drained() {
                continue;
            }
            let amount_out = match pair.get_output_amount(amount_in, self.commission) {
                Ok(amount) => amount,
                Err(PairError::InsufficientInputAmount | PairError::InsufficientReserves) => {
                    trace!(pair = %pair.address(), "pair cannot fill hop");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            if amount_out.currency() == self.other_end {
                let mut route_pairs = current.clone();
                route_pairs.push(pair.clone());
                let route = Route::new(
                    route_pairs,
                    self.fixed.currency().clone(),
                    self.other_end.clone(),
                )?;
                let trade = Trade::exact_in(route, self.fixed.clone(), self.commission)?;
                sorted_insert(&mut self.best, trade, self.max_num_results);
            } else if hops_left > 1 && pairs.len() > 1 {
                let rest = without(pairs, i);
                current.push(pair.clone());
                self.exact_in(&rest, &amount_out, hops_left - 1, current)?;
                current.pop();
            }
        }
        Ok(())
    }

    fn exact_out(
        &mut self,
        pairs: &[Pair],
        amount_out: &TokenAmount,
        hops_left: usize,
        current: &mut Vec<Pair>,
    ) -> Result<(), TradeError> {
        for (i, pair) in pairs.iter().enumerate() {
            if !pair.involves_token(amount_out.currency()) || pair.is_drained() {
                continue;
            }
            let amount_in = match pair.get_input_amount(amount_out, self.commission) {
                Ok(amount) => amount,
                Err(PairError::InsufficientInputAmount | PairError::InsufficientReserves) => {
                    trace!(pair = %pair.address(), "pair cannot fill hop");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            if amount_in.currency() == self.other_end {
                let mut route_pairs = Vec::with_capacity(current.len() + 1);
                route_pairs.push(pair.clone());
                route_pairs.extend(current.iter().cloned());
                let route = Route::new(
                    route_pairs,
                    self.other_end.clone(),
                    self.fixed.currency().clone(),
                )?;
                let trade = Trade::exact_out(route, self.fixed.clone(), self.commission)?;
                sorted_insert(&mut self.best, trade, self.max_num_results);
            } else if hops_left > 1 && pairs.len() > 1 {
                let rest = without(pairs, i);
                current.insert(0, pair.clone());
                self.exact_out(&rest, &amount_in, hops_left - 1, current)?;
                current.remove(0);
            }
        }
        Ok(())
    }
}

fn without(pairs: &[Pair], index: usize) -> Vec<Pair> {
    pairs[..index]
        .iter()
        .chain(&pairs[index + 1..])
        .cloned()
        .collect()
}

/// Errors from trade construction and selection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TradeError {
    #[error("amount token {0} is not at the fixed end of the route")]
    AmountNotOnRoute(Address),

    #[error("invalid trade options: {0}")]
    InvalidOptions(&'static str),

    #[error("slippage tolerance must not be negative, got {0}")]
    InvalidSlippage(String),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Pair(#[from] PairError),

    #[error(transparent)]
    Price(#[from] PriceError),

    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error(transparent)]
    Fraction(#[from] FractionError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fraction::Rounding;

    fn token(byte: u8, symbol: &str) -> Token {
        Token::new(Address::repeat_byte(byte), 18, symbol, None)
    }

    fn a() -> Token {
        token(0x01, "AAA")
    }

    fn b() -> Token {
        token(0x02, "BBB")
    }

    fn c() -> Token {
        token(0x03, "CCC")
    }

    fn pair(x: Token, rx: u64, y: Token, ry: u64) -> Pair {
        let lp = Token::new(
            Address::repeat_byte(0x10 + x.address()[0] * 4 + y.address()[0]),
            18,
            "KSLP",
            None,
        );
        Pair::new(
            TokenAmount::from_raw(x, rx),
            TokenAmount::from_raw(y, ry),
            lp,
        )
        .unwrap()
    }

    fn fee() -> Percent {
        Percent::from_bps(30)
    }

    #[test]
    fn test_price_impact_at_half_pool_depth() {
        let route = Route::new(vec![pair(a(), 100, b(), 100)], a(), b()).unwrap();
        let trade = Trade::exact_in(route, TokenAmount::from_raw(a(), 50), &fee()).unwrap();

        assert_eq!(trade.output_amount().raw().to_string(), "33");
        assert_eq!(trade.price_impact(), &Percent::new(17, 50).unwrap());
        assert_eq!(trade.price_impact().to_string(), "34.00%");
        assert_eq!(trade.route().to_string(), "AAA > BBB");
        assert_eq!(
            trade.execution_price().raw(),
            &Fraction::new(33, 50).unwrap()
        );
    }

    #[test]
    fn test_exact_out_pulls_backward() {
        let route = Route::new(vec![pair(a(), 100, b(), 100)], a(), b()).unwrap();
        let trade = Trade::exact_out(route, TokenAmount::from_raw(b(), 33), &fee()).unwrap();
        assert_eq!(trade.input_amount().raw().to_string(), "50");
        assert_eq!(trade.output_amount().raw().to_string(), "33");
        assert_eq!(trade.trade_type(), TradeType::ExactOutput);
    }

    #[test]
    fn test_amount_must_sit_on_fixed_end() {
        let route = Route::new(vec![pair(a(), 100, b(), 100)], a(), b()).unwrap();
        assert!(matches!(
            Trade::exact_in(route.clone(), TokenAmount::from_raw(b(), 10), &fee()),
            Err(TradeError::AmountNotOnRoute(_))
        ));
        assert!(matches!(
            Trade::exact_out(route, TokenAmount::from_raw(a(), 10), &fee()),
            Err(TradeError::AmountNotOnRoute(_))
        ));
    }

    #[test]
    fn test_slippage_bounds() {
        let route = Route::new(vec![pair(a(), 10_000, b(), 10_000)], a(), b()).unwrap();
        let exact_in =
            Trade::exact_in(route.clone(), TokenAmount::from_raw(a(), 1_000), &fee()).unwrap();
        // 906 out, 906 / 1.05 = 862.8
        assert_eq!(exact_in.output_amount().raw().to_string(), "906");
        let five = Percent::from_bps(500);
        assert_eq!(exact_in.minimum_amount_out(&five).unwrap().raw().to_string(), "862");
        assert_eq!(exact_in.maximum_amount_in(&five).unwrap(), *exact_in.input_amount());

        let exact_out = Trade::exact_out(route, TokenAmount::from_raw(b(), 906), &fee()).unwrap();
        let max_in = exact_out.maximum_amount_in(&five).unwrap();
        assert_eq!(
            max_in.as_fraction(),
            Fraction::from_integer(
                exact_out
                    .input_amount()
                    .as_fraction()
                    .multiplied_by(&Fraction::new(105, 100).unwrap())
                    .quotient()
            )
        );
        assert_eq!(exact_out.minimum_amount_out(&five).unwrap(), *exact_out.output_amount());

        let negative = Percent::new(-1, 100).unwrap();
        assert!(matches!(
            exact_in.minimum_amount_out(&negative),
            Err(TradeError::InvalidSlippage(_))
        ));
    }

    #[test]
    fn test_best_trade_exact_in_ranks_by_output() {
        let pairs = vec![
            pair(a(), 1_000, c(), 1_000),
            pair(a(), 1_000, b(), 1_000),
            pair(b(), 1_000, c(), 10_000),
        ];
        let amount = TokenAmount::from_raw(a(), 100);
        let trades =
            Trade::best_trade_exact_in(&pairs, &amount, &c(), &BestTradeOptions::default(), &fee())
                .unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].route().path(), &[a(), b(), c()]);
        assert_eq!(trades[1].route().path(), &[a(), c()]);
        assert!(trades[0].output_amount().raw() > trades[1].output_amount().raw());
    }

    #[test]
    fn test_best_trade_respects_hop_limit() {
        let pairs = vec![pair(a(), 1_000, b(), 1_000), pair(b(), 1_000, c(), 1_000)];
        let amount = TokenAmount::from_raw(a(), 10);
        let options = BestTradeOptions {
            max_num_results: 3,
            max_hops: 1,
        };
        let trades = Trade::best_trade_exact_in(&pairs, &amount, &c(), &options, &fee()).unwrap();
        assert!(trades.is_empty());

        let options = BestTradeOptions {
            max_hops: 0,
            ..options
        };
        assert!(matches!(
            Trade::best_trade_exact_in(&pairs, &amount, &c(), &options, &fee()),
            Err(TradeError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_best_trade_exact_out_ranks_by_input() {
        let pairs = vec![
            pair(a(), 1_000, c(), 1_000),
            pair(a(), 1_000, b(), 1_000),
            pair(b(), 1_000, c(), 10_000),
        ];
        let amount = TokenAmount::from_raw(c(), 100);
        let trades =
            Trade::best_trade_exact_out(&pairs, &a(), &amount, &BestTradeOptions::default(), &fee())
                .unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].route().path(), &[a(), b(), c()]);
        assert!(trades[0].input_amount().raw() < trades[1].input_amount().raw());
        assert!(trades.iter().all(|t| t.output_amount().raw().to_string() == "100"));
    }

    #[test]
    fn test_best_trade_exact_out_skips_short_pools() {
        let pairs = vec![pair(a(), 1_000, b(), 50)];
        let amount = TokenAmount::from_raw(b(), 50);
        let trades =
            Trade::best_trade_exact_out(&pairs, &a(), &amount, &BestTradeOptions::default(), &fee())
                .unwrap();
        assert!(trades.is_empty());
    }

    #[test]
    fn test_best_trade_applies_price_impact_limit() {
        let pairs = vec![pair(a(), 100, b(), 100)];
        let request = TradeRequest::ExactIn {
            amount_in: TokenAmount::from_raw(a(), 50),
            token_out: b(),
        };
        let config = RoutingConfig::default();
        assert_eq!(Trade::best_trade(&pairs, &request, &config).unwrap(), None);

        let config = config.with_max_price_impact(Percent::from_bps(5_000));
        let trade = Trade::best_trade(&pairs, &request, &config).unwrap().unwrap();
        assert_eq!(trade.price_impact().to_fixed(2, Rounding::HalfUp), "34.00");
        assert_eq!(trade.route_path(), vec![a().address(), b().address()]);
    }

    #[test]
    fn test_best_trade_without_multi_hops() {
        let pairs = vec![
            pair(a(), 1_000_000, b(), 1_000_000),
            pair(b(), 1_000_000, c(), 1_000_000),
        ];
        let request = TradeRequest::ExactOut {
            token_in: a(),
            amount_out: TokenAmount::from_raw(c(), 1_000),
        };
        let config = RoutingConfig::default();
        let trade = Trade::best_trade(&pairs, &request, &config).unwrap().unwrap();
        assert_eq!(trade.route().len(), 2);

        let config = config.with_multi_hops(false);
        assert_eq!(Trade::best_trade(&pairs, &request, &config).unwrap(), None);
    }

    #[test]
    fn test_sorted_insert_caps_size() {
        let route = Route::new(vec![pair(a(), 10_000, b(), 10_000)], a(), b()).unwrap();
        let trade = |raw: u64| {
            Trade::exact_in(route.clone(), TokenAmount::from_raw(a(), raw), &fee()).unwrap()
        };

        let mut items = Vec::new();
        for raw in [10, 40, 20, 30] {
            sorted_insert(&mut items, trade(raw), 3);
        }
        let inputs: Vec<String> = items
            .iter()
            .map(|t| t.input_amount().raw().to_string())
            .collect();
        assert_eq!(inputs, vec!["40", "30", "20"]);
    }

    #[test]
    fn test_best_trade_is_idempotent() {
        let pairs = vec![
            pair(a(), 5_000, b(), 7_000),
            pair(b(), 3_000, c(), 9_000),
            pair(a(), 4_000, c(), 11_000),
        ];
        let request = TradeRequest::ExactIn {
            amount_in: TokenAmount::from_raw(a(), 100),
            token_out: c(),
        };
        let config = RoutingConfig::default();
        let first = Trade::best_trade(&pairs, &request, &config).unwrap().unwrap();
        let second = Trade::best_trade(&pairs, &request, &config).unwrap().unwrap();
        assert_eq!(first.route().path(), second.route().path());
        assert_eq!(first.input_amount(), second.input_amount());
        assert_eq!(first.output_amount(), second.output_amount());
    }
}
