//! Multi-hop routes through pairs, and best-rate route discovery.

use crate::amount::TokenAmount;
use crate::currency::{Denomination, Token};
use crate::fraction::Fraction;
use crate::graph::{Edge, Graph, GraphError};
use crate::pair::{fee_complement, Pair, PairError};
use crate::percent::Percent;
use crate::price::{Price, PriceError};
use crate::types::Address;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace};

/// An ordered chain of pairs leading from `input` to `output`.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pairs: Vec<Pair>,
    path: Vec<Token>,
    input: Token,
    output: Token,
    mid_price: Price<Token>,
}

impl Route {
    /// Build a route, checking that consecutive pairs chain through a common token.
    pub fn new(pairs: Vec<Pair>, input: Token, output: Token) -> Result<Self, RouteError> {
        let Some(first) = pairs.first() else {
            return Err(RouteError::Empty);
        };
        if !first.involves_token(&input) {
            return Err(RouteError::InputNotInFirstPair(input.address()));
        }

        let mut path = Vec::with_capacity(pairs.len() + 1);
        path.push(input.clone());
        for (hop, pair) in pairs.iter().enumerate() {
            let current = &path[hop];
            let next = pair
                .other_token(current)
                .ok_or(RouteError::BrokenChain {
                    hop,
                    token: current.address(),
                })?
                .clone();
            path.push(next);
        }
        if path.last() != Some(&output) {
            return Err(RouteError::OutputNotInLastPair(output.address()));
        }

        let mid_price = mid_price(&pairs, &path)?;
        Ok(Self {
            pairs,
            path,
            input,
            output,
            mid_price,
        })
    }

    /// Pairs in traversal order.
    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    /// Tokens from input to output; always one longer than `pairs`.
    pub fn path(&self) -> &[Token] {
        &self.path
    }

    /// Token addresses along the path, as a swap router expects them.
    pub fn path_addresses(&self) -> Vec<Address> {
        self.path.iter().map(Token::address).collect()
    }

    pub fn input(&self) -> &Token {
        &self.input
    }

    pub fn output(&self) -> &Token {
        &self.output
    }

    /// Spot price of output per input before any trade.
    pub fn mid_price(&self) -> &Price<Token> {
        &self.mid_price
    }

    /// Number of pairs traversed.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Find the route with the best commission-adjusted rate that has enough
    /// liquidity for `amount`.
    ///
    /// `amount` names the fixed side of the trade: denominated in
    /// `input_token` for an exact-input swap, in `output_token` for an
    /// exact-output swap. Returns `Ok(None)` when no route exists.
    ///
    /// Edges whose reserves cannot cover the running amount are removed and
    /// the search repeats on the reduced graph. For an exact-input amount the
    /// first (best-rate) path found is returned even if a later path passed
    /// the liquidity check.
    pub fn from_best_rate(
        pairs: &[Pair],
        input_token: &Token,
        output_token: &Token,
        amount: &TokenAmount,
        commission: &Percent,
    ) -> Result<Option<Route>, RouteError> {
        let exact_input = amount.currency() == input_token;
        if !exact_input && amount.currency() != output_token {
            return Err(RouteError::AmountNotInRoute(amount.currency().address()));
        }

        let mut graph = Graph::new();
        // parallel pairs per direction, cheapest first
        let mut hops: HashMap<(Address, Address), Vec<(Fraction, &Pair)>> = HashMap::new();
        for pair in pairs {
            if pair.is_drained() {
                trace!(pair = %pair.address(), "skipping drained pair");
                continue;
            }
            let (a, b) = (pair.token0().address(), pair.token1().address());
            let forward = edge_weight(pair.token0_price()?.raw(), commission)?;
            let backward = edge_weight(pair.token1_price()?.raw(), commission)?;
            graph.add_edge(Edge::weighted(a, b, forward.clone()))?;
            graph.add_edge(Edge::weighted(b, a, backward.clone()))?;
            hops.entry((a, b)).or_default().push((forward, pair));
            hops.entry((b, a)).or_default().push((backward, pair));
        }
        for candidates in hops.values_mut() {
            candidates.sort_by(|x, y| x.0.cmp(&y.0));
        }

        let (source, destination) = (input_token.address(), output_token.address());
        if !graph.contains_node(&source) || !graph.contains_node(&destination) {
            debug!(%source, %destination, "no pairs connect the requested tokens");
            return Ok(None);
        }

        let mut best_possible = None;
        let liquid = loop {
            let candidate = match graph.shortest_path(&source, &destination) {
                Ok(Some(candidate)) => candidate,
                Ok(None) => break None,
                Err(GraphError::Cycle(_)) => {
                    let Some(cycle) = graph.improving_cycle(&source, &destination)? else {
                        break None;
                    };
                    break_cycle(&mut graph, &mut hops, &cycle);
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            let legs = resolve_pairs(&candidate.path, &hops)?;
            if best_possible.is_none() {
                best_possible = Some(legs.clone());
            }
            let Some(hop) = illiquid_hop(&candidate.path, &legs, amount, exact_input)? else {
                break Some(legs);
            };

            let (from, to) = (candidate.path[hop], candidate.path[hop + 1]);
            let pair = legs[hop].address();
            debug!(%from, %to, %pair, "removing edge with insufficient liquidity");
            if let Some((weight, _)) = hops.get(&(from, to)).and_then(|c| c.first()).cloned() {
                remove_hop(&mut graph, &mut hops, from, to, &weight);
            }
        };

        let chosen = if exact_input {
            if liquid.as_ref() != best_possible.as_ref() {
                debug!(%source, %destination, "keeping best-rate path for exact input");
            }
            best_possible
        } else {
            liquid
        };
        let Some(route_pairs) = chosen else {
            debug!(%source, %destination, "route search exhausted");
            return Ok(None);
        };
        Route::new(route_pairs, input_token.clone(), output_token.clone()).map(Some)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.path.iter().enumerate() {
            if i > 0 {
                f.write_str(" > ")?;
            }
            write!(f, "{}", token.symbol())?;
        }
        Ok(())
    }
}

/// Product of per-hop prices along `path`.
fn mid_price(pairs: &[Pair], path: &[Token]) -> Result<Price<Token>, RouteError> {
    let mut prices = pairs
        .iter()
        .zip(path)
        .map(|(pair, token)| pair.price_of(token));
    let first = prices.next().ok_or(RouteError::Empty)??;
    prices.try_fold(first, |acc, price| -> Result<_, RouteError> {
        Ok(acc.multiplied_by(&price?)?)
    })
}

/// Input-per-output weight for an edge whose spot price is `price`
/// (destination units per source unit), with the commission folded in.
fn edge_weight(price: &Fraction, commission: &Percent) -> Result<Fraction, RouteError> {
    // rejects commissions outside [0, 1)
    fee_complement(commission)?;
    let fee = commission.as_fraction();
    let adjusted = if price >= &Fraction::one() {
        price.minus(&price.multiplied_by(fee))
    } else {
        price.divided_by(&Fraction::one().plus(fee))?
    };
    Ok(adjusted.invert()?)
}

/// Drop one edge of a loop whose rates multiply to a profit, so the search
/// can settle. The least favorable edge goes; ties drop the earliest.
fn break_cycle(
    graph: &mut Graph<Address>,
    hops: &mut HashMap<(Address, Address), Vec<(Fraction, &Pair)>>,
    cycle: &[Edge<Address>],
) {
    let mut worst: Option<&Edge<Address>> = None;
    for edge in cycle {
        if worst.map_or(true, |w| edge.weight > w.weight) {
            worst = Some(edge);
        }
    }
    if let Some(edge) = worst {
        debug!(
            from = %edge.source,
            to = %edge.destination,
            hops = cycle.len(),
            "removing edge to break a profitable loop"
        );
        remove_hop(graph, hops, edge.source, edge.destination, &edge.weight);
    }
}

/// Remove the `from -> to` edge of `weight` from both the graph and the
/// candidate pairs.
fn remove_hop(
    graph: &mut Graph<Address>,
    hops: &mut HashMap<(Address, Address), Vec<(Fraction, &Pair)>>,
    from: Address,
    to: Address,
    weight: &Fraction,
) {
    graph.remove_edge(&from, &to, Some(weight));
    if let Some(candidates) = hops.get_mut(&(from, to)) {
        candidates.retain(|(w, _)| w != weight);
    }
}

/// The cheapest remaining pair for each consecutive step of `path`.
fn resolve_pairs(
    path: &[Address],
    hops: &HashMap<(Address, Address), Vec<(Fraction, &Pair)>>,
) -> Result<Vec<Pair>, RouteError> {
    path.windows(2)
        .map(|w| {
            hops.get(&(w[0], w[1]))
                .and_then(|candidates| candidates.first())
                .map(|(_, pair)| Pair::clone(pair))
                .ok_or(RouteError::MissingPair(w[0], w[1]))
        })
        .collect()
}

/// Walk `legs` against their reserves and return the index of the first hop
/// that cannot carry the running amount.
fn illiquid_hop(
    path: &[Address],
    legs: &[Pair],
    amount: &TokenAmount,
    exact_input: bool,
) -> Result<Option<usize>, RouteError> {
    let mut reserves = Vec::with_capacity(legs.len());
    for (hop, pair) in legs.iter().enumerate() {
        let (input_reserve, output_reserve) = if pair.token0().address() == path[hop] {
            (pair.reserve0().as_fraction(), pair.reserve1().as_fraction())
        } else {
            (pair.reserve1().as_fraction(), pair.reserve0().as_fraction())
        };
        reserves.push((input_reserve, output_reserve));
    }

    let mut running = amount.as_fraction();
    if exact_input {
        for (hop, (input_reserve, output_reserve)) in reserves.iter().enumerate() {
            running = running
                .multiplied_by(output_reserve)
                .divided_by(input_reserve)?;
            if running > *output_reserve {
                return Ok(Some(hop));
            }
        }
    } else {
        for (hop, (input_reserve, output_reserve)) in reserves.iter().enumerate().rev() {
            if running > *output_reserve {
                return Ok(Some(hop));
            }
            running = running
                .multiplied_by(input_reserve)
                .divided_by(output_reserve)?;
        }
    }
    Ok(None)
}

/// Errors from route construction and discovery.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("a route needs at least one pair")]
    Empty,

    #[error("input token {0} is not in the first pair")]
    InputNotInFirstPair(Address),

    #[error("pair at hop {hop} does not contain path token {token}")]
    BrokenChain { hop: usize, token: Address },

    #[error("output token {0} is not at the end of the path")]
    OutputNotInLastPair(Address),

    #[error("amount token {0} is neither the input nor the output token")]
    AmountNotInRoute(Address),

    #[error("no pair connects {0} to {1}")]
    MissingPair(Address, Address),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Pair(#[from] PairError),

    #[error(transparent)]
    Price(#[from] PriceError),

    #[error(transparent)]
    Fraction(#[from] crate::fraction::FractionError),
}
