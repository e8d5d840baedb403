//! Routing configuration parameters.

use crate::percent::Percent;
use crate::trade::BestTradeOptions;

/// Configuration for route discovery and trade selection.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingConfig {
    /// Trading fee charged by every pair.
    /// For example, 30 bps = 0.30% fee.
    pub commission: Percent,

    /// Maximum number of pairs a route may pass through.
    pub max_hops: usize,

    /// Number of ranked candidates kept while enumerating trades.
    pub max_num_results: usize,

    /// Candidates at or above this price impact are rejected.
    pub max_price_impact: Percent,

    /// When false, only direct (single pair) routes are considered.
    pub multi_hops: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            commission: Percent::from_bps(30),         // 0.30% fee
            max_hops: 3,                               // up to 3 pairs (4 tokens in path)
            max_num_results: 3,
            max_price_impact: Percent::from_bps(1000), // 10%
            multi_hops: true,
        }
    }
}

impl RoutingConfig {
    /// Create a new configuration with a custom commission.
    pub fn with_commission(mut self, commission: Percent) -> Self {
        self.commission = commission;
        self
    }

    /// Create a new configuration with custom max hops.
    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Create a new configuration with a custom number of ranked results.
    pub fn with_max_num_results(mut self, max_num_results: usize) -> Self {
        self.max_num_results = max_num_results;
        self
    }

    /// Create a new configuration with a custom price impact ceiling.
    pub fn with_max_price_impact(mut self, max_price_impact: Percent) -> Self {
        self.max_price_impact = max_price_impact;
        self
    }

    /// Create a new configuration allowing or forbidding multi-hop routes.
    pub fn with_multi_hops(mut self, allow: bool) -> Self {
        self.multi_hops = allow;
        self
    }

    /// Enumeration limits for [`crate::Trade::best_trade`].
    pub fn best_trade_options(&self) -> BestTradeOptions {
        BestTradeOptions {
            max_num_results: self.max_num_results,
            max_hops: if self.multi_hops { self.max_hops } else { 1 },
        }
    }
}
