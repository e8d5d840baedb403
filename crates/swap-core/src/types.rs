//! Core type definitions.
//!
//! Re-exports from alloy-primitives for chain-compatible identities, plus
//! branded string types that keep token symbols and human-readable token
//! amounts from being mixed up with raw integer strings.

pub use alloy::primitives::{Address, U256};

use std::fmt;

/// Ticker symbol of a currency, e.g. `KLAY` or `oUSDT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenSymbol(String);

impl TokenSymbol {
    /// Wrap a ticker symbol.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TokenSymbol {
    fn from(symbol: &str) -> Self {
        Self::new(symbol)
    }
}

impl fmt::Display for TokenSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A token amount in whole-token units as an exact decimal string,
/// e.g. `"1.5"` for `1500000000000000000` wei of an 18-decimal token.
///
/// Only produced by [`crate::Wei::to_token`], so the contents are always a
/// canonical decimal without trailing fractional zeros.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WeiAsToken(String);

impl WeiAsToken {
    pub(crate) fn new(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WeiAsToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses_order_bytewise() {
        let a = Address::repeat_byte(0x01);
        let b = Address::repeat_byte(0x02);
        assert!(a < b);
        assert!(!Address::repeat_byte(0xAA).is_zero());
    }

    #[test]
    fn test_symbol_display() {
        let symbol = TokenSymbol::from("KLAY");
        assert_eq!(symbol.to_string(), "KLAY");
        assert_eq!(symbol.as_str(), "KLAY");
    }
}
