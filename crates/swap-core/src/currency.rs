//! Currencies and on-chain tokens.

use crate::types::{Address, TokenSymbol};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Anything an amount or a price can be denominated in.
pub trait Denomination: Clone + PartialEq + fmt::Debug {
    fn decimals(&self) -> u8;

    fn symbol(&self) -> &TokenSymbol;

    fn name(&self) -> Option<&str>;
}

/// A currency without chain identity, such as the native coin.
///
/// Two currencies are the same when their symbols match.
#[derive(Debug, Clone)]
pub struct Currency {
    decimals: u8,
    symbol: TokenSymbol,
    name: Option<String>,
}

impl Currency {
    pub fn new(decimals: u8, symbol: impl Into<TokenSymbol>, name: Option<&str>) -> Self {
        Self {
            decimals,
            symbol: symbol.into(),
            name: name.map(str::to_string),
        }
    }
}

impl PartialEq for Currency {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

impl Eq for Currency {}

impl Denomination for Currency {
    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn symbol(&self) -> &TokenSymbol {
        &self.symbol
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// A token contract. Identity is the contract address alone.
#[derive(Debug, Clone)]
pub struct Token {
    address: Address,
    currency: Currency,
}

impl Token {
    pub fn new(
        address: Address,
        decimals: u8,
        symbol: impl Into<TokenSymbol>,
        name: Option<&str>,
    ) -> Self {
        Self {
            address,
            currency: Currency::new(decimals, symbol, name),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    /// Whether this token is `token0` in a pair with `other` (lower address first).
    pub fn sorts_before(&self, other: &Token) -> bool {
        self.address < other.address
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}

impl Denomination for Token {
    fn decimals(&self) -> u8 {
        self.currency.decimals
    }

    fn symbol(&self) -> &TokenSymbol {
        &self.currency.symbol
    }

    fn name(&self) -> Option<&str> {
        self.currency.name.as_deref()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.currency.symbol, self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_equality_by_symbol() {
        let klay = Currency::new(18, "KLAY", Some("Klaytn"));
        let other = Currency::new(6, "KLAY", None);
        let usdt = Currency::new(6, "oUSDT", None);
        assert_eq!(klay, other);
        assert_ne!(klay, usdt);
    }

    #[test]
    fn test_token_equality_by_address() {
        let a = Token::new(Address::repeat_byte(0x01), 18, "AAA", None);
        let renamed = Token::new(Address::repeat_byte(0x01), 6, "BBB", Some("renamed"));
        let b = Token::new(Address::repeat_byte(0x02), 18, "AAA", None);
        assert_eq!(a, renamed);
        assert_ne!(a, b);
        assert_eq!(a.currency(), b.currency());
    }

    #[test]
    fn test_sorts_before() {
        let a = Token::new(Address::repeat_byte(0x01), 18, "AAA", None);
        let b = Token::new(Address::repeat_byte(0x02), 18, "BBB", None);
        assert!(a.sorts_before(&b));
        assert!(!b.sorts_before(&a));
        assert!(!a.sorts_before(&a));
    }
}
