//! Amounts bound to the currency they are denominated in.

use crate::currency::{Denomination, Token};
use crate::fraction::{pow10, Fraction, Rounding};
use crate::types::WeiAsToken;
use crate::wei::{Wei, WeiError};
use num_bigint::BigInt;
use std::cmp::Ordering;
use std::fmt;

/// A raw integer amount of `C`.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyAmount<C: Denomination> {
    currency: C,
    raw: Wei,
}

/// An amount of an on-chain token.
pub type TokenAmount = CurrencyAmount<Token>;

impl<C: Denomination> CurrencyAmount<C> {
    /// An amount of `raw` smallest units of `currency`.
    pub fn from_wei(currency: C, raw: Wei) -> Self {
        Self { currency, raw }
    }

    /// Like [`Self::from_wei`], from any integer.
    pub fn from_raw(currency: C, raw: impl Into<BigInt>) -> Self {
        Self::from_wei(currency, Wei::from(raw.into()))
    }

    /// Parse a whole-token decimal string, e.g. `"1.5"`, scaling by the currency decimals.
    pub fn from_decimal(currency: C, value: &str) -> Result<Self, AmountError> {
        let raw = Wei::from_token(currency.decimals(), value)?;
        Ok(Self { currency, raw })
    }

    pub fn currency(&self) -> &C {
        &self.currency
    }

    pub fn raw(&self) -> &Wei {
        &self.raw
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// The raw amount as an integer fraction.
    pub fn as_fraction(&self) -> Fraction {
        self.raw.to_fraction()
    }

    /// The amount in whole-token units (`raw / 10^decimals`).
    pub fn to_decimal_fraction(&self) -> Fraction {
        Fraction::from_parts(self.raw.to_big_int(), pow10(self.currency.decimals() as u32))
    }

    /// Sum of two amounts of the same currency.
    pub fn plus(&self, other: &Self) -> Result<Self, AmountError> {
        self.ensure_same_currency(other)?;
        Ok(Self::from_wei(self.currency.clone(), self.raw.plus(&other.raw)))
    }

    /// Difference of two amounts of the same currency. May go negative.
    pub fn minus(&self, other: &Self) -> Result<Self, AmountError> {
        self.ensure_same_currency(other)?;
        Ok(Self::from_wei(self.currency.clone(), self.raw.minus(&other.raw)))
    }

    /// Scale by a fraction, truncating the result to whole raw units.
    pub fn multiplied_by(&self, factor: &Fraction) -> Self {
        let scaled = self.as_fraction().multiplied_by(factor).quotient();
        Self::from_raw(self.currency.clone(), scaled)
    }

    /// Order two amounts of the same currency by raw value.
    pub fn compare(&self, other: &Self) -> Result<Ordering, AmountError> {
        self.ensure_same_currency(other)?;
        Ok(self.raw.cmp(&other.raw))
    }

    /// Exact whole-token rendering.
    pub fn to_exact(&self) -> WeiAsToken {
        self.raw.to_token(self.currency.decimals())
    }

    pub fn to_fixed(&self, decimals: u32, rounding: Rounding) -> String {
        self.to_decimal_fraction().to_fixed(decimals, rounding)
    }

    pub fn to_format(&self, decimals: u32, rounding: Rounding) -> String {
        self.to_decimal_fraction().to_format(decimals, rounding)
    }

    fn ensure_same_currency(&self, other: &Self) -> Result<(), AmountError> {
        if self.currency != other.currency {
            return Err(AmountError::CurrencyMismatch {
                left: self.currency.symbol().to_string(),
                right: other.currency.symbol().to_string(),
            });
        }
        Ok(())
    }
}

impl<C: Denomination> fmt::Display for CurrencyAmount<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_exact(), self.currency.symbol())
    }
}

/// Errors from amount construction and amount arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amounts are denominated in different currencies: {left} and {right}")]
    CurrencyMismatch { left: String, right: String },

    #[error(transparent)]
    Wei(#[from] WeiError),
}
