//! Prices between two currencies.

use crate::amount::CurrencyAmount;
use crate::currency::Denomination;
use crate::fraction::{pow10, Fraction, FractionError, Rounding};
use num_bigint::BigInt;
use std::fmt;

/// Units of `quote` per unit of `base`, held as a ratio of raw amounts.
#[derive(Debug, Clone, PartialEq)]
pub struct Price<C: Denomination> {
    base: C,
    quote: C,
    raw: Fraction,
}

impl<C: Denomination> Price<C> {
    /// Price at which `denominator` raw units of `base` buy `numerator` raw units of `quote`.
    pub fn new(
        base: C,
        quote: C,
        denominator: impl Into<BigInt>,
        numerator: impl Into<BigInt>,
    ) -> Result<Self, PriceError> {
        let raw = Fraction::new(numerator, denominator)?;
        Ok(Self { base, quote, raw })
    }

    /// A price from an existing raw ratio of smallest units.
    pub fn from_fraction(base: C, quote: C, raw: Fraction) -> Self {
        Self { base, quote, raw }
    }

    /// The currency being priced.
    pub fn base(&self) -> &C {
        &self.base
    }

    /// The currency the price is expressed in.
    pub fn quote_currency(&self) -> &C {
        &self.quote
    }

    /// Ratio of raw (smallest-unit) amounts.
    pub fn raw(&self) -> &Fraction {
        &self.raw
    }

    /// Ratio of whole-token amounts: `raw * 10^base.decimals / 10^quote.decimals`.
    pub fn adjusted(&self) -> Fraction {
        let scalar = Fraction::from_parts(
            pow10(self.base.decimals() as u32),
            pow10(self.quote.decimals() as u32),
        );
        self.raw.multiplied_by(&scalar)
    }

    /// The same exchange rate seen from the other side.
    pub fn invert(&self) -> Result<Self, PriceError> {
        Ok(Self {
            base: self.quote.clone(),
            quote: self.base.clone(),
            raw: self.raw.invert()?,
        })
    }

    /// Chain `self` (A -> B) with `other` (B -> C) into A -> C.
    pub fn multiplied_by(&self, other: &Price<C>) -> Result<Self, PriceError> {
        if self.quote != other.base {
            return Err(PriceError::CurrencyMismatch {
                expected: self.quote.symbol().to_string(),
                actual: other.base.symbol().to_string(),
            });
        }
        Ok(Self {
            base: self.base.clone(),
            quote: other.quote.clone(),
            raw: self.raw.multiplied_by(&other.raw),
        })
    }

    /// Convert an amount of `base` into `quote` at this price, truncating to raw units.
    pub fn quote(&self, amount: &CurrencyAmount<C>) -> Result<CurrencyAmount<C>, PriceError> {
        if amount.currency() != &self.base {
            return Err(PriceError::CurrencyMismatch {
                expected: self.base.symbol().to_string(),
                actual: amount.currency().symbol().to_string(),
            });
        }
        let raw = self.raw.multiplied_by(&amount.as_fraction()).quotient();
        Ok(CurrencyAmount::from_raw(self.quote.clone(), raw))
    }

    pub fn to_fixed(&self, decimals: u32, rounding: Rounding) -> String {
        self.adjusted().to_fixed(decimals, rounding)
    }

    pub fn to_format(&self, decimals: u32, rounding: Rounding) -> String {
        self.adjusted().to_format(decimals, rounding)
    }
}

impl<C: Denomination> fmt::Display for Price<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{}",
            self.to_fixed(6, Rounding::HalfUp),
            self.quote.symbol(),
            self.base.symbol()
        )
    }
}

/// Errors from price construction and chaining.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    #[error("price currencies do not chain: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: String, actual: String },

    #[error(transparent)]
    Fraction(#[from] FractionError),
}
