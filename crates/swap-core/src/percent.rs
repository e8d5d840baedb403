//! Percentages as exact fractions.

use crate::fraction::{Fraction, FractionError, Rounding};
use num_bigint::BigInt;
use std::fmt;

/// A fraction rendered as a percentage: `3/1000` displays as `0.30%`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Percent(Fraction);

impl Percent {
    /// A ratio where `1/1` is 100%.
    pub fn new(
        numerator: impl Into<BigInt>,
        denominator: impl Into<BigInt>,
    ) -> Result<Self, FractionError> {
        Fraction::new(numerator, denominator).map(Self)
    }

    /// `bps` basis points, where 1 bp = 0.01%.
    pub fn from_bps(bps: u32) -> Self {
        Self(Fraction::from_parts(BigInt::from(bps), BigInt::from(10_000u32)))
    }

    pub fn from_fraction(fraction: Fraction) -> Self {
        Self(fraction)
    }

    pub fn as_fraction(&self) -> &Fraction {
        &self.0
    }

    pub fn into_fraction(self) -> Fraction {
        self.0
    }

    /// Sum of two percentages.
    pub fn plus(&self, other: &Percent) -> Percent {
        Self(self.0.plus(&other.0))
    }

    /// Difference of two percentages.
    pub fn minus(&self, other: &Percent) -> Percent {
        Self(self.0.minus(&other.0))
    }

    pub fn multiplied_by(&self, other: &Percent) -> Percent {
        Self(self.0.multiplied_by(&other.0))
    }

    pub fn divided_by(&self, other: &Percent) -> Result<Percent, FractionError> {
        self.0.divided_by(&other.0).map(Self)
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Percentage value with `decimals` fractional digits, without the `%` sign.
    pub fn to_fixed(&self, decimals: u32, rounding: Rounding) -> String {
        self.hundredfold().to_fixed(decimals, rounding)
    }

    pub fn to_format(&self, decimals: u32, rounding: Rounding) -> String {
        self.hundredfold().to_format(decimals, rounding)
    }

    fn hundredfold(&self) -> Fraction {
        self.0.multiplied_by(&Fraction::from_integer(100))
    }
}

impl From<Fraction> for Percent {
    fn from(fraction: Fraction) -> Self {
        Self(fraction)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.to_fixed(2, Rounding::HalfUp))
    }
}
