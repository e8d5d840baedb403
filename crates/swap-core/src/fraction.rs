//! Exact rational arithmetic over arbitrary-precision integers.
//!
//! Every operation is carried out by cross-multiplication on [`BigInt`]
//! numerators and denominators, so no precision is lost between steps.
//! Decimal rounding happens only when a value is rendered with
//! [`Fraction::to_fixed`] or [`Fraction::to_format`].

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

/// Rounding policy applied when a fraction is rendered as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rounding {
    /// Truncate towards zero.
    Down,
    /// Round to nearest, ties away from zero.
    #[default]
    HalfUp,
    /// Round away from zero.
    Up,
}

/// An immutable rational number.
///
/// The denominator is always strictly positive; the sign lives in the
/// numerator. Values are not reduced, so `2/4` keeps its representation but
/// compares equal to `1/2`.
#[derive(Debug, Clone)]
pub struct Fraction {
    numerator: BigInt,
    denominator: BigInt,
}

impl Fraction {
    /// Create a fraction, failing on a zero denominator.
    pub fn new(
        numerator: impl Into<BigInt>,
        denominator: impl Into<BigInt>,
    ) -> Result<Self, FractionError> {
        let denominator = denominator.into();
        if denominator.is_zero() {
            return Err(FractionError::ZeroDenominator);
        }
        Ok(Self::from_parts(numerator.into(), denominator))
    }

    /// Create an integer-valued fraction (`value / 1`).
    pub fn from_integer(value: impl Into<BigInt>) -> Self {
        Self {
            numerator: value.into(),
            denominator: BigInt::one(),
        }
    }

    /// `0/1`.
    pub fn zero() -> Self {
        Self::from_integer(0)
    }

    /// `1/1`.
    pub fn one() -> Self {
        Self::from_integer(1)
    }

    /// Parse a plain decimal string such as `"-12.034"` exactly.
    pub fn from_decimal_str(value: &str) -> Result<Self, FractionError> {
        let parts = DecimalParts::parse(value)
            .ok_or_else(|| FractionError::InvalidDecimal(value.to_string()))?;
        let scale = pow10(parts.fraction.len() as u32);
        let mut numerator = parts.integer_value() * &scale + parts.fraction_value();
        if parts.negative {
            numerator = -numerator;
        }
        Ok(Self::from_parts(numerator, scale))
    }

    // `denominator` must be non-zero.
    pub(crate) fn from_parts(numerator: BigInt, denominator: BigInt) -> Self {
        debug_assert!(!denominator.is_zero());
        if denominator.is_negative() {
            Self {
                numerator: -numerator,
                denominator: -denominator,
            }
        } else {
            Self {
                numerator,
                denominator,
            }
        }
    }

    /// Numerator as stored; fractions are never reduced.
    pub fn numerator(&self) -> &BigInt {
        &self.numerator
    }

    pub fn denominator(&self) -> &BigInt {
        &self.denominator
    }

    pub fn is_zero(&self) -> bool {
        self.numerator.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.numerator.is_negative()
    }

    pub fn is_positive(&self) -> bool {
        self.numerator.is_positive()
    }

    /// Exact sum. Shares the denominator when both sides already agree on it.
    pub fn plus(&self, other: &Fraction) -> Fraction {
        if self.denominator == other.denominator {
            return Self::from_parts(&self.numerator + &other.numerator, self.denominator.clone());
        }
        Self::from_parts(
            &self.numerator * &other.denominator + &other.numerator * &self.denominator,
            &self.denominator * &other.denominator,
        )
    }

    /// Exact difference.
    pub fn minus(&self, other: &Fraction) -> Fraction {
        if self.denominator == other.denominator {
            return Self::from_parts(&self.numerator - &other.numerator, self.denominator.clone());
        }
        Self::from_parts(
            &self.numerator * &other.denominator - &other.numerator * &self.denominator,
            &self.denominator * &other.denominator,
        )
    }

    /// Exact product of numerators over the product of denominators.
    pub fn multiplied_by(&self, other: &Fraction) -> Fraction {
        Self::from_parts(
            &self.numerator * &other.numerator,
            &self.denominator * &other.denominator,
        )
    }

    /// Divide by `other`, failing when `other` is zero.
    pub fn divided_by(&self, other: &Fraction) -> Result<Fraction, FractionError> {
        if other.is_zero() {
            return Err(FractionError::DivisionByZero);
        }
        Ok(Self::from_parts(
            &self.numerator * &other.denominator,
            &self.denominator * &other.numerator,
        ))
    }

    /// Swap numerator and denominator, failing for zero.
    pub fn invert(&self) -> Result<Fraction, FractionError> {
        if self.is_zero() {
            return Err(FractionError::DivisionByZero);
        }
        Ok(Self::from_parts(
            self.denominator.clone(),
            self.numerator.clone(),
        ))
    }

    pub fn is_less_than(&self, other: &Fraction) -> bool {
        self.cmp(other) == Ordering::Less
    }

    pub fn is_less_or_equal_than(&self, other: &Fraction) -> bool {
        self.cmp(other) != Ordering::Greater
    }

    pub fn is_equal_to(&self, other: &Fraction) -> bool {
        self.cmp(other) == Ordering::Equal
    }

    pub fn is_greater_than(&self, other: &Fraction) -> bool {
        self.cmp(other) == Ordering::Greater
    }

    pub fn is_greater_or_equal_than(&self, other: &Fraction) -> bool {
        self.cmp(other) != Ordering::Less
    }

    /// Integer part of the division, truncated towards zero.
    pub fn quotient(&self) -> BigInt {
        &self.numerator / &self.denominator
    }

    /// What is left after [`Fraction::quotient`], as a fraction of the same denominator.
    pub fn remainder(&self) -> Fraction {
        Self::from_parts(
            &self.numerator % &self.denominator,
            self.denominator.clone(),
        )
    }

    /// Render with exactly `decimals` fractional digits.
    ///
    /// ```
    /// use swap_core::{Fraction, Rounding};
    ///
    /// let third = Fraction::new(1, 3).unwrap();
    /// assert_eq!(third.to_fixed(4, Rounding::HalfUp), "0.3333");
    /// assert_eq!(third.to_fixed(0, Rounding::Up), "1");
    /// ```
    pub fn to_fixed(&self, decimals: u32, rounding: Rounding) -> String {
        let (negative, integer, fraction) = self.rounded_digits(decimals, rounding);
        let mut out = String::with_capacity(integer.len() + fraction.len() + 2);
        if negative {
            out.push('-');
        }
        out.push_str(&integer);
        if !fraction.is_empty() {
            out.push('.');
            out.push_str(&fraction);
        }
        out
    }

    /// Like [`Fraction::to_fixed`], with `,` separating groups of three integer digits.
    pub fn to_format(&self, decimals: u32, rounding: Rounding) -> String {
        let (negative, integer, fraction) = self.rounded_digits(decimals, rounding);
        let mut out = String::with_capacity(integer.len() * 4 / 3 + fraction.len() + 2);
        if negative {
            out.push('-');
        }
        let lead = integer.len() % 3;
        for (i, digit) in integer.chars().enumerate() {
            if i != 0 && (i + 3 - lead) % 3 == 0 {
                out.push(',');
            }
            out.push(digit);
        }
        if !fraction.is_empty() {
            out.push('.');
            out.push_str(&fraction);
        }
        out
    }

    /// Sign, integer digits and fractional digits after rounding to `decimals` places.
    /// A value that rounds to zero is never reported as negative.
    fn rounded_digits(&self, decimals: u32, rounding: Rounding) -> (bool, String, String) {
        let scaled = self.numerator.abs() * pow10(decimals);
        let (mut units, rest) = scaled.div_rem(&self.denominator);
        let round_away = match rounding {
            Rounding::Down => false,
            Rounding::Up => !rest.is_zero(),
            Rounding::HalfUp => (&rest << 1usize) >= self.denominator,
        };
        if round_away {
            units += 1;
        }
        let negative = self.is_negative() && !units.is_zero();

        let digits = units.to_string();
        let decimals = decimals as usize;
        let digits = if digits.len() <= decimals {
            format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
        } else {
            digits
        };
        let (integer, fraction) = digits.split_at(digits.len() - decimals);
        (negative, integer.to_string(), fraction.to_string())
    }
}

/// `10^exponent` as a big integer.
pub(crate) fn pow10(exponent: u32) -> BigInt {
    num_traits::pow(BigInt::from(10u8), exponent as usize)
}

/// A syntactically valid plain decimal: optional `-`, digits, optional `.` and digits.
pub(crate) struct DecimalParts<'a> {
    pub negative: bool,
    pub integer: &'a str,
    pub fraction: &'a str,
}

impl<'a> DecimalParts<'a> {
    pub fn parse(value: &'a str) -> Option<Self> {
        let (negative, body) = match value.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, value.strip_prefix('+').unwrap_or(value)),
        };
        let (integer, fraction) = match body.split_once('.') {
            Some((integer, fraction)) => (integer, fraction),
            None => (body, ""),
        };
        if integer.is_empty() && fraction.is_empty() {
            return None;
        }
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(integer) || !all_digits(fraction) {
            return None;
        }
        Some(Self {
            negative,
            integer,
            fraction,
        })
    }

    pub fn integer_value(&self) -> BigInt {
        digits_value(self.integer)
    }

    pub fn fraction_value(&self) -> BigInt {
        digits_value(self.fraction)
    }
}

fn digits_value(digits: &str) -> BigInt {
    if digits.is_empty() {
        return BigInt::zero();
    }
    // Only ASCII digits reach here, which always parse.
    BigInt::parse_bytes(digits.as_bytes(), 10).unwrap_or_default()
}

impl PartialEq for Fraction {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Fraction {}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        // a/b vs c/d with b, d > 0: compare a*d against c*b
        (&self.numerator * &other.denominator).cmp(&(&other.numerator * &self.denominator))
    }
}

impl Default for Fraction {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator.is_one() {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

impl FromStr for Fraction {
    type Err = FractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal_str(s)
    }
}

impl From<BigInt> for Fraction {
    fn from(value: BigInt) -> Self {
        Self::from_integer(value)
    }
}

impl From<i64> for Fraction {
    fn from(value: i64) -> Self {
        Self::from_integer(value)
    }
}

impl From<u64> for Fraction {
    fn from(value: u64) -> Self {
        Self::from_integer(value)
    }
}

impl From<u128> for Fraction {
    fn from(value: u128) -> Self {
        Self::from_integer(value)
    }
}

impl Add for &Fraction {
    type Output = Fraction;

    fn add(self, rhs: &Fraction) -> Fraction {
        self.plus(rhs)
    }
}

impl Add for Fraction {
    type Output = Fraction;

    fn add(self, rhs: Fraction) -> Fraction {
        self.plus(&rhs)
    }
}

impl Sub for &Fraction {
    type Output = Fraction;

    fn sub(self, rhs: &Fraction) -> Fraction {
        self.minus(rhs)
    }
}

impl Sub for Fraction {
    type Output = Fraction;

    fn sub(self, rhs: Fraction) -> Fraction {
        self.minus(&rhs)
    }
}

impl Mul for &Fraction {
    type Output = Fraction;

    fn mul(self, rhs: &Fraction) -> Fraction {
        self.multiplied_by(rhs)
    }
}

impl Mul for Fraction {
    type Output = Fraction;

    fn mul(self, rhs: Fraction) -> Fraction {
        self.multiplied_by(&rhs)
    }
}

impl Neg for Fraction {
    type Output = Fraction;

    fn neg(self) -> Fraction {
        Self {
            numerator: -self.numerator,
            denominator: self.denominator,
        }
    }
}

/// Errors raised by fraction construction and division.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FractionError {
    #[error("fraction denominator cannot be zero")]
    ZeroDenominator,

    #[error("division by a zero-valued fraction")]
    DivisionByZero,

    #[error("invalid decimal number: {0:?}")]
    InvalidDecimal(String),
}
