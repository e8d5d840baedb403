//! Integer token quantities in the smallest on-chain unit.

use crate::fraction::{pow10, DecimalParts, Fraction, Rounding};
use crate::types::{WeiAsToken, U256};
use num_bigint::{BigInt, Sign};
use num_traits::{Signed, Zero};
use std::fmt;
use std::str::FromStr;

/// Largest integer an IEEE-754 double represents exactly (`2^53 - 1`).
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// An integer amount of a token's smallest unit.
///
/// Equal values built from different representations (decimal string, big
/// integer, `U256`) are indistinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Wei(BigInt);

impl Wei {
    /// Zero smallest units.
    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    /// Scale a human-readable decimal up by `10^decimals`.
    ///
    /// Fails when `value` carries more significant fractional digits than
    /// the token has decimals, since the result could not be exact.
    ///
    /// ```
    /// use swap_core::Wei;
    ///
    /// let wei = Wei::from_token(18, "1.5").unwrap();
    /// assert_eq!(wei.to_string(), "1500000000000000000");
    /// assert_eq!(wei.to_token(18).as_str(), "1.5");
    /// ```
    pub fn from_token(decimals: u8, value: &str) -> Result<Self, WeiError> {
        let parts =
            DecimalParts::parse(value).ok_or_else(|| WeiError::InvalidNumber(value.to_string()))?;
        let fraction = parts.fraction.trim_end_matches('0');
        if fraction.len() > decimals as usize {
            return Err(WeiError::TooManyDecimals {
                value: value.to_string(),
                decimals,
            });
        }
        let padded = format!("{:0<width$}", fraction, width = decimals as usize);
        let fraction_units = if padded.is_empty() {
            BigInt::zero()
        } else {
            BigInt::from_str(&padded).map_err(|_| WeiError::InvalidNumber(value.to_string()))?
        };
        let magnitude = parts.integer_value() * pow10(decimals as u32) + fraction_units;
        Ok(Self(if parts.negative { -magnitude } else { magnitude }))
    }

    /// Borrow the underlying signed integer.
    pub fn as_big_int(&self) -> &BigInt {
        &self.0
    }

    pub fn to_big_int(&self) -> BigInt {
        self.0.clone()
    }

    pub fn into_big_int(self) -> BigInt {
        self.0
    }

    pub fn to_fraction(&self) -> Fraction {
        Fraction::from_integer(self.0.clone())
    }

    /// Exact whole-token value: `self / 10^decimals`, trailing zeros trimmed.
    pub fn to_token(&self, decimals: u8) -> WeiAsToken {
        let value = Fraction::from_parts(self.0.clone(), pow10(decimals as u32))
            .to_fixed(decimals as u32, Rounding::Down);
        let trimmed = if value.contains('.') {
            value.trim_end_matches('0').trim_end_matches('.')
        } else {
            value.as_str()
        };
        WeiAsToken::new(trimmed.to_string())
    }

    /// Fails for negative values and anything above `U256::MAX`.
    pub fn to_u256(&self) -> Result<U256, WeiError> {
        if self.0.is_negative() {
            return Err(WeiError::Negative(self.0.to_string()));
        }
        let (_, bytes) = self.0.to_bytes_be();
        U256::try_from_be_slice(&bytes).ok_or_else(|| WeiError::Overflow(self.0.to_string()))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Signed sum.
    pub fn plus(&self, other: &Wei) -> Wei {
        Self(&self.0 + &other.0)
    }

    /// Signed difference.
    pub fn minus(&self, other: &Wei) -> Wei {
        Self(&self.0 - &other.0)
    }

    /// Difference that must stay non-negative.
    pub fn checked_sub(&self, other: &Wei) -> Result<Wei, WeiError> {
        let difference = &self.0 - &other.0;
        if difference.is_negative() {
            return Err(WeiError::Underflow {
                minuend: self.0.to_string(),
                subtrahend: other.0.to_string(),
            });
        }
        Ok(Self(difference))
    }
}

impl FromStr for Wei {
    type Err = WeiError;

    /// Accepts a plain decimal integer; a fractional part must be all zeros.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = DecimalParts::parse(s).ok_or_else(|| WeiError::InvalidNumber(s.to_string()))?;
        if parts.integer.is_empty() || parts.fraction.bytes().any(|b| b != b'0') {
            return Err(WeiError::NotInteger(s.to_string()));
        }
        let magnitude = parts.integer_value();
        Ok(Self(if parts.negative { -magnitude } else { magnitude }))
    }
}

impl TryFrom<f64> for Wei {
    type Error = WeiError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(WeiError::InvalidNumber(value.to_string()));
        }
        if value.fract() != 0.0 {
            return Err(WeiError::NotInteger(value.to_string()));
        }
        if value.abs() > MAX_SAFE_INTEGER as f64 {
            return Err(WeiError::UnsafeInteger(value.to_string()));
        }
        Ok(Self(BigInt::from(value as i64)))
    }
}

impl From<BigInt> for Wei {
    fn from(value: BigInt) -> Self {
        Self(value)
    }
}

impl From<U256> for Wei {
    fn from(value: U256) -> Self {
        Self(BigInt::from_bytes_be(Sign::Plus, &value.to_be_bytes::<32>()))
    }
}

impl From<u64> for Wei {
    fn from(value: u64) -> Self {
        Self(BigInt::from(value))
    }
}

impl From<u128> for Wei {
    fn from(value: u128) -> Self {
        Self(BigInt::from(value))
    }
}

impl From<i64> for Wei {
    fn from(value: i64) -> Self {
        Self(BigInt::from(value))
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised while constructing or converting [`Wei`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WeiError {
    #[error("not a valid number: {0:?}")]
    InvalidNumber(String),

    #[error("wei must be an integer, got {0}")]
    NotInteger(String),

    #[error("number {0} is outside the safe integer range")]
    UnsafeInteger(String),

    #[error("{value:?} has more fractional digits than {decimals} decimals")]
    TooManyDecimals { value: String, decimals: u8 },

    #[error("negative wei {0} has no unsigned representation")]
    Negative(String),

    #[error("wei {0} does not fit in 256 bits")]
    Overflow(String),

    #[error("wei underflow: {minuend} - {subtrahend} is negative")]
    Underflow { minuend: String, subtrahend: String },
}
