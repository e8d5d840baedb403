//! Constant-product liquidity pairs.

use crate::amount::{AmountError, TokenAmount};
use crate::currency::Token;
use crate::fraction::{Fraction, FractionError};
use crate::percent::Percent;
use crate::price::{Price, PriceError};
use crate::types::Address;
use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

/// Liquidity locked forever on the first deposit into a pair.
pub const MINIMUM_LIQUIDITY: u64 = 1000;

/// A snapshot of one pool: both reserves in canonical order plus the pool's
/// liquidity token.
///
/// Convention:
/// - `token0` is the token with the lower address, `token1` the other.
/// - `token0_price` is `reserve1 / reserve0`, i.e. token1 per token0.
///
/// Pairs are never updated in place. A new snapshot of on-chain reserves
/// means a new `Pair`.
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    liquidity_token: Token,
    reserves: [TokenAmount; 2],
}

impl Pair {
    /// Build a pair from its two reserves, in either order.
    pub fn new(
        reserve_a: TokenAmount,
        reserve_b: TokenAmount,
        liquidity_token: Token,
    ) -> Result<Self, PairError> {
        if reserve_a.currency() == reserve_b.currency() {
            return Err(PairError::IdenticalTokens);
        }
        let reserves = if reserve_a.currency().sorts_before(reserve_b.currency()) {
            [reserve_a, reserve_b]
        } else {
            [reserve_b, reserve_a]
        };
        Ok(Self {
            liquidity_token,
            reserves,
        })
    }

    /// The pool contract, which is also the liquidity token address.
    pub fn address(&self) -> Address {
        self.liquidity_token.address()
    }

    pub fn liquidity_token(&self) -> &Token {
        &self.liquidity_token
    }

    pub fn token0(&self) -> &Token {
        self.reserves[0].currency()
    }

    pub fn token1(&self) -> &Token {
        self.reserves[1].currency()
    }

    pub fn reserve0(&self) -> &TokenAmount {
        &self.reserves[0]
    }

    pub fn reserve1(&self) -> &TokenAmount {
        &self.reserves[1]
    }

    /// Check if this pair contains the given token.
    pub fn involves_token(&self, token: &Token) -> bool {
        self.token0() == token || self.token1() == token
    }

    /// Get the other token in the pair.
    pub fn other_token(&self, token: &Token) -> Option<&Token> {
        if self.token0() == token {
            Some(self.token1())
        } else if self.token1() == token {
            Some(self.token0())
        } else {
            None
        }
    }

    /// Whether either reserve is empty.
    pub fn is_drained(&self) -> bool {
        self.reserves
            .iter()
            .any(|reserve| reserve.raw().as_big_int().is_zero())
    }

    /// token1 per token0.
    pub fn token0_price(&self) -> Result<Price<Token>, PairError> {
        Ok(Price::new(
            self.token0().clone(),
            self.token1().clone(),
            self.reserves[0].raw().to_big_int(),
            self.reserves[1].raw().to_big_int(),
        )?)
    }

    /// token0 per token1.
    pub fn token1_price(&self) -> Result<Price<Token>, PairError> {
        Ok(Price::new(
            self.token1().clone(),
            self.token0().clone(),
            self.reserves[1].raw().to_big_int(),
            self.reserves[0].raw().to_big_int(),
        )?)
    }

    /// Price of `token` in terms of the other token of the pair.
    pub fn price_of(&self, token: &Token) -> Result<Price<Token>, PairError> {
        if self.token0() == token {
            self.token0_price()
        } else if self.token1() == token {
            self.token1_price()
        } else {
            Err(PairError::TokenNotInPair(token.address()))
        }
    }

    pub fn reserve_of(&self, token: &Token) -> Result<&TokenAmount, PairError> {
        if self.token0() == token {
            Ok(self.reserve0())
        } else if self.token1() == token {
            Ok(self.reserve1())
        } else {
            Err(PairError::TokenNotInPair(token.address()))
        }
    }

    /// Amount received for selling `input_amount` into the pool, after `commission`.
    ///
    /// `out = in * (1 - fee) * reserve_out / (reserve_in + in * (1 - fee))`,
    /// truncated to whole raw units.
    pub fn get_output_amount(
        &self,
        input_amount: &TokenAmount,
        commission: &Percent,
    ) -> Result<TokenAmount, PairError> {
        let input_token = input_amount.currency();
        let input_reserve = self.reserve_of(input_token)?.raw().as_big_int();
        let output_token = self
            .other_token(input_token)
            .ok_or(PairError::TokenNotInPair(input_token.address()))?;
        let output_reserve = self.reserve_of(output_token)?.raw().as_big_int();
        if self.is_drained() {
            return Err(PairError::InsufficientReserves);
        }

        let (keep_numerator, keep_denominator) = fee_complement(commission)?;
        let input_with_fee = input_amount.raw().as_big_int() * &keep_numerator;
        let numerator = &input_with_fee * output_reserve;
        let denominator = input_reserve * &keep_denominator + &input_with_fee;
        if !denominator.is_positive() {
            return Err(PairError::InsufficientInputAmount);
        }
        let output = numerator / denominator;
        if !output.is_positive() {
            return Err(PairError::InsufficientInputAmount);
        }
        Ok(TokenAmount::from_raw(output_token.clone(), output))
    }

    /// Amount that must be sold into the pool to receive `output_amount`, after `commission`.
    ///
    /// `in = reserve_in * out / ((reserve_out - out) * (1 - fee)) + 1`.
    pub fn get_input_amount(
        &self,
        output_amount: &TokenAmount,
        commission: &Percent,
    ) -> Result<TokenAmount, PairError> {
        let output_token = output_amount.currency();
        let output_reserve = self.reserve_of(output_token)?.raw().as_big_int();
        let input_token = self
            .other_token(output_token)
            .ok_or(PairError::TokenNotInPair(output_token.address()))?;
        let input_reserve = self.reserve_of(input_token)?.raw().as_big_int();
        let wanted = output_amount.raw().as_big_int();
        if self.is_drained() || wanted >= output_reserve {
            return Err(PairError::InsufficientReserves);
        }
        if !wanted.is_positive() {
            return Err(PairError::InsufficientInputAmount);
        }

        let (keep_numerator, keep_denominator) = fee_complement(commission)?;
        let numerator = input_reserve * wanted * &keep_denominator;
        let denominator = (output_reserve - wanted) * &keep_numerator;
        let input = numerator / denominator + BigInt::one();
        Ok(TokenAmount::from_raw(input_token.clone(), input))
    }

    /// Deposit of the other token that matches `amount` at the current ratio.
    pub fn quote_liquidity_amount(&self, amount: &TokenAmount) -> Result<TokenAmount, PairError> {
        let token = amount.currency();
        let reserve = self.reserve_of(token)?.raw().as_big_int();
        let other = self
            .other_token(token)
            .ok_or(PairError::TokenNotInPair(token.address()))?;
        let other_reserve = self.reserve_of(other)?.raw().as_big_int();
        if self.is_drained() {
            return Err(PairError::InsufficientReserves);
        }
        if !amount.raw().as_big_int().is_positive() {
            return Err(PairError::InsufficientInputAmount);
        }
        let quoted = amount.raw().as_big_int() * other_reserve / reserve;
        Ok(TokenAmount::from_raw(other.clone(), quoted))
    }

    /// Liquidity tokens minted for depositing `amount_a` and `amount_b`.
    pub fn get_liquidity_minted(
        &self,
        total_supply: &TokenAmount,
        amount_a: &TokenAmount,
        amount_b: &TokenAmount,
    ) -> Result<TokenAmount, PairError> {
        if total_supply.currency() != &self.liquidity_token {
            return Err(PairError::LiquidityTokenMismatch);
        }
        let (amount0, amount1) = if amount_a.currency().sorts_before(amount_b.currency()) {
            (amount_a, amount_b)
        } else {
            (amount_b, amount_a)
        };
        if amount0.currency() != self.token0() || amount1.currency() != self.token1() {
            return Err(PairError::TokenNotInPair(amount0.currency().address()));
        }

        let supply = total_supply.raw().as_big_int();
        let deposit0 = amount0.raw().as_big_int();
        let deposit1 = amount1.raw().as_big_int();
        if !deposit0.is_positive() || !deposit1.is_positive() {
            return Err(PairError::InsufficientInputAmount);
        }
        let liquidity = if supply.is_zero() {
            (deposit0 * deposit1).sqrt() - BigInt::from(MINIMUM_LIQUIDITY)
        } else {
            if self.is_drained() {
                return Err(PairError::InsufficientReserves);
            }
            let share0 = deposit0 * supply / self.reserve0().raw().as_big_int();
            let share1 = deposit1 * supply / self.reserve1().raw().as_big_int();
            share0.min(share1)
        };
        if !liquidity.is_positive() {
            return Err(PairError::InsufficientInputAmount);
        }
        Ok(TokenAmount::from_raw(self.liquidity_token.clone(), liquidity))
    }

    /// Amount of `token` redeemable for `liquidity` out of `total_supply`.
    pub fn get_liquidity_value(
        &self,
        token: &Token,
        total_supply: &TokenAmount,
        liquidity: &TokenAmount,
    ) -> Result<TokenAmount, PairError> {
        if total_supply.currency() != &self.liquidity_token
            || liquidity.currency() != &self.liquidity_token
        {
            return Err(PairError::LiquidityTokenMismatch);
        }
        let supply = total_supply.raw().as_big_int();
        let share = liquidity.raw().as_big_int();
        if !supply.is_positive() || share > supply {
            return Err(PairError::InvalidLiquidity);
        }
        let reserve = self.reserve_of(token)?.raw().as_big_int();
        Ok(TokenAmount::from_raw(token.clone(), share * reserve / supply))
    }
}

/// `1 - commission` as (numerator, denominator), both positive.
pub(crate) fn fee_complement(commission: &Percent) -> Result<(BigInt, BigInt), PairError> {
    let fee = commission.as_fraction();
    if fee.is_negative() || fee >= &Fraction::one() {
        return Err(PairError::InvalidCommission(commission.to_string()));
    }
    let keep = Fraction::one().minus(fee);
    Ok((keep.numerator().clone(), keep.denominator().clone()))
}

/// Errors from pair construction and pool math.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PairError {
    #[error("a pair needs two distinct tokens")]
    IdenticalTokens,

    #[error("token {0} is not part of the pair")]
    TokenNotInPair(Address),

    #[error("insufficient reserves")]
    InsufficientReserves,

    #[error("insufficient input amount")]
    InsufficientInputAmount,

    #[error("commission must be in [0%, 100%), got {0}")]
    InvalidCommission(String),

    #[error("amount is not denominated in the pair's liquidity token")]
    LiquidityTokenMismatch,

    #[error("liquidity exceeds total supply")]
    InvalidLiquidity,

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

    fn token_a() -> Token {
        Token::new(Address::repeat_byte(0x01), 18, "AAA", None)
    }

    fn token_b() -> Token {
        Token::new(Address::repeat_byte(0x02), 18, "BBB", None)
    }

    fn token_c() -> Token {
        Token::new(Address::repeat_byte(0x03), 18, "CCC", None)
    }

    fn lp() -> Token {
        Token::new(Address::repeat_byte(0xEE), 18, "KSLP", None)
    }

    fn fee() -> Percent {
        Percent::new(3, 1000).unwrap()
    }

    fn pair(a: u64, b: u64) -> Pair {
        Pair::new(
            TokenAmount::from_raw(token_a(), a),
            TokenAmount::from_raw(token_b(), b),
            lp(),
        )
        .unwrap()
    }

    #[test]
    fn test_canonical_ordering() {
        let forward = pair(100, 200);
        let backward = Pair::new(
            TokenAmount::from_raw(token_b(), 200),
            TokenAmount::from_raw(token_a(), 100),
            lp(),
        )
        .unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward.token0(), &token_a());
        assert_eq!(forward.reserve1().raw().to_string(), "200");
        assert_eq!(forward.address(), Address::repeat_byte(0xEE));
    }

    #[test]
    fn test_identical_tokens_rejected() {
        let result = Pair::new(
            TokenAmount::from_raw(token_a(), 1),
            TokenAmount::from_raw(token_a(), 1),
            lp(),
        );
        assert_eq!(result, Err(PairError::IdenticalTokens));
    }

    #[test]
    fn test_prices() {
        let p = pair(100, 200);
        assert_eq!(p.token0_price().unwrap().raw(), &Fraction::from_integer(2));
        assert_eq!(p.token1_price().unwrap().raw(), &Fraction::new(1, 2).unwrap());
        assert_eq!(p.price_of(&token_b()).unwrap().base(), &token_b());
        assert!(matches!(
            p.price_of(&token_c()),
            Err(PairError::TokenNotInPair(_))
        ));
    }

    #[test]
    fn test_other_token_and_contains() {
        let p = pair(1, 1);
        assert!(p.involves_token(&token_a()));
        assert!(!p.involves_token(&token_c()));
        assert_eq!(p.other_token(&token_a()), Some(&token_b()));
        assert_eq!(p.other_token(&token_c()), None);
    }

    #[test]
    fn test_output_amount_matches_constant_product() {
        let p = pair(100, 100);
        let out = p
            .get_output_amount(&TokenAmount::from_raw(token_a(), 50), &fee())
            .unwrap();
        // 50*997*100 / (100*1000 + 50*997) = 33.26...
        assert_eq!(out.currency(), &token_b());
        assert_eq!(out.raw().to_string(), "33");
    }

    #[test]
    fn test_input_amount_rounds_up() {
        let p = pair(100, 100);
        let input = p
            .get_input_amount(&TokenAmount::from_raw(token_b(), 33), &fee())
            .unwrap();
        // 100*33*1000 / (67*997) = 49.40..., +1
        assert_eq!(input.currency(), &token_a());
        assert_eq!(input.raw().to_string(), "50");
    }

    #[test]
    fn test_insufficient_liquidity() {
        let p = pair(100, 100);
        assert_eq!(
            p.get_input_amount(&TokenAmount::from_raw(token_b(), 100), &fee()),
            Err(PairError::InsufficientReserves)
        );
        assert_eq!(
            p.get_output_amount(&TokenAmount::from_raw(token_a(), 1), &fee()),
            Err(PairError::InsufficientInputAmount)
        );
        assert_eq!(
            pair(0, 100).get_output_amount(&TokenAmount::from_raw(token_a(), 10), &fee()),
            Err(PairError::InsufficientReserves)
        );
    }

    #[test]
    fn test_commission_bounds() {
        let p = pair(100, 100);
        let full = Percent::new(1, 1).unwrap();
        assert!(matches!(
            p.get_output_amount(&TokenAmount::from_raw(token_a(), 50), &full),
            Err(PairError::InvalidCommission(_))
        ));
        let none = Percent::new(0, 1).unwrap();
        let out = p
            .get_output_amount(&TokenAmount::from_raw(token_a(), 50), &none)
            .unwrap();
        assert_eq!(out.raw().to_string(), "33");
    }

    #[test]
    fn test_quote_liquidity_amount() {
        let p = pair(1_000, 4_000);
        let quoted = p
            .quote_liquidity_amount(&TokenAmount::from_raw(token_a(), 25))
            .unwrap();
        assert_eq!(quoted.currency(), &token_b());
        assert_eq!(quoted.raw().to_string(), "100");
    }

    #[test]
    fn test_liquidity_minted() {
        let empty = pair(0, 0);
        let minted = empty
            .get_liquidity_minted(
                &TokenAmount::from_raw(lp(), 0),
                &TokenAmount::from_raw(token_a(), 1_000_000),
                &TokenAmount::from_raw(token_b(), 4_000_000),
            )
            .unwrap();
        // sqrt(4 * 10^12) - 1000
        assert_eq!(minted.raw().to_string(), "1999000");

        let p = pair(10_000, 10_000);
        let minted = p
            .get_liquidity_minted(
                &TokenAmount::from_raw(lp(), 10_000),
                &TokenAmount::from_raw(token_b(), 2_000),
                &TokenAmount::from_raw(token_a(), 1_000),
            )
            .unwrap();
        assert_eq!(minted.raw().to_string(), "1000");

        assert_eq!(
            p.get_liquidity_minted(
                &TokenAmount::from_raw(token_a(), 10_000),
                &TokenAmount::from_raw(token_a(), 1),
                &TokenAmount::from_raw(token_b(), 1),
            ),
            Err(PairError::LiquidityTokenMismatch)
        );
    }

    #[test]
    fn test_liquidity_minted_rejects_non_positive_deposits() {
        let empty = pair(0, 0);
        let supply = TokenAmount::from_raw(lp(), 0);
        for (a, b) in [(-4_000_000i64, 1_000_000i64), (-4_000_000, -1_000_000), (0, 1_000_000)] {
            assert_eq!(
                empty.get_liquidity_minted(
                    &supply,
                    &TokenAmount::from_raw(token_a(), a),
                    &TokenAmount::from_raw(token_b(), b),
                ),
                Err(PairError::InsufficientInputAmount)
            );
        }

        let p = pair(10_000, 10_000);
        assert_eq!(
            p.get_liquidity_minted(
                &TokenAmount::from_raw(lp(), 10_000),
                &TokenAmount::from_raw(token_a(), 1_000),
                &TokenAmount::from_raw(token_b(), -1_000),
            ),
            Err(PairError::InsufficientInputAmount)
        );
    }

    #[test]
    fn test_liquidity_value() {
        let p = pair(1_000, 500);
        let value = p
            .get_liquidity_value(
                &token_a(),
                &TokenAmount::from_raw(lp(), 1_000),
                &TokenAmount::from_raw(lp(), 250),
            )
            .unwrap();
        assert_eq!(value.raw().to_string(), "250");
        assert_eq!(value.to_fixed(0, Rounding::Down), "0");
        assert_eq!(
            p.get_liquidity_value(
                &token_b(),
                &TokenAmount::from_raw(lp(), 1_000),
                &TokenAmount::from_raw(lp(), 2_000),
            ),
            Err(PairError::InvalidLiquidity)
        );
    }
}
