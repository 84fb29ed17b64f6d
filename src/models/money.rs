//! Money type for representing currency amounts
//!
//! Internally stores amounts in cents (i64) to avoid floating-point precision
//! issues. Conversion to [`Decimal`] is provided for computations that divide
//! amounts, such as equal splits. Arithmetic saturates at the i64 bounds.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub};
use std::str::FromStr;

/// A monetary amount in cents (hundredths of the currency unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Create a Money amount from cents
    ///
    /// # Examples
    /// ```
    /// use tally_cli::models::Money;
    /// let lunch = Money::from_cents(1250); // $12.50
    /// assert_eq!(lunch.to_string(), "$12.50");
    /// ```
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn cents(&self) -> i64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Exact decimal value in currency units (1050 cents -> 10.50)
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Convert a decimal amount to cents, rounding half away from zero
    ///
    /// `None` when the amount does not fit in i64 cents.
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        value
            .checked_mul(Decimal::ONE_HUNDRED)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Self)
    }

    /// Parse an amount as typed by a user or found in a CSV cell
    ///
    /// Accepts "12.50", "-12.50", "$12.50", ".75" and whole units such as
    /// "12". Digits past the cent are rounded half away from zero.
    pub fn parse(s: &str) -> Result<Self, MoneyParseError> {
        let invalid = || MoneyParseError::InvalidFormat(s.trim().to_string());

        let trimmed = s.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let rest = rest.strip_prefix('$').unwrap_or(rest).replace(',', "");
        if rest.is_empty() || rest.starts_with(['-', '+']) {
            return Err(invalid());
        }

        let digits = if rest.starts_with('.') {
            format!("0{}", rest)
        } else {
            rest
        };
        let value = Decimal::from_str(&digits).map_err(|_| invalid())?;
        let money = Self::from_decimal(value).ok_or_else(invalid)?;

        Ok(if negative { -money } else { money })
    }

    /// Format with a currency symbol, e.g. "$12.50" or "-€3.00"
    pub fn format_with_symbol(&self, symbol: &str) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        format!("{}{}{:.2}", sign, symbol, self.to_decimal().abs())
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with_symbol("$"))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// Error type for money parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyParseError {
    #[error("Invalid money format: {0}")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1250).to_string(), "$12.50");
        assert_eq!(Money::zero().to_string(), "$0.00");
        assert_eq!(Money::from_cents(-6000).to_string(), "-$60.00");
        assert_eq!(Money::from_cents(5).format_with_symbol("€"), "€0.05");
    }

    #[test]
    fn test_parse_user_amounts() {
        let cents = |s: &str| Money::parse(s).unwrap().cents();
        assert_eq!(cents("12.50"), 1250);
        assert_eq!(cents("$12.50"), 1250);
        assert_eq!(cents("-12.50"), -1250);
        assert_eq!(cents("12"), 1200);
        assert_eq!(cents("12.5"), 1250);
        assert_eq!(cents(".75"), 75);
        assert_eq!(cents("1,200.00"), 120000);
        assert_eq!(cents("0.005"), 1);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Money::parse("ten").is_err());
        assert!(Money::parse("1.2.3").is_err());
        assert!(Money::parse("").is_err());
        assert!(Money::parse("--5").is_err());
    }

    #[test]
    fn test_month_total() {
        let expenses = [1250, 4000, 300].map(Money::from_cents);
        let total: Money = expenses.into_iter().sum();
        assert_eq!(total, Money::from_cents(5550));
        assert!(total - Money::from_cents(6000) < Money::zero());
    }

    #[test]
    fn test_decimal_conversion() {
        assert_eq!(Money::from_cents(1050).to_decimal(), Decimal::new(1050, 2));
        assert_eq!(
            Money::from_decimal(Decimal::new(133_335, 3)),
            Some(Money::from_cents(13334))
        );
        assert_eq!(
            Money::from_decimal(Decimal::new(-3333, 2)),
            Some(Money::from_cents(-3333))
        );
    }

    #[test]
    fn test_serializes_as_cents() {
        let json = serde_json::to_string(&Money::from_cents(1050)).unwrap();
        assert_eq!(json, "1050");
        assert_eq!(serde_json::from_str::<Money>(&json).unwrap(), Money::from_cents(1050));
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert!(Money::parse("79228162514264337593543950335").is_err());
        assert!(Money::parse("-79228162514264337593543950335").is_err());
        assert!(Money::parse("92233720368547758.08").is_err());
        assert_eq!(Money::parse("92233720368547758.07").unwrap(), Money::from_cents(i64::MAX));
        assert_eq!(Money::from_decimal(Decimal::MAX), None);
    }

    #[test]
    fn test_sum_saturates() {
        let huge = Money::parse("92233720368547758.07").unwrap();
        let total: Money = [huge, huge].into_iter().sum();
        assert_eq!(total, Money::from_cents(i64::MAX));
        assert!(total.is_positive());
        assert_eq!(total - huge, Money::zero());
        assert_eq!(-Money::from_cents(i64::MIN), Money::from_cents(i64::MAX));
    }
}
