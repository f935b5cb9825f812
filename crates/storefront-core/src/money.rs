//! # Money Module
//!
//! Provides the `Money` type for handling prices and cart totals safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Naive cart math in floating point:                                     │
//! │    19.99 * 3 = 59.96999999999999  ❌ WRONG!                             │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    1999 cents * 3 = 5997 cents = $59.97  ✅                             │
//! │                                                                         │
//! │  Percentages are basis points, rounded half-up to the nearest cent     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::money::Money;
//!
//! let price: Money = "19.99".parse().unwrap();
//! let line = price.multiply_quantity(3);
//! assert_eq!(line.cents(), 5997);
//!
//! // Subtraction that can never go below zero
//! let left = Money::from_cents(3000).saturating_sub_floor_zero(Money::from_cents(10000));
//! assert!(left.is_zero());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::Rate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  CatalogProduct.price_cents ──► LineItem.unit_price ──► total_item_price│
/// │                                                                         │
/// │  Σ total_item_price ──► net ──► - discount ──► + shipping ──► grand    │
/// │                                                                         │
/// │  grand_total is the figure handed to payment gateways                  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity, saturating at the `i64` bounds.
    ///
    /// Cart mutations bound their quantities with [`Money::checked_multiply_quantity`]
    /// first, so saturation is never observed on a committed cart.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(1999); // $19.99
    /// let total = unit_price.multiply_quantity(3);
    /// assert_eq!(total.cents(), 5997); // $59.97
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Multiplies a unit price by a quantity, or `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(499).checked_multiply_quantity(2), Some(Money::from_cents(998)));
    /// assert_eq!(Money::from_cents(499).checked_multiply_quantity(i64::MAX / 100), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, or `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Subtracts `other`, clamping the result at zero.
    ///
    /// ## User Workflow
    /// ```text
    /// Net: $30.00, Discount: $100.00
    ///      │
    ///      ▼
    /// saturating_sub_floor_zero ← THIS FUNCTION
    ///      │
    ///      ▼
    /// $0.00 (never negative)
    /// ```
    #[inline]
    pub fn saturating_sub_floor_zero(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0).max(0))
    }

    /// Returns `rate` of this amount, rounded half-up to the nearest cent.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`. The +5000 provides the
    /// half-up rounding for non-negative amounts.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    /// use storefront_core::types::Rate;
    ///
    /// let net = Money::from_cents(5000); // $50.00
    /// assert_eq!(net.percentage(Rate::from_bps(2000)).cents(), 1000); // 20% = $10.00
    ///
    /// // $0.99 at 12.5% = 12.375 cents → 12 cents
    /// assert_eq!(Money::from_cents(99).percentage(Rate::from_bps(1250)).cents(), 12);
    /// ```
    pub fn percentage(&self, rate: Rate) -> Money {
        // i128 prevents overflow on large amounts
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses decimal strings such as `"19.99"`, `"5"`, `"0.5"`.
///
/// More than two fractional digits is rejected rather than rounded, so an
/// admin typo like `"9.999"` never silently becomes `$10.00`.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('$');
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (major, minor) = match digits.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (digits, ""),
        };

        if minor.len() > 2 {
            return Err(invalid("at most two decimal places"));
        }
        if major.is_empty() && minor.is_empty() {
            return Err(invalid("no digits"));
        }
        if !major.chars().all(|c| c.is_ascii_digit()) || !minor.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("must be a decimal number"));
        }

        let major: i64 = if major.is_empty() {
            0
        } else {
            major.parse().map_err(|_| invalid("amount too large"))?
        };
        let minor: i64 = match minor.len() {
            0 => 0,
            1 => minor.parse::<i64>().map_err(|_| invalid("must be a decimal number"))? * 10,
            _ => minor.parse().map_err(|_| invalid("must be a decimal number"))?,
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(|| invalid("amount too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display for logs and messages. Frontends format for their own locale.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_checked_arithmetic() {
        let price = Money::from_cents(499);
        assert_eq!(price.checked_multiply_quantity(3), Some(Money::from_cents(1497)));
        assert_eq!(price.checked_multiply_quantity(i64::MAX / 100), None);
        assert_eq!(price.checked_add(Money::from_cents(1)), Some(Money::from_cents(500)));
        assert_eq!(Money::from_cents(i64::MAX).checked_add(price), None);
    }

    #[test]
    fn test_operators_saturate() {
        let max = Money::from_cents(i64::MAX);
        assert_eq!((max + Money::from_cents(1)).cents(), i64::MAX);
        assert_eq!(Money::from_cents(499).multiply_quantity(i64::MAX).cents(), i64::MAX);
        let total: Money = [max, max].into_iter().sum();
        assert_eq!(total, max);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(5997)), "$59.97");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::zero()), "$0.00");
    }

    #[test]
    fn test_multiply_avoids_float_drift() {
        let unit_price = Money::from_cents(1999);
        assert_eq!(unit_price.multiply_quantity(3).cents(), 5997);
        assert_eq!((unit_price * 3).cents(), 5997);
    }

    #[test]
    fn test_saturating_sub_floor_zero() {
        let net = Money::from_cents(3000);
        assert_eq!(net.saturating_sub_floor_zero(Money::from_cents(1000)).cents(), 2000);
        assert_eq!(net.saturating_sub_floor_zero(Money::from_cents(10000)).cents(), 0);
        assert_eq!(net.saturating_sub_floor_zero(net).cents(), 0);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        assert_eq!(Money::from_cents(5000).percentage(Rate::from_bps(2000)).cents(), 1000);
        // 10 cents at 25% = 2.5 cents → 3
        assert_eq!(Money::from_cents(10).percentage(Rate::from_bps(2500)).cents(), 3);
        // 10 cents at 24% = 2.4 cents → 2
        assert_eq!(Money::from_cents(10).percentage(Rate::from_bps(2400)).cents(), 2);
        assert!(Money::from_cents(5000).percentage(Rate::zero()).is_zero());
    }

    #[test]
    fn test_parse() {
        assert_eq!("19.99".parse::<Money>().unwrap().cents(), 1999);
        assert_eq!("$5".parse::<Money>().unwrap().cents(), 500);
        assert_eq!("0.5".parse::<Money>().unwrap().cents(), 50);
        assert_eq!(".75".parse::<Money>().unwrap().cents(), 75);
        assert_eq!("-3.10".parse::<Money>().unwrap().cents(), -310);
        assert_eq!(" 100.00 ".parse::<Money>().unwrap().cents(), 10000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Money>().is_err());
        assert!("9.999".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
        assert!(".".parse::<Money>().is_err());
        assert!("1e5".parse::<Money>().is_err());
    }

    #[test]
    fn test_sum() {
        let total: Money = [1999, 500, 1]
            .iter()
            .map(|c| Money::from_cents(*c))
            .sum();
        assert_eq!(total.cents(), 2500);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());
        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
    }
}
