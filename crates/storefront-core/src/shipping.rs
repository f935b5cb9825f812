//! # Shipping Rules
//!
//! Shipping is a pluggable rule evaluated against the cart's net amount.
//! The default rule is a flat fee waived above a free-shipping threshold.

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Amount charged for shipping plus an optional display message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingQuote {
    pub amount: Money,
    pub message: Option<String>,
}

impl ShippingQuote {
    /// A zero quote without a message.
    pub fn none() -> Self {
        ShippingQuote {
            amount: Money::zero(),
            message: None,
        }
    }
}

/// Computes shipping for a net amount.
pub trait ShippingRule: Send + Sync {
    fn quote(&self, net: Money) -> ShippingQuote;
}

/// Flat fee below `free_threshold`, free at or above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatRateShipping {
    pub free_threshold: Money,
    pub fee: Money,
}

impl FlatRateShipping {
    pub fn new(free_threshold: Money, fee: Money) -> Self {
        FlatRateShipping { free_threshold, fee }
    }
}

impl ShippingRule for FlatRateShipping {
    fn quote(&self, net: Money) -> ShippingQuote {
        if net.is_zero() {
            return ShippingQuote::none();
        }

        if net >= self.free_threshold {
            ShippingQuote {
                amount: Money::zero(),
                message: Some("FREE shipping".to_string()),
            }
        } else {
            ShippingQuote {
                amount: self.fee,
                message: Some("Estimated shipping".to_string()),
            }
        }
    }
}

/// Always free, no message. Used when shipping is not charged at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoShipping;

impl ShippingRule for NoShipping {
    fn quote(&self, _net: Money) -> ShippingQuote {
        ShippingQuote::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> FlatRateShipping {
        FlatRateShipping::new(Money::from_cents(10_000), Money::from_cents(1000))
    }

    #[test]
    fn test_below_threshold_charges_fee() {
        let quote = rule().quote(Money::from_cents(4000));
        assert_eq!(quote.amount.cents(), 1000);
        assert_eq!(quote.message.as_deref(), Some("Estimated shipping"));
    }

    #[test]
    fn test_above_threshold_is_free() {
        let quote = rule().quote(Money::from_cents(12_000));
        assert!(quote.amount.is_zero());
        assert_eq!(quote.message.as_deref(), Some("FREE shipping"));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(rule().quote(Money::from_cents(10_000)).amount.is_zero());
    }

    #[test]
    fn test_empty_cart_ships_nothing() {
        assert_eq!(rule().quote(Money::zero()), ShippingQuote::none());
        assert_eq!(NoShipping.quote(Money::from_cents(500)), ShippingQuote::none());
    }
}
