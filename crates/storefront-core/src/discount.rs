//! # Discount Evaluation
//!
//! Validity windows and discount amounts. Lookup of codes is done by the
//! caller; this module only answers "is it live?" and "how much?".
//!
//! ## Window
//! ```text
//!        start                          end
//!          │                             │
//!  ────────●━━━━━━━━━━━ active ━━━━━━━━━━○────────►  time
//!       inclusive                    exclusive
//! ```

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Discount, DiscountKind, Rate};
use crate::validation::{validate_discount_code, ValidationResult};

/// Checks whether `now` falls inside `[start, end)`.
pub fn is_active(discount: &Discount, now: DateTime<Utc>) -> bool {
    discount.start <= now && now < discount.end
}

/// Computes the discount for a net amount.
///
/// - `Amount`: `min(value, net)`
/// - `Percent`: `net × value / 10000`, rounded half-up
///
/// The result never exceeds `net` and is never negative.
pub fn evaluate(discount: &Discount, net: Money) -> Money {
    if !net.is_positive() {
        return Money::zero();
    }

    let raw = match discount.kind {
        DiscountKind::Amount => Money::from_cents(discount.value.max(0)),
        DiscountKind::Percent => {
            let bps = discount.value.clamp(0, 10_000) as u32;
            net.percentage(Rate::from_bps(bps))
        }
    };

    if raw > net {
        net
    } else {
        raw
    }
}

/// Validates a discount definition before it is stored.
pub fn validate_discount(discount: &Discount) -> ValidationResult<()> {
    validate_discount_code(&discount.code)?;

    match discount.kind {
        DiscountKind::Amount if discount.value < 0 => {
            return Err(ValidationError::Negative {
                field: "value".to_string(),
            });
        }
        DiscountKind::Percent if !(0..=10_000).contains(&discount.value) => {
            return Err(ValidationError::OutOfRange {
                field: "value".to_string(),
                min: 0,
                max: 10_000,
            });
        }
        _ => {}
    }

    if discount.end <= discount.start {
        return Err(ValidationError::InvalidFormat {
            field: "end".to_string(),
            reason: "must be after start".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn discount(kind: DiscountKind, value: i64) -> Discount {
        Discount {
            code: "SAVE".to_string(),
            kind,
            value,
            start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_window_boundaries() {
        let d = discount(DiscountKind::Amount, 500);

        assert!(is_active(&d, d.start));
        assert!(is_active(&d, d.end - Duration::seconds(1)));
        assert!(!is_active(&d, d.end));
        assert!(!is_active(&d, d.start - Duration::seconds(1)));
    }

    #[test]
    fn test_amount_discount() {
        let d = discount(DiscountKind::Amount, 1000);
        assert_eq!(evaluate(&d, Money::from_cents(5997)).cents(), 1000);
    }

    #[test]
    fn test_amount_discount_clamped_to_net() {
        let d = discount(DiscountKind::Amount, 10_000);
        assert_eq!(evaluate(&d, Money::from_cents(3000)).cents(), 3000);
    }

    #[test]
    fn test_percent_discount() {
        let d = discount(DiscountKind::Percent, 2000);
        assert_eq!(evaluate(&d, Money::from_cents(5000)).cents(), 1000);
    }

    #[test]
    fn test_percent_rounds_half_up() {
        // 333 × 15% = 49.95 → 50
        let d = discount(DiscountKind::Percent, 1500);
        assert_eq!(evaluate(&d, Money::from_cents(333)).cents(), 50);
    }

    #[test]
    fn test_empty_cart_gets_no_discount() {
        let d = discount(DiscountKind::Amount, 1000);
        assert_eq!(evaluate(&d, Money::zero()), Money::zero());
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount(&discount(DiscountKind::Percent, 2000)).is_ok());
        assert!(validate_discount(&discount(DiscountKind::Percent, 10_001)).is_err());
        assert!(validate_discount(&discount(DiscountKind::Amount, -1)).is_err());

        let mut backwards = discount(DiscountKind::Amount, 100);
        backwards.end = backwards.start;
        assert!(validate_discount(&backwards).is_err());
    }
}
