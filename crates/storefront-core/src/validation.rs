//! # Validation Module
//!
//! Input validation for cart operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request handler                                              │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── Missing fields                                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: CartService (Rust)                                           │
//! │  └── THIS MODULE: ids, quantities, comments, codes                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::validation::{validate_id, validate_quantity};
//!
//! validate_id("product_id", "5f2a").unwrap();
//! validate_quantity(5, Some(25)).unwrap();
//! ```

use crate::error::{CartError, ValidationError};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest id accepted for products, variants and sessions.
pub const MAX_ID_LEN: usize = 64;

/// Longest free-text comment on a line.
pub const MAX_COMMENT_LEN: usize = 500;

/// Longest discount code.
pub const MAX_DISCOUNT_CODE_LEN: usize = 50;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an identifier (product, variant, cart line, session).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_ID_LEN`] characters
/// - No whitespace or control characters
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > MAX_ID_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ID_LEN,
        });
    }

    if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

/// Trims a line comment; blank comments become `None`.
pub fn validate_comment(comment: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(comment) = comment.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };

    if comment.chars().count() > MAX_COMMENT_LEN {
        return Err(ValidationError::TooLong {
            field: "productComment".to_string(),
            max: MAX_COMMENT_LEN,
        });
    }

    Ok(Some(comment.to_string()))
}

/// Validates a discount code. Codes are case-sensitive and never trimmed
/// beyond surrounding whitespace.
pub fn validate_discount_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "discountCode".to_string(),
        });
    }

    if code.len() > MAX_DISCOUNT_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "discountCode".to_string(),
            max: MAX_DISCOUNT_CODE_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity for an add (must be >= 1).
///
/// ## Rules
/// - Must be at least 1
/// - Must not exceed `max` when a cap is configured
///
/// The cap is reported as [`CartError::QuantityExceedsMax`] so the caller
/// can tell it apart from malformed input.
pub fn validate_quantity(qty: i64, max: Option<i64>) -> Result<(), CartError> {
    if qty < 1 {
        return Err(ValidationError::OutOfRange {
            field: "productQuantity".to_string(),
            min: 1,
            max: max.unwrap_or(i64::MAX),
        }
        .into());
    }

    check_quantity_cap(qty, max)
}

/// Validates a quantity for an update, where 0 means "remove".
pub fn validate_update_quantity(qty: i64, max: Option<i64>) -> Result<(), CartError> {
    if qty < 0 {
        return Err(ValidationError::Negative {
            field: "productQuantity".to_string(),
        }
        .into());
    }

    check_quantity_cap(qty, max)
}

/// Applies the per-line cap.
pub fn check_quantity_cap(qty: i64, max: Option<i64>) -> Result<(), CartError> {
    match max {
        Some(max) if qty > max => Err(CartError::QuantityExceedsMax {
            requested: qty,
            max,
        }),
        _ => Ok(()),
    }
}

/// Validates a price in cents.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
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

    #[test]
    fn test_validate_id() {
        assert!(validate_id("productId", "prod-1").is_ok());
        assert!(validate_id("productId", "").is_err());
        assert!(validate_id("productId", "   ").is_err());
        assert!(validate_id("productId", "a b").is_err());
        assert!(validate_id("productId", &"x".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_comment() {
        assert_eq!(validate_comment(None).unwrap(), None);
        assert_eq!(validate_comment(Some("   ")).unwrap(), None);
        assert_eq!(
            validate_comment(Some("  engrave: AJ ")).unwrap().as_deref(),
            Some("engrave: AJ")
        );
        assert!(validate_comment(Some(&"y".repeat(501))).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1, None).is_ok());
        assert!(validate_quantity(25, Some(25)).is_ok());
        assert!(matches!(validate_quantity(0, None), Err(CartError::Validation(_))));
        assert!(matches!(validate_quantity(-3, Some(25)), Err(CartError::Validation(_))));
        assert_eq!(
            validate_quantity(26, Some(25)),
            Err(CartError::QuantityExceedsMax {
                requested: 26,
                max: 25
            })
        );
    }

    #[test]
    fn test_validate_update_quantity_allows_zero() {
        assert!(validate_update_quantity(0, Some(10)).is_ok());
        assert!(validate_update_quantity(-1, None).is_err());
        assert!(validate_update_quantity(11, Some(10)).is_err());
    }

    #[test]
    fn test_validate_discount_code() {
        assert!(validate_discount_code("SAVE10").is_ok());
        assert!(validate_discount_code("").is_err());
        assert!(validate_discount_code(&"C".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1999).is_ok());
        assert!(validate_price_cents(-1).is_err());
    }
}
