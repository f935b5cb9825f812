//! # Error Types
//!
//! Domain-specific error types for storefront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storefront-core errors (this file)                                    │
//! │  ├── CartError        - Cart/stock/discount business failures          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  storefront-db errors (separate crate)                                 │
//! │  └── DbError          - Database failures → CartError::Transient       │
//! │                                                                         │
//! │  storefront-cart response layer                                        │
//! │  └── ApiError         - What request handlers serialize (400/404/5xx)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business-rule violations are returned as typed variants. Only genuine
//! storage faults end up in [`CartError::Transient`].

use thiserror::Error;

// =============================================================================
// Cart Error
// =============================================================================

/// Cart business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Product (or the selected variant) does not exist in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The line item is not in the session's cart.
    #[error("Cart item not found: {0}")]
    ItemNotFound(String),

    /// The session has no cart.
    #[error("Cart not found for session {0}")]
    CartNotFound(String),

    /// Requested quantity exceeds net available stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Cart (qty: 3)
    ///      │
    ///      ▼
    /// catalog stock 5, held by other sessions 3 → available 2
    ///      │
    ///      ▼
    /// InsufficientStock { cart_id, available: 2, requested: 3 }
    /// ```
    #[error("Insufficient stock for {cart_id}: available {available}, requested {requested}")]
    InsufficientStock {
        cart_id: String,
        available: i64,
        requested: i64,
    },

    /// Quantity exceeds the configured per-item cap.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityExceedsMax { requested: i64, max: i64 },

    /// Subscription items cannot share a cart with anything else.
    #[error("Subscription conflict: {0}")]
    SubscriptionConflict(String),

    /// Discount code does not exist or is outside its validity window.
    #[error("Discount code is invalid or expired: {0}")]
    InvalidOrExpiredCode(String),

    /// Storage or catalog fetch failed; the caller should retry.
    #[error("Temporary failure: {0}")]
    Transient(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CartError {
    /// True for failures the caller may retry (5xx class).
    pub fn is_transient(&self) -> bool {
        matches!(self, CartError::Transient(_))
    }

    /// Creates a subscription conflict with a reason.
    pub fn subscription(reason: impl Into<String>) -> Self {
        CartError::SubscriptionConflict(reason.into())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g. malformed amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CartError.
pub type CartResult<T> = Result<T, CartError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CartError::InsufficientStock {
            cart_id: "var-red".to_string(),
            available: 2,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for var-red: available 2, requested 3"
        );

        let err = CartError::QuantityExceedsMax {
            requested: 30,
            max: 25,
        };
        assert_eq!(err.to_string(), "Quantity 30 exceeds maximum allowed (25)");
    }

    #[test]
    fn test_transient_classification() {
        assert!(CartError::Transient("pool closed".into()).is_transient());
        assert!(!CartError::ItemNotFound("x".into()).is_transient());
    }

    #[test]
    fn test_validation_converts_to_cart_error() {
        let validation_err = ValidationError::Required {
            field: "product_id".to_string(),
        };
        assert_eq!(validation_err.to_string(), "product_id is required");
        let err: CartError = validation_err.into();
        assert!(matches!(err, CartError::Validation(_)));
    }
}
