//! # Response Shapes
//!
//! What storefront request handlers serialize back to the browser.
//!
//! ## Error Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CartError                         ErrorCode              status       │
//! │  ─────────                         ─────────              ──────       │
//! │  ProductNotFound                   NOT_FOUND               400         │
//! │  ItemNotFound / CartNotFound       NOT_FOUND               400         │
//! │  InsufficientStock                 INSUFFICIENT_STOCK      400         │
//! │  QuantityExceedsMax                QUANTITY_EXCEEDED       400         │
//! │  SubscriptionConflict              SUBSCRIPTION_CONFLICT   400         │
//! │  InvalidOrExpiredCode              INVALID_DISCOUNT        400         │
//! │  Validation                        VALIDATION_ERROR        400         │
//! │  Transient                         TEMPORARILY_UNAVAILABLE 503         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The frontend receives:
//! ```json
//! {
//!   "code": "INSUFFICIENT_STOCK",
//!   "message": "There is insufficient stock of this product."
//! }
//! ```

use serde::Serialize;
use ts_rs::TS;

use storefront_core::{CartError, CartSnapshot, CartTotals, LineItem};

/// Shown to shoppers for every stock shortfall. Quantities stay in the logs.
pub const INSUFFICIENT_STOCK_MESSAGE: &str = "There is insufficient stock of this product.";

// =============================================================================
// Success
// =============================================================================

/// Body returned by every cart mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub message: String,
    /// Distinct lines, for the cart badge.
    pub total_cart_items: i64,
    pub totals: CartTotals,
    pub items: Vec<LineItem>,
}

impl CartResponse {
    pub fn from_snapshot(snapshot: &CartSnapshot, message: impl Into<String>) -> Self {
        CartResponse {
            message: message.into(),
            total_cart_items: snapshot.totals.total_cart_items,
            totals: snapshot.totals.clone(),
            items: snapshot.cart.items.values().cloned().collect(),
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product, variant, line or cart missing (400)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Not enough stock (400)
    InsufficientStock,

    /// Over the per-line cap (400)
    QuantityExceeded,

    /// Subscription mixed with other items (400)
    SubscriptionConflict,

    /// Unknown or lapsed discount code (400)
    InvalidDiscount,

    /// Storage failure, retry later (503)
    TemporarilyUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// HTTP status for this error. Every business rule violation is a 400,
    /// including a missing product or cart; `code` tells them apart.
    pub fn status(&self) -> u16 {
        match self.code {
            ErrorCode::TemporarilyUnavailable => 503,
            _ => 400,
        }
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::ProductNotFound(_) => {
                ApiError::new(ErrorCode::NotFound, "This product is no longer available.")
            }
            CartError::ItemNotFound(_) => {
                ApiError::new(ErrorCode::NotFound, "This item is not in your cart.")
            }
            CartError::CartNotFound(_) => {
                ApiError::new(ErrorCode::NotFound, "Your cart is empty.")
            }
            CartError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, INSUFFICIENT_STOCK_MESSAGE)
            }
            CartError::QuantityExceedsMax { max, .. } => ApiError::new(
                ErrorCode::QuantityExceeded,
                format!("You can add at most {} of this product.", max),
            ),
            CartError::SubscriptionConflict(reason) => {
                ApiError::new(ErrorCode::SubscriptionConflict, reason)
            }
            CartError::InvalidOrExpiredCode(_) => {
                ApiError::new(ErrorCode::InvalidDiscount, "That discount code is invalid or expired.")
            }
            CartError::Transient(e) => {
                tracing::error!("Cart storage failure: {}", e);
                ApiError::new(
                    ErrorCode::TemporarilyUnavailable,
                    "Your cart could not be updated. Please try again.",
                )
            }
            CartError::Validation(e) => ApiError::new(ErrorCode::ValidationError, e.to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::ValidationError;

    #[test]
    fn test_status_classes() {
        let cases = [
            (CartError::ProductNotFound("p".into()), 400),
            (CartError::CartNotFound("s".into()), 400),
            (CartError::ItemNotFound("mug".into()), 400),
            (CartError::InvalidOrExpiredCode("X".into()), 400),
            (CartError::QuantityExceedsMax { requested: 9, max: 5 }, 400),
            (CartError::Transient("db".into()), 503),
            (
                CartError::Validation(ValidationError::Required {
                    field: "productId".into(),
                }),
                400,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_insufficient_stock_hides_quantities() {
        let err = ApiError::from(CartError::InsufficientStock {
            cart_id: "mug".into(),
            available: 2,
            requested: 3,
        });
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.message, INSUFFICIENT_STOCK_MESSAGE);
    }

    #[test]
    fn test_error_serializes_screaming_code() {
        let err = ApiError::new(ErrorCode::InvalidDiscount, "nope");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "INVALID_DISCOUNT");
        assert_eq!(json["message"], "nope");
    }

    #[test]
    fn test_cart_response_from_empty_snapshot() {
        let response = CartResponse::from_snapshot(&CartSnapshot::empty("s1"), "Cart emptied");
        assert_eq!(response.total_cart_items, 0);
        assert!(response.items.is_empty());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["totalCartItems"], 0);
        assert_eq!(json["message"], "Cart emptied");
    }
}
