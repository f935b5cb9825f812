//! # storefront-core: Pure Cart Logic
//!
//! Cart mutations, totals, discounts, shipping and stock rules as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Storefront Cart Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Request handlers (HTTP layer)                   │   │
//! │  │    /product/addtocart, /cart/update, /checkout/...             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              storefront-cart (CartService)                      │   │
//! │  │    locks, stock ledger, sessions, sweeper                       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ storefront-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌────────┐ │   │
//! │  │   │  cart   │ │ totals  │ │ discount │ │shipping │ │ stock  │ │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └─────────┘ └────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 storefront-db (Database Layer)                  │   │
//! │  │        SQLite catalog, discounts, carts, sessions              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Cart, LineItem, Discount, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`cart`] - Cart mutations and the subscription rule
//! - [`totals`] - Net/discount/shipping/grand computation
//! - [`discount`] - Validity windows and discount amounts
//! - [`shipping`] - Pluggable shipping rules
//! - [`stock`] - Stock availability rules
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use storefront_core::money::Money;
//! use storefront_core::types::Rate;
//!
//! let net = Money::from_cents(5000); // $50.00
//! let off = net.percentage(Rate::from_percent(20));
//! assert_eq!(off.cents(), 1000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod discount;
pub mod error;
pub mod money;
pub mod shipping;
pub mod stock;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CartError, CartResult, ValidationError};
pub use money::Money;
pub use shipping::{FlatRateShipping, NoShipping, ShippingQuote, ShippingRule};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Session lifetime for anonymous carts.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 15 * 60;

/// Net amount at or above which shipping is free ($100.00).
pub const DEFAULT_FREE_SHIPPING_THRESHOLD_CENTS: i64 = 10_000;

/// Flat shipping fee below the threshold ($10.00).
pub const DEFAULT_FLAT_SHIPPING_FEE_CENTS: i64 = 1_000;
