//! # Domain Types
//!
//! Core domain types used throughout the storefront cart.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ CatalogProduct  │   │      Cart       │   │    Discount     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  session_id     │   │  code           │       │
//! │  │  price_cents    │   │  items (map)    │   │  kind           │       │
//! │  │  stock (opt)    │   │  discount_code  │   │  value          │       │
//! │  │  track_stock    │   │  pending_order  │   │  start / end    │       │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────┘       │
//! │                                 │                                       │
//! │  ┌─────────────────┐   ┌────────▼────────┐   ┌─────────────────┐       │
//! │  │ CatalogVariant  │   │    LineItem     │   │   CartTotals    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id, product_id │   │  cart_id (key)  │   │  net / discount │       │
//! │  │  price, stock   │   │  qty, prices    │   │  shipping/grand │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Line items copy title, image, link and unit price from the catalog at add
//! time. They are not live-joined; a later price change in the catalog does
//! not alter a cart until the shopper adds the product again.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Rate
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// 1 basis point = 0.01%, so `2000` is 20% and `1250` is 12.5%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a whole percentage (20 → 20%).
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        Rate(pct * 100)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Catalog Views
// =============================================================================

/// Read-only view of a product as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: String,
    pub title: String,
    pub price_cents: i64,
    /// `None` means stock is not recorded: treated as unlimited.
    pub stock: Option<i64>,
    /// Per-product stock tracking. `false` disables checks for this product
    /// even when tracking is globally enabled.
    pub track_stock: bool,
    /// Recurring-billing plan id. Presence makes this a subscription product.
    pub subscription_id: Option<String>,
    pub image: Option<String>,
    pub permalink: Option<String>,
    pub published: bool,
}

impl CatalogProduct {
    /// Returns the price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if this is a subscription product.
    #[inline]
    pub fn is_subscription(&self) -> bool {
        self.subscription_id.is_some()
    }
}

/// Read-only view of a product variant (size, colour, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogVariant {
    pub id: String,
    pub product_id: String,
    pub title: String,
    pub price_cents: i64,
    /// `None` means unlimited, same as on products.
    pub stock: Option<i64>,
}

impl CatalogVariant {
    /// Returns the price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// A line in a shopper's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Key within the cart: the variant id when a variant is selected,
    /// otherwise the product id.
    pub cart_id: String,
    pub product_id: String,
    pub variant_id: Option<String>,
    /// Title at time of adding (frozen).
    pub title: String,
    pub product_image: Option<String>,
    pub link: Option<String>,
    /// Always >= 1. A zero quantity removes the line instead.
    pub quantity: i64,
    /// Unit price in cents at time of adding (frozen).
    pub unit_price_cents: i64,
    /// unit_price × quantity, recomputed on every mutation.
    pub total_item_price_cents: i64,
    pub product_subscription: Option<String>,
    pub product_comment: Option<String>,
}

impl LineItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn total_item_price(&self) -> Money {
        Money::from_cents(self.total_item_price_cents)
    }

    /// Checks if this line is a subscription.
    #[inline]
    pub fn is_subscription(&self) -> bool {
        self.product_subscription.is_some()
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A session's cart. Behaviour lives in [`crate::cart`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Owning session (1:1).
    pub session_id: String,

    /// Lines keyed by `cart_id`.
    pub items: BTreeMap<String, LineItem>,

    /// Currently applied discount code.
    pub discount_code: Option<String>,

    /// Order created by a checkout that has not completed yet.
    pub pending_order_id: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle state of a cart.
///
/// ```text
/// Empty ──add──► NonEmpty ──mutations──► NonEmpty ──empty/last removed──► Empty
///                   │
///                   └── Subscription (single subscription line; all adds rejected)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CartState {
    Empty,
    NonEmpty,
    Subscription,
}

// =============================================================================
// Cart Totals
// =============================================================================

/// Derived totals for a cart. Never authoritative; always recomputed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    /// Number of distinct lines (cart badge).
    pub total_cart_items: i64,
    /// Sum of quantities across lines.
    pub total_cart_products: i64,
    /// Σ total_item_price.
    pub net_amount_cents: i64,
    pub discount_amount_cents: i64,
    pub shipping_amount_cents: i64,
    /// max(net - discount, 0) + shipping.
    pub grand_total_cents: i64,
    pub shipping_message: Option<String>,
}

impl CartTotals {
    #[inline]
    pub fn net_amount(&self) -> Money {
        Money::from_cents(self.net_amount_cents)
    }

    #[inline]
    pub fn discount_amount(&self) -> Money {
        Money::from_cents(self.discount_amount_cents)
    }

    #[inline]
    pub fn shipping_amount(&self) -> Money {
        Money::from_cents(self.shipping_amount_cents)
    }

    /// The amount payment gateways charge.
    #[inline]
    pub fn grand_total(&self) -> Money {
        Money::from_cents(self.grand_total_cents)
    }
}

/// What the session store holds for a shopper: the cart plus its totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub cart: Cart,
    pub totals: CartTotals,
}

impl CartSnapshot {
    /// An empty snapshot for a session with no cart.
    pub fn empty(session_id: impl Into<String>) -> Self {
        CartSnapshot {
            cart: Cart::new(session_id),
            totals: CartTotals::default(),
        }
    }
}

// =============================================================================
// Discount
// =============================================================================

/// How a discount's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// Fixed amount off, `value` in cents.
    Amount,
    /// Percentage off the net amount, `value` in basis points.
    Percent,
}

/// A discount code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Discount {
    /// Unique, case-sensitive.
    pub code: String,
    pub kind: DiscountKind,
    /// Cents for `Amount`, basis points for `Percent`.
    pub value: i64,
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    #[ts(as = "String")]
    pub end: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
