//! # Collaborator Traits
//!
//! The cart service talks to its collaborators only through these traits.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          CartService                                    │
//! │                               │                                         │
//! │     ┌──────────────┬──────────┴───────┬────────────────────┐           │
//! │     ▼              ▼                  ▼                    ▼           │
//! │  Catalog      DiscountSource     SessionStore          CartStore       │
//! │  product +    code → window      session → snapshot    durable rows,   │
//! │  variant      + value            (idle expiry)         held quantity   │
//! │     │              │                  │                    │           │
//! │     └──────────────┴────────┬─────────┴────────────────────┘           │
//! │                             ▼                                           │
//! │               sqlite.rs (storefront-db)  |  memory.rs                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage failures surface as [`storefront_core::CartError::Transient`].

use std::sync::Arc;

use async_trait::async_trait;
use storefront_core::{
    Cart, CartResult, CartSnapshot, CartTotals, CatalogProduct, CatalogVariant, Discount,
};

/// Product/variant read API.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn get_product(&self, id: &str) -> CartResult<Option<CatalogProduct>>;

    /// Returns the variant only if it belongs to `product_id`.
    async fn get_variant(&self, variant_id: &str, product_id: &str) -> CartResult<Option<CatalogVariant>>;
}

/// Discount lookup by exact code.
#[async_trait]
pub trait DiscountSource: Send + Sync {
    async fn get_discount(&self, code: &str) -> CartResult<Option<Discount>>;
}

/// Session id → cart snapshot, with idle expiry.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> CartResult<Option<CartSnapshot>>;

    /// Writes the snapshot and refreshes the session's expiry.
    async fn save(&self, session_id: &str, snapshot: &CartSnapshot) -> CartResult<()>;

    async fn remove(&self, session_id: &str) -> CartResult<()>;

    async fn live_session_ids(&self) -> CartResult<Vec<String>>;

    /// Drops expired sessions, returning how many went.
    async fn purge_expired(&self) -> CartResult<u64>;
}

/// Durable per-session cart rows; the source of "held" stock.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn load_cart(&self, session_id: &str) -> CartResult<Option<Cart>>;

    async fn save_cart(&self, cart: &Cart, totals: &CartTotals) -> CartResult<()>;

    async fn delete_cart(&self, session_id: &str) -> CartResult<()>;

    /// Σ quantity of `cart_id` over all carts except `excluding_session`.
    async fn held_quantity(&self, cart_id: &str, excluding_session: &str) -> CartResult<i64>;

    async fn stored_session_ids(&self) -> CartResult<Vec<String>>;

    async fn delete_carts(&self, session_ids: &[String]) -> CartResult<u64>;
}

/// The four collaborators a [`crate::CartService`] is built from.
#[derive(Clone)]
pub struct Ports {
    pub catalog: Arc<dyn Catalog>,
    pub discounts: Arc<dyn DiscountSource>,
    pub sessions: Arc<dyn SessionStore>,
    pub carts: Arc<dyn CartStore>,
}
