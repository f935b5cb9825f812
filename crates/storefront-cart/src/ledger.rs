//! # Stock Ledger
//!
//! Answers "how much of this `cart_id` can this session still take?" by
//! aggregating what every other session's persisted cart holds.
//!
//! ## User Workflow
//! ```text
//! Shopper A adds 3 × mug (stock 5)
//!      │
//!      ▼
//! held_by_others("mug", A) = Σ quantity in carts of B, C, ...   = 3
//!      │
//!      ▼
//! available = max(5 - 3, 0) = 2  → requested 3 > 2 → InsufficientStock
//! ```
//!
//! Nothing is cached: every check reads current rows.

use std::sync::Arc;

use tracing::{debug, warn};

use storefront_core::stock::{check_quantity, net_available};
use storefront_core::{CartError, CartResult};

use crate::ports::CartStore;

/// Stock position of one `cart_id` from one session's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    pub catalog_stock: i64,
    pub held_by_others: i64,
}

impl StockLevel {
    pub fn net_available(&self) -> i64 {
        net_available(self.catalog_stock, self.held_by_others)
    }
}

#[derive(Clone)]
pub struct StockLedger {
    carts: Arc<dyn CartStore>,
}

impl StockLedger {
    pub fn new(carts: Arc<dyn CartStore>) -> Self {
        StockLedger { carts }
    }

    /// Current stock position. Any failure is reported as transient so a
    /// tracked add is never let through unchecked.
    pub async fn available_stock(
        &self,
        cart_id: &str,
        session_id: &str,
        catalog_stock: i64,
    ) -> CartResult<StockLevel> {
        let held_by_others = self
            .carts
            .held_quantity(cart_id, session_id)
            .await
            .map_err(|e| {
                warn!(cart_id = %cart_id, error = %e, "Stock aggregation failed");
                match e {
                    CartError::Transient(_) => e,
                    other => CartError::Transient(other.to_string()),
                }
            })?;

        Ok(StockLevel {
            catalog_stock,
            held_by_others,
        })
    }

    /// Verifies `requested_total` fits. `None` stock is unlimited and skips
    /// the aggregation entirely.
    pub async fn check(
        &self,
        cart_id: &str,
        session_id: &str,
        requested_total: i64,
        catalog_stock: Option<i64>,
    ) -> CartResult<()> {
        let Some(stock) = catalog_stock else {
            return Ok(());
        };

        let level = self.available_stock(cart_id, session_id, stock).await?;
        debug!(
            cart_id = %cart_id,
            session_id = %session_id,
            stock,
            held = level.held_by_others,
            requested = requested_total,
            "Stock check"
        );

        check_quantity(cart_id, requested_total, Some(stock), level.held_by_others)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCarts;
    use storefront_core::{Cart, CartTotals, CatalogProduct, LineItem};

    fn mug() -> CatalogProduct {
        CatalogProduct {
            id: "mug".to_string(),
            title: "Mug".to_string(),
            price_cents: 1450,
            stock: Some(5),
            track_stock: true,
            subscription_id: None,
            image: None,
            permalink: None,
            published: true,
        }
    }

    async fn ledger_with(holds: &[(&str, i64)]) -> StockLedger {
        let carts = Arc::new(MemoryCarts::default());
        for (session, qty) in holds {
            let mut cart = Cart::new(*session);
            cart.add_line(LineItem::from_catalog(&mug(), None, *qty, None));
            carts.save_cart(&cart, &CartTotals::default()).await.unwrap();
        }
        StockLedger::new(carts)
    }

    #[tokio::test]
    async fn test_available_stock_counts_other_sessions() {
        let ledger = ledger_with(&[("a", 2), ("b", 1)]).await;

        let level = ledger.available_stock("mug", "a", 5).await.unwrap();
        assert_eq!(level.held_by_others, 1);
        assert_eq!(level.net_available(), 4);

        let level = ledger.available_stock("mug", "c", 2).await.unwrap();
        assert_eq!(level.net_available(), 0);
    }

    #[tokio::test]
    async fn test_check_against_new_total() {
        let ledger = ledger_with(&[("a", 3)]).await;

        ledger.check("mug", "b", 2, Some(5)).await.unwrap();
        ledger.check("mug", "b", 100, None).await.unwrap();

        let err = ledger.check("mug", "b", 3, Some(5)).await.unwrap_err();
        assert_eq!(
            err,
            CartError::InsufficientStock {
                cart_id: "mug".to_string(),
                available: 2,
                requested: 3,
            }
        );
    }
}
