//! # Cart Repository
//!
//! Durable per-session cart rows. These rows are what the stock ledger
//! aggregates to find quantities held by other shoppers.
//!
//! ## Tables
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  carts (1 per session)              cart_items (N per cart)            │
//! │  ┌──────────────────────┐          ┌──────────────────────────────┐    │
//! │  │ session_id (PK)      │◄─────────│ session_id (FK, CASCADE)     │    │
//! │  │ discount_code        │          │ cart_id    ─┐ PK             │    │
//! │  │ pending_order_id     │          │ quantity    │                │    │
//! │  │ *_cents totals       │          │ prices, snapshot fields      │    │
//! │  └──────────────────────┘          └─────────────┼────────────────┘    │
//! │                                                  │                     │
//! │                     idx_cart_items_cart_id ──────┘                     │
//! │                     SUM(quantity) WHERE cart_id = ? AND session_id <> ?│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `save` replaces a cart's item rows inside one transaction, so a
//! concurrent ledger read sees either the old lines or the new ones.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use storefront_core::{Cart, CartTotals, LineItem};

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    session_id: String,
    discount_code: Option<String>,
    pending_order_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    cart_id: String,
    product_id: String,
    variant_id: Option<String>,
    title: String,
    product_image: Option<String>,
    link: Option<String>,
    quantity: i64,
    unit_price_cents: i64,
    total_item_price_cents: i64,
    product_subscription: Option<String>,
    product_comment: Option<String>,
}

impl From<CartItemRow> for LineItem {
    fn from(row: CartItemRow) -> Self {
        LineItem {
            cart_id: row.cart_id,
            product_id: row.product_id,
            variant_id: row.variant_id,
            title: row.title,
            product_image: row.product_image,
            link: row.link,
            quantity: row.quantity,
            unit_price_cents: row.unit_price_cents,
            total_item_price_cents: row.total_item_price_cents,
            product_subscription: row.product_subscription,
            product_comment: row.product_comment,
        }
    }
}

/// Repository for persisted carts.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Loads a session's cart with its lines.
    pub async fn load(&self, session_id: &str) -> DbResult<Option<Cart>> {
        let Some(row) = sqlx::query_as::<_, CartRow>(
            r#"
            SELECT session_id, discount_code, pending_order_id, created_at, updated_at
            FROM carts
            WHERE session_id = ?1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, CartItemRow>(
            r#"
            SELECT cart_id, product_id, variant_id, title, product_image, link,
                   quantity, unit_price_cents, total_item_price_cents,
                   product_subscription, product_comment
            FROM cart_items
            WHERE session_id = ?1
            ORDER BY cart_id
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Cart {
            session_id: row.session_id,
            items: items
                .into_iter()
                .map(|r| (r.cart_id.clone(), LineItem::from(r)))
                .collect(),
            discount_code: row.discount_code,
            pending_order_id: row.pending_order_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }

    /// Writes the cart header and replaces all its lines.
    pub async fn save(&self, cart: &Cart, totals: &CartTotals) -> DbResult<()> {
        debug!(
            session_id = %cart.session_id,
            lines = cart.items.len(),
            grand_total_cents = totals.grand_total_cents,
            "Saving cart"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO carts (
                session_id, discount_code, pending_order_id,
                net_amount_cents, discount_amount_cents, shipping_amount_cents, grand_total_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(session_id) DO UPDATE SET
                discount_code = excluded.discount_code,
                pending_order_id = excluded.pending_order_id,
                net_amount_cents = excluded.net_amount_cents,
                discount_amount_cents = excluded.discount_amount_cents,
                shipping_amount_cents = excluded.shipping_amount_cents,
                grand_total_cents = excluded.grand_total_cents,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&cart.session_id)
        .bind(&cart.discount_code)
        .bind(&cart.pending_order_id)
        .bind(totals.net_amount_cents)
        .bind(totals.discount_amount_cents)
        .bind(totals.shipping_amount_cents)
        .bind(totals.grand_total_cents)
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM cart_items WHERE session_id = ?1")
            .bind(&cart.session_id)
            .execute(&mut *tx)
            .await?;

        for item in cart.items.values() {
            sqlx::query(
                r#"
                INSERT INTO cart_items (
                    session_id, cart_id, product_id, variant_id, title,
                    product_image, link, quantity, unit_price_cents,
                    total_item_price_cents, product_subscription, product_comment
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
            )
            .bind(&cart.session_id)
            .bind(&item.cart_id)
            .bind(&item.product_id)
            .bind(&item.variant_id)
            .bind(&item.title)
            .bind(&item.product_image)
            .bind(&item.link)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.total_item_price_cents)
            .bind(&item.product_subscription)
            .bind(&item.product_comment)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Deletes a session's cart; lines cascade. Returns whether a row existed.
    pub async fn delete(&self, session_id: &str) -> DbResult<bool> {
        debug!(session_id = %session_id, "Deleting cart");

        let result = sqlx::query("DELETE FROM carts WHERE session_id = ?1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Total quantity of `cart_id` across every cart except `excluding_session`.
    pub async fn held_quantity(&self, cart_id: &str, excluding_session: &str) -> DbResult<i64> {
        let held: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(quantity), 0)
            FROM cart_items
            WHERE cart_id = ?1 AND session_id <> ?2
            "#,
        )
        .bind(cart_id)
        .bind(excluding_session)
        .fetch_one(&self.pool)
        .await?;

        Ok(held)
    }

    /// Session ids that own a persisted cart.
    pub async fn session_ids(&self) -> DbResult<Vec<String>> {
        let ids = sqlx::query_scalar("SELECT session_id FROM carts ORDER BY session_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    /// Deletes several carts in one transaction. Returns how many existed.
    pub async fn delete_many(&self, session_ids: &[String]) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut deleted = 0;

        for id in session_ids {
            deleted += sqlx::query("DELETE FROM carts WHERE session_id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit().await?;
        debug!(deleted, "Deleted carts");
        Ok(deleted)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use storefront_core::CatalogProduct;

    fn product(id: &str, price_cents: i64) -> CatalogProduct {
        CatalogProduct {
            id: id.to_string(),
            title: id.to_uppercase(),
            price_cents,
            stock: Some(5),
            track_stock: true,
            subscription_id: None,
            image: None,
            permalink: None,
            published: true,
        }
    }

    fn cart(session: &str, lines: &[(&str, i64)]) -> Cart {
        let mut cart = Cart::new(session);
        for (id, qty) in lines {
            cart.add_line(LineItem::from_catalog(&product(id, 1000), None, *qty, None));
        }
        cart
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.carts();

        let mut c = cart("s1", &[("mug", 2), ("tee", 1)]);
        c.discount_code = Some("SAVE10".to_string());
        repo.save(&c, &CartTotals::default()).await.unwrap();

        let loaded = repo.load("s1").await.unwrap().unwrap();
        assert_eq!(loaded.items, c.items);
        assert_eq!(loaded.discount_code.as_deref(), Some("SAVE10"));
        assert!(repo.load("s2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_replaces_lines() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.carts();

        repo.save(&cart("s1", &[("mug", 2), ("tee", 1)]), &CartTotals::default())
            .await
            .unwrap();
        repo.save(&cart("s1", &[("tee", 4)]), &CartTotals::default())
            .await
            .unwrap();

        let loaded = repo.load("s1").await.unwrap().unwrap();
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.quantity_of("tee"), 4);
    }

    #[tokio::test]
    async fn test_held_quantity_excludes_caller() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.carts();

        repo.save(&cart("a", &[("mug", 2)]), &CartTotals::default()).await.unwrap();
        repo.save(&cart("b", &[("mug", 1), ("tee", 3)]), &CartTotals::default())
            .await
            .unwrap();

        assert_eq!(repo.held_quantity("mug", "a").await.unwrap(), 1);
        assert_eq!(repo.held_quantity("mug", "c").await.unwrap(), 3);
        assert_eq!(repo.held_quantity("hat", "a").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_cascades_lines() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.carts();

        repo.save(&cart("a", &[("mug", 2)]), &CartTotals::default()).await.unwrap();
        assert!(repo.delete("a").await.unwrap());
        assert!(!repo.delete("a").await.unwrap());
        assert_eq!(repo.held_quantity("mug", "z").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_many() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.carts();

        for s in ["a", "b", "c"] {
            repo.save(&cart(s, &[("mug", 1)]), &CartTotals::default()).await.unwrap();
        }

        let deleted = repo
            .delete_many(&["a".to_string(), "c".to_string(), "zz".to_string()])
            .await
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(repo.session_ids().await.unwrap(), vec!["b".to_string()]);
    }
}
