//! # SQLite Adapters
//!
//! [`crate::ports`] implemented over the `storefront-db` repositories.
//! Every [`storefront_db::DbError`] becomes `CartError::Transient` through
//! its `From` impl.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use storefront_core::{
    Cart, CartResult, CartSnapshot, CartTotals, CatalogProduct, CatalogVariant, Discount,
};
use storefront_db::Database;

use crate::ports::{CartStore, Catalog, DiscountSource, Ports, SessionStore};

/// Builds all four ports on one database.
pub fn ports(db: Database, session_ttl: Duration) -> Ports {
    Ports {
        catalog: Arc::new(SqliteCatalog::new(db.clone())),
        discounts: Arc::new(SqliteDiscounts::new(db.clone())),
        sessions: Arc::new(SqliteSessions::new(db.clone(), session_ttl)),
        carts: Arc::new(SqliteCarts::new(db)),
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    db: Database,
}

impl SqliteCatalog {
    pub fn new(db: Database) -> Self {
        SqliteCatalog { db }
    }
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn get_product(&self, id: &str) -> CartResult<Option<CatalogProduct>> {
        Ok(self.db.products().get_product(id).await?)
    }

    async fn get_variant(&self, variant_id: &str, product_id: &str) -> CartResult<Option<CatalogVariant>> {
        Ok(self.db.products().get_variant(variant_id, product_id).await?)
    }
}

// =============================================================================
// Discounts
// =============================================================================

#[derive(Debug, Clone)]
pub struct SqliteDiscounts {
    db: Database,
}

impl SqliteDiscounts {
    pub fn new(db: Database) -> Self {
        SqliteDiscounts { db }
    }
}

#[async_trait]
impl DiscountSource for SqliteDiscounts {
    async fn get_discount(&self, code: &str) -> CartResult<Option<Discount>> {
        Ok(self.db.discounts().get_by_code(code).await?)
    }
}

// =============================================================================
// Sessions
// =============================================================================

#[derive(Debug, Clone)]
pub struct SqliteSessions {
    db: Database,
    ttl: Duration,
}

impl SqliteSessions {
    pub fn new(db: Database, ttl: Duration) -> Self {
        SqliteSessions { db, ttl }
    }
}

#[async_trait]
impl SessionStore for SqliteSessions {
    async fn load(&self, session_id: &str) -> CartResult<Option<CartSnapshot>> {
        Ok(self.db.sessions().load(session_id).await?)
    }

    async fn save(&self, session_id: &str, snapshot: &CartSnapshot) -> CartResult<()> {
        Ok(self.db.sessions().save(session_id, snapshot, self.ttl).await?)
    }

    async fn remove(&self, session_id: &str) -> CartResult<()> {
        Ok(self.db.sessions().remove(session_id).await?)
    }

    async fn live_session_ids(&self) -> CartResult<Vec<String>> {
        Ok(self.db.sessions().live_ids().await?)
    }

    async fn purge_expired(&self) -> CartResult<u64> {
        Ok(self.db.sessions().purge_expired().await?)
    }
}

// =============================================================================
// Carts
// =============================================================================

#[derive(Debug, Clone)]
pub struct SqliteCarts {
    db: Database,
}

impl SqliteCarts {
    pub fn new(db: Database) -> Self {
        SqliteCarts { db }
    }
}

#[async_trait]
impl CartStore for SqliteCarts {
    async fn load_cart(&self, session_id: &str) -> CartResult<Option<Cart>> {
        Ok(self.db.carts().load(session_id).await?)
    }

    async fn save_cart(&self, cart: &Cart, totals: &CartTotals) -> CartResult<()> {
        Ok(self.db.carts().save(cart, totals).await?)
    }

    async fn delete_cart(&self, session_id: &str) -> CartResult<()> {
        self.db.carts().delete(session_id).await?;
        Ok(())
    }

    async fn held_quantity(&self, cart_id: &str, excluding_session: &str) -> CartResult<i64> {
        Ok(self.db.carts().held_quantity(cart_id, excluding_session).await?)
    }

    async fn stored_session_ids(&self) -> CartResult<Vec<String>> {
        Ok(self.db.carts().session_ids().await?)
    }

    async fn delete_carts(&self, session_ids: &[String]) -> CartResult<u64> {
        Ok(self.db.carts().delete_many(session_ids).await?)
    }
}
