//! # In-Memory Collaborators
//!
//! Process-local implementations of [`crate::ports`]. Used by tests and by
//! embedders that keep the catalog in memory.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use storefront_core::{
    Cart, CartResult, CartSnapshot, CartTotals, CatalogProduct, CatalogVariant, Discount,
};

use crate::ports::{CartStore, Catalog, DiscountSource, Ports, SessionStore};

/// All four in-memory collaborators, with handles kept for seeding.
#[derive(Clone)]
pub struct MemoryBackend {
    pub catalog: Arc<MemoryCatalog>,
    pub discounts: Arc<MemoryDiscounts>,
    pub sessions: Arc<MemorySessions>,
    pub carts: Arc<MemoryCarts>,
}

impl MemoryBackend {
    pub fn new(session_ttl: Duration) -> Self {
        MemoryBackend {
            catalog: Arc::new(MemoryCatalog::default()),
            discounts: Arc::new(MemoryDiscounts::default()),
            sessions: Arc::new(MemorySessions::new(session_ttl)),
            carts: Arc::new(MemoryCarts::default()),
        }
    }

    pub fn ports(&self) -> Ports {
        Ports {
            catalog: self.catalog.clone(),
            discounts: self.discounts.clone(),
            sessions: self.sessions.clone(),
            carts: self.carts.clone(),
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryCatalog {
    products: RwLock<HashMap<String, CatalogProduct>>,
    variants: RwLock<HashMap<String, CatalogVariant>>,
}

impl MemoryCatalog {
    pub async fn insert_product(&self, product: CatalogProduct) {
        self.products.write().await.insert(product.id.clone(), product);
    }

    pub async fn insert_variant(&self, variant: CatalogVariant) {
        self.variants.write().await.insert(variant.id.clone(), variant);
    }

    /// Changes a product's stock. Returns false if the product is unknown.
    pub async fn set_stock(&self, product_id: &str, stock: Option<i64>) -> bool {
        match self.products.write().await.get_mut(product_id) {
            Some(product) => {
                product.stock = stock;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn get_product(&self, id: &str) -> CartResult<Option<CatalogProduct>> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn get_variant(&self, variant_id: &str, product_id: &str) -> CartResult<Option<CatalogVariant>> {
        Ok(self
            .variants
            .read()
            .await
            .get(variant_id)
            .filter(|v| v.product_id == product_id)
            .cloned())
    }
}

// =============================================================================
// Discounts
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryDiscounts {
    codes: RwLock<HashMap<String, Discount>>,
}

impl MemoryDiscounts {
    pub async fn insert(&self, discount: Discount) {
        self.codes.write().await.insert(discount.code.clone(), discount);
    }
}

#[async_trait]
impl DiscountSource for MemoryDiscounts {
    async fn get_discount(&self, code: &str) -> CartResult<Option<Discount>> {
        Ok(self.codes.read().await.get(code).cloned())
    }
}

// =============================================================================
// Sessions
// =============================================================================

#[derive(Debug)]
pub struct MemorySessions {
    ttl: Duration,
    entries: RwLock<HashMap<String, (CartSnapshot, Instant)>>,
}

impl MemorySessions {
    pub fn new(ttl: Duration) -> Self {
        MemorySessions {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessions {
    async fn load(&self, session_id: &str) -> CartResult<Option<CartSnapshot>> {
        let now = Instant::now();
        Ok(self
            .entries
            .read()
            .await
            .get(session_id)
            .filter(|(_, expires)| *expires > now)
            .map(|(snapshot, _)| snapshot.clone()))
    }

    async fn save(&self, session_id: &str, snapshot: &CartSnapshot) -> CartResult<()> {
        let expires = Instant::now() + self.ttl;
        self.entries
            .write()
            .await
            .insert(session_id.to_string(), (snapshot.clone(), expires));
        Ok(())
    }

    async fn remove(&self, session_id: &str) -> CartResult<()> {
        self.entries.write().await.remove(session_id);
        Ok(())
    }

    async fn live_session_ids(&self) -> CartResult<Vec<String>> {
        let now = Instant::now();
        let mut ids: Vec<String> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|(_, (_, expires))| *expires > now)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn purge_expired(&self) -> CartResult<u64> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, (_, expires)| *expires > now);
        Ok((before - entries.len()) as u64)
    }
}

// =============================================================================
// Carts
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryCarts {
    carts: RwLock<HashMap<String, Cart>>,
}

#[async_trait]
impl CartStore for MemoryCarts {
    async fn load_cart(&self, session_id: &str) -> CartResult<Option<Cart>> {
        Ok(self.carts.read().await.get(session_id).cloned())
    }

    async fn save_cart(&self, cart: &Cart, _totals: &CartTotals) -> CartResult<()> {
        self.carts
            .write()
            .await
            .insert(cart.session_id.clone(), cart.clone());
        Ok(())
    }

    async fn delete_cart(&self, session_id: &str) -> CartResult<()> {
        self.carts.write().await.remove(session_id);
        Ok(())
    }

    async fn held_quantity(&self, cart_id: &str, excluding_session: &str) -> CartResult<i64> {
        Ok(self
            .carts
            .read()
            .await
            .values()
            .filter(|c| c.session_id != excluding_session)
            .map(|c| c.quantity_of(cart_id))
            .sum())
    }

    async fn stored_session_ids(&self) -> CartResult<Vec<String>> {
        let mut ids: Vec<String> = self.carts.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn delete_carts(&self, session_ids: &[String]) -> CartResult<u64> {
        let mut carts = self.carts.write().await;
        Ok(session_ids
            .iter()
            .filter(|id| carts.remove(id.as_str()).is_some())
            .count() as u64)
    }
}
