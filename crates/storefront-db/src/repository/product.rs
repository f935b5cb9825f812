//! # Product Repository
//!
//! Read access to the catalog for the cart, plus the writes the seed binary
//! and tests need.
//!
//! ## Lookup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_item(product_id, variant_id?)                                     │
//! │       │                                                                 │
//! │       ├──► get_product(product_id) ──► products row                    │
//! │       │                                                                 │
//! │       └──► get_variant(variant_id, product_id) ──► product_variants row│
//! │                 (must belong to that product)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use storefront_core::validation::validate_price_cents;
use storefront_core::{CatalogProduct, CatalogVariant};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    title: String,
    price_cents: i64,
    stock: Option<i64>,
    track_stock: bool,
    subscription_id: Option<String>,
    image: Option<String>,
    permalink: Option<String>,
    published: bool,
}

impl From<ProductRow> for CatalogProduct {
    fn from(row: ProductRow) -> Self {
        CatalogProduct {
            id: row.id,
            title: row.title,
            price_cents: row.price_cents,
            stock: row.stock,
            track_stock: row.track_stock,
            subscription_id: row.subscription_id,
            image: row.image,
            permalink: row.permalink,
            published: row.published,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct VariantRow {
    id: String,
    product_id: String,
    title: String,
    price_cents: i64,
    stock: Option<i64>,
}

impl From<VariantRow> for CatalogVariant {
    fn from(row: VariantRow) -> Self {
        CatalogVariant {
            id: row.id,
            product_id: row.product_id,
            title: row.title,
            price_cents: row.price_cents,
            stock: row.stock,
        }
    }
}

/// Repository for catalog reads and writes.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(CatalogProduct))` - Product found (published or not)
    /// * `Ok(None)` - Product not found
    pub async fn get_product(&self, id: &str) -> DbResult<Option<CatalogProduct>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, title, price_cents, stock, track_stock,
                   subscription_id, image, permalink, published
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CatalogProduct::from))
    }

    /// Gets a variant, scoped to its product.
    pub async fn get_variant(
        &self,
        variant_id: &str,
        product_id: &str,
    ) -> DbResult<Option<CatalogVariant>> {
        let row = sqlx::query_as::<_, VariantRow>(
            r#"
            SELECT id, product_id, title, price_cents, stock
            FROM product_variants
            WHERE id = ?1 AND product_id = ?2
            "#,
        )
        .bind(variant_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CatalogVariant::from))
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - id already exists
    /// * `Err(DbError::Invalid)` - negative price
    pub async fn insert(&self, product: &CatalogProduct) -> DbResult<()> {
        validate_price_cents(product.price_cents)?;
        debug!(id = %product.id, "Inserting product");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO products (
                id, title, price_cents, stock, track_stock,
                subscription_id, image, permalink, published,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.title)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.track_stock)
        .bind(&product.subscription_id)
        .bind(&product.image)
        .bind(&product.permalink)
        .bind(product.published)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a variant for an existing product.
    pub async fn insert_variant(&self, variant: &CatalogVariant) -> DbResult<()> {
        validate_price_cents(variant.price_cents)?;
        debug!(id = %variant.id, product_id = %variant.product_id, "Inserting variant");

        sqlx::query(
            r#"
            INSERT INTO product_variants (id, product_id, title, price_cents, stock)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&variant.id)
        .bind(&variant.product_id)
        .bind(&variant.title)
        .bind(variant.price_cents)
        .bind(variant.stock)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Sets a product's stock level (`None` = unlimited).
    pub async fn set_stock(&self, id: &str, stock: Option<i64>) -> DbResult<()> {
        debug!(id = %id, stock = ?stock, "Updating product stock");

        let result = sqlx::query("UPDATE products SET stock = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(stock)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn product(id: &str) -> CatalogProduct {
        CatalogProduct {
            id: id.to_string(),
            title: "Enamel Mug".to_string(),
            price_cents: 1450,
            stock: Some(12),
            track_stock: true,
            subscription_id: None,
            image: Some("/uploads/mug.jpg".to_string()),
            permalink: Some("/product/enamel-mug".to_string()),
            published: true,
        }
    }

    #[tokio::test]
    async fn test_negative_price_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let broken = CatalogProduct {
            price_cents: -1,
            ..product("mug")
        };
        assert!(matches!(repo.insert(&broken).await, Err(DbError::Invalid(_))));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insert_and_get_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&product("mug")).await.unwrap();

        let fetched = repo.get_product("mug").await.unwrap().unwrap();
        assert_eq!(fetched, product("mug"));
        assert!(repo.get_product("nope").await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_product_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&product("mug")).await.unwrap();
        let err = repo.insert(&product("mug")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_variant_scoped_to_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        repo.insert(&product("mug")).await.unwrap();
        repo.insert(&product("cup")).await.unwrap();

        let variant = CatalogVariant {
            id: "mug-blue".to_string(),
            product_id: "mug".to_string(),
            title: "Blue".to_string(),
            price_cents: 1550,
            stock: None,
        };
        repo.insert_variant(&variant).await.unwrap();

        assert_eq!(repo.get_variant("mug-blue", "mug").await.unwrap(), Some(variant));
        assert!(repo.get_variant("mug-blue", "cup").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        repo.insert(&product("mug")).await.unwrap();

        repo.set_stock("mug", None).await.unwrap();
        assert_eq!(repo.get_product("mug").await.unwrap().unwrap().stock, None);

        let err = repo.set_stock("nope", Some(1)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
