//! # Discount Repository
//!
//! Discount codes keyed by exact, case-sensitive code.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use storefront_core::discount::validate_discount;
use storefront_core::{Discount, DiscountKind};

#[derive(Debug, sqlx::FromRow)]
struct DiscountRow {
    code: String,
    kind: DiscountKind,
    value: i64,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
}

impl From<DiscountRow> for Discount {
    fn from(row: DiscountRow) -> Self {
        Discount {
            code: row.code,
            kind: row.kind,
            value: row.value,
            start: row.starts_at,
            end: row.ends_at,
        }
    }
}

/// Repository for discount codes.
#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    /// Looks up a code. SQLite's `=` on TEXT is case-sensitive by default.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Discount>> {
        let row = sqlx::query_as::<_, DiscountRow>(
            "SELECT code, kind, value, starts_at, ends_at FROM discounts WHERE code = ?1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Discount::from))
    }

    /// Inserts or replaces a discount.
    ///
    /// ## Returns
    /// * `Err(DbError::Invalid)` - bad code, value or window; nothing written
    pub async fn upsert(&self, discount: &Discount) -> DbResult<()> {
        validate_discount(discount)?;
        debug!(code = %discount.code, kind = ?discount.kind, "Saving discount");

        sqlx::query(
            r#"
            INSERT INTO discounts (code, kind, value, starts_at, ends_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(code) DO UPDATE SET
                kind = excluded.kind,
                value = excluded.value,
                starts_at = excluded.starts_at,
                ends_at = excluded.ends_at
            "#,
        )
        .bind(&discount.code)
        .bind(discount.kind)
        .bind(discount.value)
        .bind(discount.start)
        .bind(discount.end)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete(&self, code: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM discounts WHERE code = ?1")
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, DbError};
    use chrono::Duration;

    fn discount(code: &str, kind: DiscountKind, value: i64) -> Discount {
        let now = Utc::now();
        Discount {
            code: code.to_string(),
            kind,
            value,
            start: now - Duration::days(1),
            end: now + Duration::days(7),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.discounts();

        repo.upsert(&discount("SAVE20", DiscountKind::Percent, 2000)).await.unwrap();

        let found = repo.get_by_code("SAVE20").await.unwrap().unwrap();
        assert_eq!(found.kind, DiscountKind::Percent);
        assert_eq!(found.value, 2000);

        repo.upsert(&discount("SAVE20", DiscountKind::Amount, 500)).await.unwrap();
        let found = repo.get_by_code("SAVE20").await.unwrap().unwrap();
        assert_eq!(found.kind, DiscountKind::Amount);
    }

    #[tokio::test]
    async fn test_upsert_rejects_invalid_discount() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.discounts();

        let err = repo
            .upsert(&discount("HALFOFF", DiscountKind::Percent, 10_001))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Invalid(_)));

        let mut backwards = discount("LATE", DiscountKind::Amount, 500);
        std::mem::swap(&mut backwards.start, &mut backwards.end);
        assert!(repo.upsert(&backwards).await.is_err());

        assert!(repo.get_by_code("HALFOFF").await.unwrap().is_none());
        assert!(repo.get_by_code("LATE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lookup_is_case_sensitive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.discounts();
        repo.upsert(&discount("SAVE20", DiscountKind::Percent, 2000)).await.unwrap();

        assert!(repo.get_by_code("save20").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.discounts();
        repo.upsert(&discount("TEN", DiscountKind::Amount, 1000)).await.unwrap();

        assert!(repo.delete("TEN").await.unwrap());
        assert!(!repo.delete("TEN").await.unwrap());
    }
}
