//! # Session Repository
//!
//! Opaque session id → JSON [`CartSnapshot`], with idle expiry.
//!
//! ```text
//! save(id, snapshot, ttl)  ──►  expires_at = now + ttl   (sliding)
//! load(id)                 ──►  None once now >= expires_at
//! purge_expired()          ──►  DELETE WHERE expires_at <= now
//! ```

use std::time::Duration;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use storefront_core::CartSnapshot;

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Repository for shopper sessions.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Loads a live session's snapshot.
    pub async fn load(&self, id: &str) -> DbResult<Option<CartSnapshot>> {
        let payload: Option<String> =
            sqlx::query_scalar("SELECT payload FROM sessions WHERE id = ?1 AND expires_at > ?2")
                .bind(id)
                .bind(now_millis())
                .fetch_optional(&self.pool)
                .await?;

        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Writes a snapshot and pushes the expiry out by `ttl`.
    pub async fn save(&self, id: &str, snapshot: &CartSnapshot, ttl: Duration) -> DbResult<()> {
        let payload = serde_json::to_string(snapshot)?;
        let expires_at = now_millis() + ttl.as_millis() as i64;

        sqlx::query(
            r#"
            INSERT INTO sessions (id, payload, expires_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                payload = excluded.payload,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(id)
        .bind(payload)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn remove(&self, id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Ids of sessions that have not expired.
    pub async fn live_ids(&self) -> DbResult<Vec<String>> {
        let ids = sqlx::query_scalar("SELECT id FROM sessions WHERE expires_at > ?1 ORDER BY id")
            .bind(now_millis())
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    /// Deletes expired sessions. Returns how many were removed.
    pub async fn purge_expired(&self) -> DbResult<u64> {
        let purged = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
            .bind(now_millis())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if purged > 0 {
            debug!(purged, "Purged expired sessions");
        }
        Ok(purged)
    }
}
