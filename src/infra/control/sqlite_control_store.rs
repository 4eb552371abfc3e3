use crate::domain::ports::ControlStore;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::SqlitePool;

// Stale-holder guard: a lock left behind by a crashed run frees itself.
const LOCK_TTL_MINUTES: i64 = 10;

/// Shared expiring-entry store over the control_entries table. Lock keys
/// are acquired with a conditional upsert (fail-fast, no waiting); cooldown
/// keys are last-writer-wins.
pub struct SqliteControlStore {
    pool: SqlitePool,
}

impl SqliteControlStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn lock_key(name: &str) -> String {
    format!("lock:{}", name)
}

fn cooldown_key(customer_id: &str) -> String {
    format!("cooldown:{}", customer_id)
}

#[async_trait]
impl ControlStore for SqliteControlStore {
    async fn try_acquire_lock(&self, name: &str) -> Result<bool, AppError> {
        let now = Utc::now();
        let expires_at = now + Duration::minutes(LOCK_TTL_MINUTES);

        // Succeeds iff the key is absent or its previous holder expired.
        let result = sqlx::query(
            "INSERT INTO control_entries (key, expires_at) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET expires_at = excluded.expires_at
             WHERE control_entries.expires_at <= ?"
        )
            .bind(lock_key(name))
            .bind(expires_at)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn release_lock(&self, name: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM control_entries WHERE key = ?")
            .bind(lock_key(name))
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn is_in_cooldown(&self, customer_id: &str) -> Result<bool, AppError> {
        let row = sqlx::query(
            "SELECT 1 FROM control_entries WHERE key = ? AND expires_at > ?"
        )
            .bind(cooldown_key(customer_id))
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(row.is_some())
    }

    async fn set_cooldown(&self, customer_id: &str, ttl_minutes: i64) -> Result<(), AppError> {
        let expires_at = Utc::now() + Duration::minutes(ttl_minutes);
        sqlx::query(
            "INSERT INTO control_entries (key, expires_at) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET expires_at = excluded.expires_at"
        )
            .bind(cooldown_key(customer_id))
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}
