use crate::domain::models::reliability::CustomerReliabilityScore;
use crate::domain::ports::ReliabilityRepository;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteReliabilityRepo {
    pool: SqlitePool,
}

impl SqliteReliabilityRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReliabilityRepository for SqliteReliabilityRepo {
    async fn upsert(&self, score: &CustomerReliabilityScore) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO customer_reliability_scores
                 (customer_id, shop_id, score, tier, window_days, settled_count, voided_count,
                  refunded_count, late_cancel_count, voided_90d, no_show_count_90d, computed_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(customer_id, shop_id) DO UPDATE SET
                 score = excluded.score,
                 tier = excluded.tier,
                 window_days = excluded.window_days,
                 settled_count = excluded.settled_count,
                 voided_count = excluded.voided_count,
                 refunded_count = excluded.refunded_count,
                 late_cancel_count = excluded.late_cancel_count,
                 voided_90d = excluded.voided_90d,
                 no_show_count_90d = excluded.no_show_count_90d,
                 computed_at = excluded.computed_at"
        )
            .bind(&score.customer_id).bind(&score.shop_id).bind(score.score).bind(&score.tier)
            .bind(score.window_days).bind(score.settled_count).bind(score.voided_count)
            .bind(score.refunded_count).bind(score.late_cancel_count).bind(score.voided_90d)
            .bind(score.no_show_count_90d).bind(score.computed_at)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn find(&self, customer_id: &str, shop_id: &str) -> Result<Option<CustomerReliabilityScore>, AppError> {
        sqlx::query_as::<_, CustomerReliabilityScore>(
            "SELECT * FROM customer_reliability_scores WHERE customer_id = ? AND shop_id = ?"
        )
            .bind(customer_id)
            .bind(shop_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
