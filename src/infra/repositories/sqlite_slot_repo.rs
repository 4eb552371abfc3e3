use crate::domain::models::slot::{SlotOffer, SlotOpening};
use crate::domain::ports::{InsertOutcome, SlotRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct SqliteSlotRepo {
    pool: SqlitePool,
}

impl SqliteSlotRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

#[async_trait]
impl SlotRepository for SqliteSlotRepo {
    async fn create_opening(&self, opening: &SlotOpening) -> Result<InsertOutcome<SlotOpening>, AppError> {
        let result = sqlx::query_as::<_, SlotOpening>(
            "INSERT INTO slot_openings (id, shop_id, source_appointment_id, start_time, end_time, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&opening.id).bind(&opening.shop_id).bind(&opening.source_appointment_id)
            .bind(opening.start_time).bind(opening.end_time).bind(&opening.status)
            .bind(opening.created_at)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(created) => Ok(InsertOutcome::Created(created)),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::AlreadyExists),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    async fn find_opening(&self, id: &str) -> Result<Option<SlotOpening>, AppError> {
        sqlx::query_as::<_, SlotOpening>("SELECT * FROM slot_openings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn transition_opening(&self, id: &str, from: &str, to: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE slot_openings SET status = ? WHERE id = ? AND status = ?")
            .bind(to)
            .bind(id)
            .bind(from)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_offer(&self, offer: &SlotOffer) -> Result<InsertOutcome<SlotOffer>, AppError> {
        let result = sqlx::query_as::<_, SlotOffer>(
            "INSERT INTO slot_offers (id, slot_opening_id, customer_id, channel, status, claim_token, expires_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&offer.id).bind(&offer.slot_opening_id).bind(&offer.customer_id)
            .bind(&offer.channel).bind(&offer.status).bind(&offer.claim_token)
            .bind(offer.expires_at).bind(offer.created_at)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(created) => Ok(InsertOutcome::Created(created)),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::AlreadyExists),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    async fn find_offer(&self, id: &str) -> Result<Option<SlotOffer>, AppError> {
        sqlx::query_as::<_, SlotOffer>("SELECT * FROM slot_offers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_sent_offer_for_opening(&self, opening_id: &str) -> Result<Option<SlotOffer>, AppError> {
        sqlx::query_as::<_, SlotOffer>(
            "SELECT * FROM slot_offers WHERE slot_opening_id = ? AND status = 'sent'"
        )
            .bind(opening_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_due_offers(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<SlotOffer>, AppError> {
        sqlx::query_as::<_, SlotOffer>(
            "SELECT o.* FROM slot_offers o
             JOIN slot_openings p ON p.id = o.slot_opening_id
             WHERE o.status = 'sent' AND o.expires_at <= ? AND p.status = 'open'
             ORDER BY o.expires_at ASC
             LIMIT ?"
        )
            .bind(now)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn transition_offer(&self, id: &str, from: &str, to: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE slot_offers SET status = ? WHERE id = ? AND status = ?")
            .bind(to)
            .bind(id)
            .bind(from)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
