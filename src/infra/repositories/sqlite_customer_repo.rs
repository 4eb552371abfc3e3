use crate::domain::models::customer::Customer;
use crate::domain::ports::{CustomerRepository, OfferCandidate};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

pub struct SqliteCustomerRepo {
    pool: SqlitePool,
}

impl SqliteCustomerRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for SqliteCustomerRepo {
    async fn create(&self, customer: &Customer) -> Result<Customer, AppError> {
        sqlx::query_as::<_, Customer>(
            "INSERT INTO customers (id, shop_id, name, phone, sms_consent, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&customer.id).bind(&customer.shop_id).bind(&customer.name)
            .bind(&customer.phone).bind(customer.sms_consent).bind(customer.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Customer>, AppError> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_offer_candidates(
        &self,
        shop_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<OfferCandidate>, AppError> {
        let rows = sqlx::query(
            "SELECT c.id AS customer_id, c.phone, s.tier, s.score,
                    COALESCE(s.no_show_count_90d, 0) AS no_shows_90d
             FROM customers c
             LEFT JOIN customer_reliability_scores s
               ON s.customer_id = c.id AND s.shop_id = c.shop_id
             WHERE c.shop_id = ? AND c.sms_consent = 1
               AND NOT EXISTS (
                   SELECT 1 FROM appointments a
                   WHERE a.customer_id = c.id
                     AND a.status = 'booked'
                     AND a.start_time < ? AND a.end_time > ?
               )"
        )
            .bind(shop_id)
            .bind(end)
            .bind(start)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(rows
            .iter()
            .map(|row| OfferCandidate {
                customer_id: row.get("customer_id"),
                phone: row.get("phone"),
                tier: row.get("tier"),
                score: row.get("score"),
                no_shows_90d: row.get("no_shows_90d"),
            })
            .collect())
    }
}
