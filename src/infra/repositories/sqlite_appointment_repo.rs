use crate::domain::models::appointment::{Appointment, STATUS_BOOKED, STATUS_CANCELLED};
use crate::domain::models::reliability::OutcomeCounts;
use crate::domain::ports::{AppointmentRepository, CustomerOutcomeHistory};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{Row, SqlitePool};

pub struct SqliteAppointmentRepo {
    pool: SqlitePool,
}

impl SqliteAppointmentRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AppointmentRepository for SqliteAppointmentRepo {
    async fn create(&self, appointment: &Appointment) -> Result<Appointment, AppError> {
        sqlx::query_as::<_, Appointment>(
            "INSERT INTO appointments (id, shop_id, customer_id, start_time, end_time, status, payment_status, payment_required, payment_amount_cents, refunded_amount_cents, financial_outcome, resolution_reason, cancellation_source, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&appointment.id).bind(&appointment.shop_id).bind(&appointment.customer_id)
            .bind(appointment.start_time).bind(appointment.end_time).bind(&appointment.status)
            .bind(&appointment.payment_status).bind(appointment.payment_required)
            .bind(appointment.payment_amount_cents).bind(appointment.refunded_amount_cents)
            .bind(&appointment.financial_outcome).bind(&appointment.resolution_reason)
            .bind(&appointment.cancellation_source).bind(appointment.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Appointment>, AppError> {
        sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn resolve_cancellation(
        &self,
        id: &str,
        outcome: &str,
        reason: &str,
        source: Option<&str>,
    ) -> Result<Option<Appointment>, AppError> {
        sqlx::query_as::<_, Appointment>(
            "UPDATE appointments
             SET status = ?, financial_outcome = ?, resolution_reason = ?, cancellation_source = ?
             WHERE id = ? AND status = ?
             RETURNING *",
        )
            .bind(STATUS_CANCELLED)
            .bind(outcome)
            .bind(reason)
            .bind(source)
            .bind(id)
            .bind(STATUS_BOOKED)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn aggregate_outcome_history(
        &self,
        shop_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<CustomerOutcomeHistory>, AppError> {
        let d30 = now - Duration::days(30);
        let d90 = now - Duration::days(90);

        let query = r#"
            SELECT customer_id,
                SUM(CASE WHEN start_time > ?1 AND financial_outcome = 'settled' AND COALESCE(resolution_reason, '') != 'late_cancel' THEN 1 ELSE 0 END) AS settled_30,
                SUM(CASE WHEN start_time > ?1 AND (financial_outcome = 'voided' OR status = 'no_show') THEN 1 ELSE 0 END) AS voided_30,
                SUM(CASE WHEN start_time > ?1 AND financial_outcome = 'refunded' THEN 1 ELSE 0 END) AS refunded_30,
                SUM(CASE WHEN start_time > ?1 AND status = 'cancelled' AND resolution_reason = 'late_cancel' THEN 1 ELSE 0 END) AS late_30,
                SUM(CASE WHEN start_time <= ?1 AND start_time > ?2 AND financial_outcome = 'settled' AND COALESCE(resolution_reason, '') != 'late_cancel' THEN 1 ELSE 0 END) AS settled_mid,
                SUM(CASE WHEN start_time <= ?1 AND start_time > ?2 AND (financial_outcome = 'voided' OR status = 'no_show') THEN 1 ELSE 0 END) AS voided_mid,
                SUM(CASE WHEN start_time <= ?1 AND start_time > ?2 AND financial_outcome = 'refunded' THEN 1 ELSE 0 END) AS refunded_mid,
                SUM(CASE WHEN start_time <= ?1 AND start_time > ?2 AND status = 'cancelled' AND resolution_reason = 'late_cancel' THEN 1 ELSE 0 END) AS late_mid,
                SUM(CASE WHEN start_time <= ?2 AND financial_outcome = 'settled' AND COALESCE(resolution_reason, '') != 'late_cancel' THEN 1 ELSE 0 END) AS settled_old,
                SUM(CASE WHEN start_time <= ?2 AND (financial_outcome = 'voided' OR status = 'no_show') THEN 1 ELSE 0 END) AS voided_old,
                SUM(CASE WHEN start_time <= ?2 AND financial_outcome = 'refunded' THEN 1 ELSE 0 END) AS refunded_old,
                SUM(CASE WHEN start_time <= ?2 AND status = 'cancelled' AND resolution_reason = 'late_cancel' THEN 1 ELSE 0 END) AS late_old,
                SUM(CASE WHEN start_time > ?2 AND (financial_outcome = 'voided' OR status = 'no_show') THEN 1 ELSE 0 END) AS voided_90,
                SUM(CASE WHEN start_time > ?2 AND status = 'no_show' THEN 1 ELSE 0 END) AS no_shows_90
            FROM appointments
            WHERE shop_id = ?3 AND start_time <= ?4
              AND (financial_outcome IS NOT NULL OR status = 'no_show')
            GROUP BY customer_id
        "#;

        let rows = sqlx::query(query)
            .bind(d30)
            .bind(d90)
            .bind(shop_id)
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        let counts = |row: &sqlx::sqlite::SqliteRow, suffix: &str| OutcomeCounts {
            settled: row.get::<i64, _>(format!("settled_{}", suffix).as_str()) as u32,
            voided: row.get::<i64, _>(format!("voided_{}", suffix).as_str()) as u32,
            refunded: row.get::<i64, _>(format!("refunded_{}", suffix).as_str()) as u32,
            late_cancels: row.get::<i64, _>(format!("late_{}", suffix).as_str()) as u32,
        };

        Ok(rows
            .iter()
            .map(|row| CustomerOutcomeHistory {
                customer_id: row.get("customer_id"),
                last_30: counts(row, "30"),
                days_31_90: counts(row, "mid"),
                over_90: counts(row, "old"),
                voided_90d: row.get("voided_90"),
                no_shows_90d: row.get("no_shows_90"),
            })
            .collect())
    }
}
