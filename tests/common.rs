use rebook_backend::{
    api::router::create_router,
    config::Config,
    domain::models::appointment::{Appointment, NewAppointmentParams},
    domain::models::customer::Customer,
    domain::ports::{
        AppointmentRepository, CustomerRepository, MessagingService, OfferStepTrigger,
    },
    domain::services::recovery::{RecoveryConfig, SlotRecoveryDeps, SlotRecoveryService},
    error::AppError,
    infra::control::sqlite_control_store::SqliteControlStore,
    infra::repositories::{
        sqlite_appointment_repo::SqliteAppointmentRepo,
        sqlite_customer_repo::SqliteCustomerRepo,
        sqlite_reliability_repo::SqliteReliabilityRepo,
        sqlite_shop_repo::SqliteShopRepo,
        sqlite_slot_repo::SqliteSlotRepo,
    },
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JOB_SECRET: &str = "test-job-secret";

pub struct MockSmsService {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: AtomicBool,
}

impl MockSmsService {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl MessagingService for MockSmsService {
    async fn send(&self, to: &str, body: &str) -> Result<String, AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::InternalWithMsg("mock transport failure".into()));
        }
        self.sent.lock().unwrap().push((to.to_string(), body.to_string()));
        Ok(format!("mock-msg-{}", Uuid::new_v4()))
    }
}

pub struct MockOfferStepTrigger {
    pub triggered: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

impl MockOfferStepTrigger {
    pub fn new() -> Self {
        Self {
            triggered: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl OfferStepTrigger for MockOfferStepTrigger {
    async fn trigger(&self, slot_opening_id: &str) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::InternalWithMsg("mock trigger failure".into()));
        }
        self.triggered.lock().unwrap().push(slot_opening_id.to_string());
        Ok(())
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub sms: Arc<MockSmsService>,
    pub trigger: Arc<MockOfferStepTrigger>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        Self::with_secret(Some(TEST_JOB_SECRET)).await
    }

    pub async fn with_secret(secret: Option<&str>) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            job_shared_secret: secret.map(|s| s.to_string()),
            sms_service_url: "http://localhost".to_string(),
            sms_service_token: "token".to_string(),
            offer_step_trigger_url: None,
            claim_base_url: "http://localhost:3000".to_string(),
            offer_window_minutes: 30,
            contact_cooldown_minutes: 1440,
            sweep_batch_size: 50,
            score_window_days: 90,
        };

        let appointment_repo = Arc::new(SqliteAppointmentRepo::new(pool.clone()));
        let shop_repo = Arc::new(SqliteShopRepo::new(pool.clone()));
        let customer_repo = Arc::new(SqliteCustomerRepo::new(pool.clone()));
        let slot_repo = Arc::new(SqliteSlotRepo::new(pool.clone()));
        let reliability_repo = Arc::new(SqliteReliabilityRepo::new(pool.clone()));
        let control = Arc::new(SqliteControlStore::new(pool.clone()));
        let sms = Arc::new(MockSmsService::new());
        let trigger = Arc::new(MockOfferStepTrigger::new());

        let recovery = Arc::new(SlotRecoveryService::new(
            SlotRecoveryDeps {
                slot_repo: slot_repo.clone(),
                customer_repo: customer_repo.clone(),
                shop_repo: shop_repo.clone(),
                control: control.clone(),
                messaging: sms.clone(),
                trigger: trigger.clone(),
            },
            RecoveryConfig {
                offer_window_minutes: config.offer_window_minutes,
                contact_cooldown_minutes: config.contact_cooldown_minutes,
                sweep_batch_size: config.sweep_batch_size,
                claim_base_url: config.claim_base_url.clone(),
            },
        ));

        let state = Arc::new(AppState {
            config: config.clone(),
            appointment_repo,
            shop_repo,
            customer_repo,
            slot_repo,
            reliability_repo,
            control,
            messaging: sms.clone(),
            trigger: trigger.clone(),
            recovery,
        });

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            sms,
            trigger,
        }
    }

    pub async fn seed_shop(&self, id: &str, timezone: &str, cutoff_minutes: i64, refund_before_cutoff: bool) {
        sqlx::query(
            "INSERT INTO shops (id, name, timezone, cancellation_cutoff_minutes, refund_before_cutoff, created_at)
             VALUES (?, ?, ?, ?, ?, ?)"
        )
            .bind(id).bind(format!("Shop {}", id)).bind(timezone)
            .bind(cutoff_minutes).bind(refund_before_cutoff).bind(Utc::now())
            .execute(&self.pool).await.unwrap();
    }

    pub async fn seed_policy(&self, shop_id: &str, seed: PolicySeed) {
        sqlx::query(
            "INSERT INTO shop_pricing_policies
                 (shop_id, payment_mode, deposit_amount_cents, risk_payment_mode,
                  risk_deposit_amount_cents, top_deposit_waived, top_deposit_amount_cents,
                  exclude_risk_tier, exclude_high_no_show_risk, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
            .bind(shop_id).bind(seed.payment_mode).bind(seed.deposit_amount_cents)
            .bind(seed.risk_payment_mode).bind(seed.risk_deposit_amount_cents)
            .bind(seed.top_deposit_waived).bind(seed.top_deposit_amount_cents)
            .bind(seed.exclude_risk_tier).bind(seed.exclude_high_no_show_risk)
            .bind(Utc::now())
            .execute(&self.pool).await.unwrap();
    }

    pub async fn seed_customer(&self, id: &str, shop_id: &str, phone: &str, sms_consent: bool) {
        let mut customer = Customer::new(
            shop_id.to_string(),
            format!("Customer {}", id),
            phone.to_string(),
            sms_consent,
        );
        customer.id = id.to_string();
        self.state.customer_repo.create(&customer).await.unwrap();
    }

    pub async fn seed_booked_appointment(
        &self,
        id: &str,
        shop_id: &str,
        customer_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        payment_status: &str,
    ) {
        let mut appointment = Appointment::new(NewAppointmentParams {
            shop_id: shop_id.to_string(),
            customer_id: customer_id.to_string(),
            start,
            end,
            payment_status: payment_status.to_string(),
            payment_required: true,
            payment_amount_cents: 2000,
        });
        appointment.id = id.to_string();
        self.state.appointment_repo.create(&appointment).await.unwrap();
    }

    pub async fn seed_resolved_appointment(
        &self,
        id: &str,
        shop_id: &str,
        customer_id: &str,
        start: DateTime<Utc>,
        status: &str,
        outcome: Option<&str>,
        reason: Option<&str>,
    ) {
        let mut appointment = Appointment::new(NewAppointmentParams {
            shop_id: shop_id.to_string(),
            customer_id: customer_id.to_string(),
            start,
            end: start + chrono::Duration::minutes(60),
            payment_status: "succeeded".to_string(),
            payment_required: true,
            payment_amount_cents: 2000,
        });
        appointment.id = id.to_string();
        appointment.status = status.to_string();
        appointment.financial_outcome = outcome.map(|s| s.to_string());
        appointment.resolution_reason = reason.map(|s| s.to_string());
        self.state.appointment_repo.create(&appointment).await.unwrap();
    }

    pub async fn seed_opening(
        &self,
        id: &str,
        shop_id: &str,
        source_appointment_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        status: &str,
    ) {
        sqlx::query(
            "INSERT INTO slot_openings (id, shop_id, source_appointment_id, start_time, end_time, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)"
        )
            .bind(id).bind(shop_id).bind(source_appointment_id)
            .bind(start).bind(end).bind(status).bind(Utc::now())
            .execute(&self.pool).await.unwrap();
    }

    pub async fn seed_offer(
        &self,
        id: &str,
        slot_opening_id: &str,
        customer_id: &str,
        status: &str,
        expires_at: DateTime<Utc>,
    ) {
        sqlx::query(
            "INSERT INTO slot_offers (id, slot_opening_id, customer_id, channel, status, claim_token, expires_at, created_at)
             VALUES (?, ?, ?, 'sms', ?, ?, ?, ?)"
        )
            .bind(id).bind(slot_opening_id).bind(customer_id).bind(status)
            .bind(format!("token-{}", id)).bind(expires_at).bind(Utc::now())
            .execute(&self.pool).await.unwrap();
    }

    pub async fn seed_score(
        &self,
        customer_id: &str,
        shop_id: &str,
        score: i64,
        tier: &str,
        voided_90d: i64,
        no_shows_90d: i64,
    ) {
        sqlx::query(
            "INSERT INTO customer_reliability_scores
                 (customer_id, shop_id, score, tier, window_days, voided_90d, no_show_count_90d, computed_at)
             VALUES (?, ?, ?, ?, 90, ?, ?, ?)"
        )
            .bind(customer_id).bind(shop_id).bind(score).bind(tier)
            .bind(voided_90d).bind(no_shows_90d).bind(Utc::now())
            .execute(&self.pool).await.unwrap();
    }

    pub async fn post_job(&self, uri: &str) -> (StatusCode, Value) {
        self.post_job_with_secret(uri, Some(TEST_JOB_SECRET)).await
    }

    pub async fn post_job_with_secret(&self, uri: &str, secret: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(secret) = secret {
            builder = builder.header("X-Job-Secret", secret);
        }

        let response = self.router.clone().oneshot(
            builder.body(Body::empty()).unwrap()
        ).await.unwrap();

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap()
        };
        (status, body)
    }

    pub async fn post_json(&self, uri: &str, payload: Value) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap()
        ).await.unwrap();

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body_bytes).unwrap();
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(
            Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
        ).await.unwrap();

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body_bytes).unwrap();
        (status, body)
    }

    pub async fn offer_status(&self, offer_id: &str) -> String {
        sqlx::query_scalar("SELECT status FROM slot_offers WHERE id = ?")
            .bind(offer_id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn opening_status(&self, opening_id: &str) -> String {
        sqlx::query_scalar("SELECT status FROM slot_openings WHERE id = ?")
            .bind(opening_id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn count_offers(&self, opening_id: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM slot_offers WHERE slot_opening_id = ?")
            .bind(opening_id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn count_openings(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM slot_openings")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

#[allow(dead_code)]
pub struct PolicySeed {
    pub payment_mode: String,
    pub deposit_amount_cents: i64,
    pub risk_payment_mode: Option<String>,
    pub risk_deposit_amount_cents: Option<i64>,
    pub top_deposit_waived: bool,
    pub top_deposit_amount_cents: Option<i64>,
    pub exclude_risk_tier: bool,
    pub exclude_high_no_show_risk: bool,
}

impl Default for PolicySeed {
    fn default() -> Self {
        Self {
            payment_mode: "deposit".to_string(),
            deposit_amount_cents: 2000,
            risk_payment_mode: None,
            risk_deposit_amount_cents: None,
            top_deposit_waived: false,
            top_deposit_amount_cents: None,
            exclude_risk_tier: false,
            exclude_high_no_show_risk: false,
        }
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
    }
}
