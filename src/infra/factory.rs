use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{ConnectOptions, SqlitePool};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::services::recovery::{RecoveryConfig, SlotRecoveryDeps, SlotRecoveryService};
use crate::infra::control::sqlite_control_store::SqliteControlStore;
use crate::infra::messaging::http_sms_service::HttpSmsService;
use crate::infra::repositories::{
    sqlite_appointment_repo::SqliteAppointmentRepo, sqlite_customer_repo::SqliteCustomerRepo,
    sqlite_reliability_repo::SqliteReliabilityRepo, sqlite_shop_repo::SqliteShopRepo,
    sqlite_slot_repo::SqliteSlotRepo,
};
use crate::infra::trigger::http_offer_step_trigger::HttpOfferStepTrigger;
use crate::state::AppState;

pub async fn bootstrap_state(config: &Config) -> AppState {
    info!("Initializing SQLite connection with WAL Mode...");

    let opts = SqliteConnectOptions::from_str(&config.database_url)
        .expect("Invalid SQLite connection string")
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .expect("Failed to connect to SQLite");

    run_sqlite_migrations(&pool).await;

    let appointment_repo = Arc::new(SqliteAppointmentRepo::new(pool.clone()));
    let shop_repo = Arc::new(SqliteShopRepo::new(pool.clone()));
    let customer_repo = Arc::new(SqliteCustomerRepo::new(pool.clone()));
    let slot_repo = Arc::new(SqliteSlotRepo::new(pool.clone()));
    let reliability_repo = Arc::new(SqliteReliabilityRepo::new(pool.clone()));
    let control = Arc::new(SqliteControlStore::new(pool.clone()));

    let messaging = Arc::new(HttpSmsService::new(
        config.sms_service_url.clone(),
        config.sms_service_token.clone(),
    ));
    let trigger = Arc::new(HttpOfferStepTrigger::new(
        config.offer_step_trigger_url.clone(),
        config.job_shared_secret.clone(),
    ));

    let recovery = Arc::new(SlotRecoveryService::new(
        SlotRecoveryDeps {
            slot_repo: slot_repo.clone(),
            customer_repo: customer_repo.clone(),
            shop_repo: shop_repo.clone(),
            control: control.clone(),
            messaging: messaging.clone(),
            trigger: trigger.clone(),
        },
        RecoveryConfig {
            offer_window_minutes: config.offer_window_minutes,
            contact_cooldown_minutes: config.contact_cooldown_minutes,
            sweep_batch_size: config.sweep_batch_size,
            claim_base_url: config.claim_base_url.clone(),
        },
    ));

    AppState {
        config: config.clone(),
        appointment_repo,
        shop_repo,
        customer_repo,
        slot_repo,
        reliability_repo,
        control,
        messaging,
        trigger,
        recovery,
    }
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
