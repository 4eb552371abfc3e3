use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Shared secret for scheduler-invoked job endpoints. Kept as Option so
    /// a misconfigured deployment fails the job invocation, not the boot.
    pub job_shared_secret: Option<String>,
    pub sms_service_url: String,
    pub sms_service_token: String,
    /// Base URL of the offer-step endpoint; absent means trigger calls are
    /// recorded as per-item errors and the sweep remains the only backstop.
    pub offer_step_trigger_url: Option<String>,
    pub claim_base_url: String,
    pub offer_window_minutes: i64,
    pub contact_cooldown_minutes: i64,
    pub sweep_batch_size: i64,
    pub score_window_days: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            job_shared_secret: env::var("JOB_SHARED_SECRET").ok(),
            sms_service_url: env::var("SMS_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/sms".to_string()),
            sms_service_token: env::var("SMS_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            offer_step_trigger_url: env::var("OFFER_STEP_TRIGGER_URL").ok(),
            claim_base_url: env::var("CLAIM_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            offer_window_minutes: parse_i64("OFFER_WINDOW_MINUTES", 30),
            contact_cooldown_minutes: parse_i64("CONTACT_COOLDOWN_MINUTES", 1440),
            sweep_batch_size: parse_i64("SWEEP_BATCH_SIZE", 50),
            score_window_days: parse_i64("SCORE_WINDOW_DAYS", 90),
        }
    }
}

fn parse_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
