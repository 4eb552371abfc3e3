use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Customer {
    pub id: String,
    pub shop_id: String,
    pub name: String,
    pub phone: String,
    pub sms_consent: bool,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(shop_id: String, name: String, phone: String, sms_consent: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            shop_id,
            name,
            phone,
            sms_consent,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Shop {
    pub id: String,
    pub name: String,
    pub timezone: String,
    pub cancellation_cutoff_minutes: i64,
    pub refund_before_cutoff: bool,
    pub created_at: DateTime<Utc>,
}
