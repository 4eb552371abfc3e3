use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use rand::{distributions::Alphanumeric, Rng};

use crate::domain::models::appointment::Appointment;

pub const OPENING_OPEN: &str = "open";
pub const OPENING_FILLED: &str = "filled";
pub const OPENING_EXPIRED: &str = "expired";

pub const OFFER_SENT: &str = "sent";
pub const OFFER_ACCEPTED: &str = "accepted";
pub const OFFER_EXPIRED: &str = "expired";
pub const OFFER_DECLINED: &str = "declined";

pub const CHANNEL_SMS: &str = "sms";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct SlotOpening {
    pub id: String,
    pub shop_id: String,
    pub source_appointment_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl SlotOpening {
    pub fn from_cancelled_appointment(appointment: &Appointment) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            shop_id: appointment.shop_id.clone(),
            source_appointment_id: appointment.id.clone(),
            start_time: appointment.start_time,
            end_time: appointment.end_time,
            status: OPENING_OPEN.to_string(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct SlotOffer {
    pub id: String,
    pub slot_opening_id: String,
    pub customer_id: String,
    pub channel: String,
    pub status: String,
    pub claim_token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SlotOffer {
    pub fn new(slot_opening_id: String, customer_id: String, expires_at: DateTime<Utc>) -> Self {
        let claim_token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();

        Self {
            id: Uuid::new_v4().to_string(),
            slot_opening_id,
            customer_id,
            channel: CHANNEL_SMS.to_string(),
            status: OFFER_SENT.to_string(),
            claim_token,
            expires_at,
            created_at: Utc::now(),
        }
    }
}
