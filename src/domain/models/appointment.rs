use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const STATUS_BOOKED: &str = "booked";
pub const STATUS_CANCELLED: &str = "cancelled";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_NO_SHOW: &str = "no_show";

pub const PAYMENT_SUCCEEDED: &str = "succeeded";

pub const OUTCOME_SETTLED: &str = "settled";
pub const OUTCOME_VOIDED: &str = "voided";
pub const OUTCOME_REFUNDED: &str = "refunded";

pub const REASON_REFUND_WINDOW: &str = "refund_window";
pub const REASON_LATE_CANCEL: &str = "late_cancel";
pub const REASON_UNPAID: &str = "unpaid";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Appointment {
    pub id: String,
    pub shop_id: String,
    pub customer_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub payment_status: String,
    pub payment_required: bool,
    pub payment_amount_cents: i64,
    pub refunded_amount_cents: i64,
    pub financial_outcome: Option<String>,
    pub resolution_reason: Option<String>,
    pub cancellation_source: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct NewAppointmentParams {
    pub shop_id: String,
    pub customer_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub payment_status: String,
    pub payment_required: bool,
    pub payment_amount_cents: i64,
}

impl Appointment {
    pub fn new(params: NewAppointmentParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            shop_id: params.shop_id,
            customer_id: params.customer_id,
            start_time: params.start,
            end_time: params.end,
            status: STATUS_BOOKED.to_string(),
            payment_status: params.payment_status,
            payment_required: params.payment_required,
            payment_amount_cents: params.payment_amount_cents,
            refunded_amount_cents: 0,
            financial_outcome: None,
            resolution_reason: None,
            cancellation_source: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PAYMENT_SUCCEEDED
    }
}
