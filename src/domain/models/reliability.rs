use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Top,
    Neutral,
    Risk,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Top => "top",
            Tier::Neutral => "neutral",
            Tier::Risk => "risk",
        }
    }

    pub fn parse(value: &str) -> Option<Tier> {
        match value {
            "top" => Some(Tier::Top),
            "neutral" => Some(Tier::Neutral),
            "risk" => Some(Tier::Risk),
            _ => None,
        }
    }

    // Offer ordering: top customers are contacted first, risk last.
    pub fn priority(&self) -> u8 {
        match self {
            Tier::Top => 0,
            Tier::Neutral => 1,
            Tier::Risk => 2,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub settled: u32,
    pub voided: u32,
    pub refunded: u32,
    pub late_cancels: u32,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ScoreInput {
    pub last_30: OutcomeCounts,
    pub days_31_90: OutcomeCounts,
    pub over_90: OutcomeCounts,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct CustomerReliabilityScore {
    pub customer_id: String,
    pub shop_id: String,
    pub score: i64,
    pub tier: String,
    pub window_days: i64,
    pub settled_count: i64,
    pub voided_count: i64,
    pub refunded_count: i64,
    pub late_cancel_count: i64,
    pub voided_90d: i64,
    pub no_show_count_90d: i64,
    pub computed_at: DateTime<Utc>,
}
