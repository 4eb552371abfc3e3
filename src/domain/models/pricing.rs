use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Deposit,
    FullPrepay,
    None,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Deposit => "deposit",
            PaymentMode::FullPrepay => "full_prepay",
            PaymentMode::None => "none",
        }
    }

    pub fn parse(value: &str) -> Option<PaymentMode> {
        match value {
            "deposit" => Some(PaymentMode::Deposit),
            "full_prepay" => Some(PaymentMode::FullPrepay),
            "none" => Some(PaymentMode::None),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct ShopPricingPolicy {
    pub shop_id: String,
    pub payment_mode: String,
    pub deposit_amount_cents: i64,
    pub risk_payment_mode: Option<String>,
    pub risk_deposit_amount_cents: Option<i64>,
    pub top_deposit_waived: bool,
    pub top_deposit_amount_cents: Option<i64>,
    pub exclude_risk_tier: bool,
    pub exclude_high_no_show_risk: bool,
    pub created_at: DateTime<Utc>,
}

impl ShopPricingPolicy {
    pub fn base(&self) -> BasePricing {
        BasePricing {
            payment_mode: PaymentMode::parse(&self.payment_mode).unwrap_or(PaymentMode::None),
            deposit_amount_cents: self.deposit_amount_cents,
        }
    }

    pub fn tier_overrides(&self) -> TierOverrides {
        TierOverrides {
            risk_payment_mode: self.risk_payment_mode.as_deref().and_then(PaymentMode::parse),
            risk_deposit_amount_cents: self.risk_deposit_amount_cents,
            top_deposit_waived: self.top_deposit_waived,
            top_deposit_amount_cents: self.top_deposit_amount_cents,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BasePricing {
    pub payment_mode: PaymentMode,
    pub deposit_amount_cents: i64,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TierOverrides {
    pub risk_payment_mode: Option<PaymentMode>,
    pub risk_deposit_amount_cents: Option<i64>,
    pub top_deposit_waived: bool,
    pub top_deposit_amount_cents: Option<i64>,
}
