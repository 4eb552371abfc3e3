use serde::Serialize;

use crate::domain::models::pricing::{BasePricing, PaymentMode, TierOverrides};
use crate::domain::models::reliability::Tier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppliedTier {
    Top,
    Neutral,
    /// No stored score for the customer; neutral semantics applied.
    NeutralDefault,
    Risk,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedPricing {
    pub payment_mode: PaymentMode,
    pub deposit_amount_cents: i64,
    pub applied_tier: AppliedTier,
    pub tier_override_applied: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentRequirement {
    pub payment_required: bool,
    pub amount_cents: i64,
}

pub fn resolve_tier_pricing(
    tier: Option<Tier>,
    base: &BasePricing,
    overrides: &TierOverrides,
) -> ResolvedPricing {
    let applied_tier = match tier {
        Some(Tier::Top) => AppliedTier::Top,
        Some(Tier::Neutral) => AppliedTier::Neutral,
        Some(Tier::Risk) => AppliedTier::Risk,
        None => AppliedTier::NeutralDefault,
    };

    match tier {
        Some(Tier::Risk) => {
            if let Some(amount) = overrides.risk_deposit_amount_cents {
                ResolvedPricing {
                    payment_mode: overrides.risk_payment_mode.unwrap_or(base.payment_mode),
                    deposit_amount_cents: amount,
                    applied_tier,
                    tier_override_applied: true,
                }
            } else {
                ResolvedPricing {
                    payment_mode: base.payment_mode,
                    deposit_amount_cents: base.deposit_amount_cents,
                    applied_tier,
                    tier_override_applied: false,
                }
            }
        }
        Some(Tier::Top) => {
            if overrides.top_deposit_waived {
                // Waiver wins over any configured top amount.
                ResolvedPricing {
                    payment_mode: base.payment_mode,
                    deposit_amount_cents: 0,
                    applied_tier,
                    tier_override_applied: true,
                }
            } else if let Some(amount) = overrides.top_deposit_amount_cents {
                ResolvedPricing {
                    payment_mode: base.payment_mode,
                    deposit_amount_cents: amount,
                    applied_tier,
                    tier_override_applied: true,
                }
            } else {
                ResolvedPricing {
                    payment_mode: base.payment_mode,
                    deposit_amount_cents: base.deposit_amount_cents,
                    applied_tier,
                    tier_override_applied: false,
                }
            }
        }
        Some(Tier::Neutral) | None => ResolvedPricing {
            payment_mode: base.payment_mode,
            deposit_amount_cents: base.deposit_amount_cents,
            applied_tier,
            tier_override_applied: false,
        },
    }
}

/// A negative configured amount is a misconfiguration, never a charge.
pub fn derive_payment_requirement(mode: PaymentMode, amount_cents: i64) -> PaymentRequirement {
    let amount_cents = amount_cents.max(0);
    PaymentRequirement {
        payment_required: mode != PaymentMode::None && amount_cents > 0,
        amount_cents,
    }
}
