use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::domain::models::appointment::{
    OUTCOME_REFUNDED, OUTCOME_SETTLED, OUTCOME_VOIDED, PAYMENT_SUCCEEDED, REASON_LATE_CANCEL,
    REASON_REFUND_WINDOW, REASON_UNPAID, STATUS_BOOKED,
};

pub struct CancellationPolicyInput<'a> {
    pub appointment_start: DateTime<Utc>,
    pub cutoff_minutes: i64,
    /// Display only; all comparisons are on absolute instants.
    pub shop_timezone: &'a str,
    pub payment_status: &'a str,
    pub appointment_status: &'a str,
    pub refund_before_cutoff: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancellationEligibility {
    pub refund_eligible: bool,
    /// Signed; negative once the cutoff has passed.
    pub time_until_cutoff_minutes: i64,
    pub cutoff_display: String,
}

pub fn resolve_cancellation_eligibility(
    input: &CancellationPolicyInput,
    now: DateTime<Utc>,
) -> CancellationEligibility {
    let cutoff = input.appointment_start - Duration::minutes(input.cutoff_minutes);
    let time_until_cutoff = cutoff - now;

    let refund_eligible = input.refund_before_cutoff
        && now < cutoff
        && input.payment_status == PAYMENT_SUCCEEDED
        && input.appointment_status == STATUS_BOOKED;

    let tz: Tz = input.shop_timezone.parse().unwrap_or(chrono_tz::UTC);
    let cutoff_display = cutoff
        .with_timezone(&tz)
        .format("%Y-%m-%d %H:%M %Z")
        .to_string();

    CancellationEligibility {
        refund_eligible,
        time_until_cutoff_minutes: time_until_cutoff.num_minutes(),
        cutoff_display,
    }
}

/// Outcome precedence: refund issued > payment kept > nothing captured.
pub fn resolve_financial_outcome(
    refund_eligible: bool,
    refunded_amount_cents: i64,
    payment_status: &str,
) -> &'static str {
    if refund_eligible || refunded_amount_cents > 0 {
        return OUTCOME_REFUNDED;
    }
    if payment_status == PAYMENT_SUCCEEDED {
        return OUTCOME_SETTLED;
    }
    OUTCOME_VOIDED
}

pub fn resolution_reason(outcome: &str) -> &'static str {
    match outcome {
        OUTCOME_REFUNDED => REASON_REFUND_WINDOW,
        OUTCOME_SETTLED => REASON_LATE_CANCEL,
        _ => REASON_UNPAID,
    }
}
