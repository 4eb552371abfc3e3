use crate::domain::models::reliability::{ScoreInput, Tier};

const BASE_SCORE: f64 = 50.0;
const SETTLED_BONUS_CAP: f64 = 50.0;

const MULTIPLIER_LAST_30: f64 = 2.0;
const MULTIPLIER_31_90: f64 = 1.0;
const MULTIPLIER_OVER_90: f64 = 0.5;

/// Recency-weighted behavioral score in [0, 100]. Returns None when the
/// computation produced a non-finite value; such a result must never be
/// persisted.
pub fn calculate_score(input: &ScoreInput) -> Option<u8> {
    let buckets = [
        (input.last_30, MULTIPLIER_LAST_30),
        (input.days_31_90, MULTIPLIER_31_90),
        (input.over_90, MULTIPLIER_OVER_90),
    ];

    let mut score = BASE_SCORE;
    let mut settled_bonus = 0.0;

    for (counts, multiplier) in buckets {
        settled_bonus += counts.settled as f64 * 10.0 * multiplier;
        score -= counts.voided as f64 * 20.0 * multiplier;
        score -= counts.refunded as f64 * 5.0 * multiplier;
        score -= counts.late_cancels as f64 * 10.0 * multiplier;
    }

    // The cap applies to the bonus alone; penalties are uncapped.
    score += settled_bonus.min(SETTLED_BONUS_CAP);

    if !score.is_finite() {
        return None;
    }

    Some(score.clamp(0.0, 100.0).round() as u8)
}

/// Tier assignment. The recent void count takes precedence over the score:
/// a single void in the last 90 days revokes top, two force risk.
pub fn assign_tier(score: u8, voided_90d: i64) -> Tier {
    if score <= 39 || voided_90d >= 2 {
        return Tier::Risk;
    }
    if score >= 80 && voided_90d <= 0 {
        return Tier::Top;
    }
    Tier::Neutral
}
