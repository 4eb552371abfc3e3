use axum::{extract::{Path, State}, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::dtos::responses::ScoringJobResponse;
use crate::api::extractors::job_auth::JobAuth;
use crate::domain::models::reliability::{CustomerReliabilityScore, ScoreInput};
use crate::domain::services::scoring::{assign_tier, calculate_score};
use crate::error::AppError;
use crate::state::AppState;

const SCORING_LOCK: &str = "reliability_scoring";

pub async fn expiry_sweep(
    State(state): State<Arc<AppState>>,
    _auth: JobAuth,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.recovery.run_expiry_sweep().await?;
    info!(
        "Expiry sweep finished: considered={} expired={} triggered={} errors={}",
        outcome.considered,
        outcome.expired,
        outcome.triggered,
        outcome.errors.len()
    );
    Ok(Json(outcome))
}

pub async fn offer_step(
    State(state): State<Arc<AppState>>,
    _auth: JobAuth,
    Path(slot_opening_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.recovery.run_offer_step(&slot_opening_id).await?;
    Ok(Json(outcome))
}

pub async fn reliability_scoring(
    State(state): State<Arc<AppState>>,
    _auth: JobAuth,
    Path(shop_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.shop_repo.find_by_id(&shop_id).await?
        .ok_or(AppError::NotFound("Shop not found".into()))?;

    if !state.control.try_acquire_lock(SCORING_LOCK).await? {
        info!("Reliability scoring skipped: lock already held");
        return Ok(Json(ScoringJobResponse {
            skipped: true,
            reason: Some("locked".to_string()),
            scored: 0,
            errors: Vec::new(),
        }));
    }

    let result = score_shop(&state, &shop_id).await;

    if let Err(e) = state.control.release_lock(SCORING_LOCK).await {
        warn!("Failed to release {} lock: {}", SCORING_LOCK, e);
    }

    result.map(Json)
}

async fn score_shop(state: &Arc<AppState>, shop_id: &str) -> Result<ScoringJobResponse, AppError> {
    let now = Utc::now();
    let histories = state.appointment_repo.aggregate_outcome_history(shop_id, now).await?;

    let mut scored = 0;
    let mut errors = Vec::new();

    for history in histories {
        let input = ScoreInput {
            last_30: history.last_30,
            days_31_90: history.days_31_90,
            over_90: history.over_90,
        };

        // An invalid score is a per-customer error; the batch continues.
        let Some(score) = calculate_score(&input) else {
            errors.push(format!(
                "customer {}: score computation produced an invalid value",
                history.customer_id
            ));
            continue;
        };

        let tier = assign_tier(score, history.voided_90d);
        let row = CustomerReliabilityScore {
            customer_id: history.customer_id.clone(),
            shop_id: shop_id.to_string(),
            score: score as i64,
            tier: tier.as_str().to_string(),
            window_days: state.config.score_window_days,
            settled_count: (history.last_30.settled + history.days_31_90.settled + history.over_90.settled) as i64,
            voided_count: (history.last_30.voided + history.days_31_90.voided + history.over_90.voided) as i64,
            refunded_count: (history.last_30.refunded + history.days_31_90.refunded + history.over_90.refunded) as i64,
            late_cancel_count: (history.last_30.late_cancels + history.days_31_90.late_cancels + history.over_90.late_cancels) as i64,
            voided_90d: history.voided_90d,
            no_show_count_90d: history.no_shows_90d,
            computed_at: now,
        };

        match state.reliability_repo.upsert(&row).await {
            Ok(()) => scored += 1,
            Err(e) => errors.push(format!("customer {}: {}", history.customer_id, e)),
        }
    }

    info!(
        "Reliability scoring for shop {} finished: scored={} errors={}",
        shop_id,
        scored,
        errors.len()
    );

    Ok(ScoringJobResponse {
        skipped: false,
        reason: None,
        scored,
        errors,
    })
}
