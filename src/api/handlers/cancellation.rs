use axum::{extract::{Path, State}, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::CancelAppointmentRequest;
use crate::api::dtos::responses::CancellationResponse;
use crate::domain::models::appointment::STATUS_BOOKED;
use crate::domain::services::cancellation::{
    resolve_cancellation_eligibility, resolve_financial_outcome, resolution_reason,
    CancellationPolicyInput,
};
use crate::error::AppError;
use crate::state::AppState;

pub async fn get_cancellation_policy(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let appointment = state.appointment_repo.find_by_id(&appointment_id).await?
        .ok_or(AppError::NotFound("Appointment not found".into()))?;
    let shop = state.shop_repo.find_by_id(&appointment.shop_id).await?
        .ok_or(AppError::Internal)?;

    let eligibility = resolve_cancellation_eligibility(
        &CancellationPolicyInput {
            appointment_start: appointment.start_time,
            cutoff_minutes: shop.cancellation_cutoff_minutes,
            shop_timezone: &shop.timezone,
            payment_status: &appointment.payment_status,
            appointment_status: &appointment.status,
            refund_before_cutoff: shop.refund_before_cutoff,
        },
        Utc::now(),
    );

    Ok(Json(eligibility))
}

pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<String>,
    Json(payload): Json<CancelAppointmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let appointment = state.appointment_repo.find_by_id(&appointment_id).await?
        .ok_or(AppError::NotFound("Appointment not found".into()))?;
    let shop = state.shop_repo.find_by_id(&appointment.shop_id).await?
        .ok_or(AppError::Internal)?;

    let eligibility = resolve_cancellation_eligibility(
        &CancellationPolicyInput {
            appointment_start: appointment.start_time,
            cutoff_minutes: shop.cancellation_cutoff_minutes,
            shop_timezone: &shop.timezone,
            payment_status: &appointment.payment_status,
            appointment_status: &appointment.status,
            refund_before_cutoff: shop.refund_before_cutoff,
        },
        Utc::now(),
    );

    if appointment.status != STATUS_BOOKED {
        // Already resolved; cancellation is idempotent.
        let outcome = appointment.financial_outcome.clone().unwrap_or_default();
        return Ok(Json(CancellationResponse {
            appointment,
            eligibility,
            financial_outcome: outcome,
            slot_opening_id: None,
            already_resolved: true,
        }));
    }

    let outcome = resolve_financial_outcome(
        eligibility.refund_eligible,
        appointment.refunded_amount_cents,
        &appointment.payment_status,
    );
    let reason = resolution_reason(outcome);

    let resolved = state.appointment_repo
        .resolve_cancellation(&appointment.id, outcome, reason, payload.source.as_deref())
        .await?;

    let Some(resolved) = resolved else {
        // Lost the race to a concurrent cancellation; report current state.
        let current = state.appointment_repo.find_by_id(&appointment.id).await?
            .ok_or(AppError::Internal)?;
        let outcome = current.financial_outcome.clone().unwrap_or_default();
        return Ok(Json(CancellationResponse {
            appointment: current,
            eligibility,
            financial_outcome: outcome,
            slot_opening_id: None,
            already_resolved: true,
        }));
    };

    info!(
        "Appointment {} cancelled with outcome {} ({})",
        resolved.id, outcome, reason
    );

    let opening = state.recovery.create_opening_from_cancellation(&resolved).await?;

    Ok(Json(CancellationResponse {
        appointment: resolved,
        eligibility,
        financial_outcome: outcome.to_string(),
        slot_opening_id: opening.map(|o| o.id),
        already_resolved: false,
    }))
}
