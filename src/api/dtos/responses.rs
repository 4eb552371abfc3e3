use serde::Serialize;

use crate::domain::models::appointment::Appointment;
use crate::domain::services::cancellation::CancellationEligibility;

#[derive(Serialize)]
pub struct CancellationResponse {
    pub appointment: Appointment,
    pub eligibility: CancellationEligibility,
    pub financial_outcome: String,
    pub slot_opening_id: Option<String>,
    pub already_resolved: bool,
}

#[derive(Serialize)]
pub struct ScoringJobResponse {
    pub skipped: bool,
    pub reason: Option<String>,
    pub scored: usize,
    pub errors: Vec<String>,
}
