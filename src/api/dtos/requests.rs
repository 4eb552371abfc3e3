use serde::Deserialize;

#[derive(Deserialize, Default)]
pub struct CancelAppointmentRequest {
    pub source: Option<String>,
}
