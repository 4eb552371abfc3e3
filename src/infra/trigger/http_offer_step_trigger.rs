use crate::domain::ports::OfferStepTrigger;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;

/// Chains a fresh offer-loop step over HTTP. Callers treat failures as
/// recorded, non-fatal errors; the expiry sweep is the backstop.
pub struct HttpOfferStepTrigger {
    client: Client,
    base_url: Option<String>,
    job_secret: Option<String>,
}

impl HttpOfferStepTrigger {
    pub fn new(base_url: Option<String>, job_secret: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            job_secret,
        }
    }
}

#[async_trait]
impl OfferStepTrigger for HttpOfferStepTrigger {
    async fn trigger(&self, slot_opening_id: &str) -> Result<(), AppError> {
        let base_url = self.base_url.as_ref().ok_or_else(|| {
            AppError::Configuration("OFFER_STEP_TRIGGER_URL is not set".to_string())
        })?;
        let secret = self.job_secret.as_ref().ok_or_else(|| {
            AppError::Configuration("JOB_SHARED_SECRET is not set".to_string())
        })?;

        let url = format!("{}/{}", base_url.trim_end_matches('/'), slot_opening_id);
        let res = self.client.post(&url)
            .header("X-Job-Secret", secret)
            .send()
            .await
            .map_err(|e| AppError::InternalWithMsg(format!("Trigger connection error: {}", e)))?;

        if !res.status().is_success() {
            return Err(AppError::InternalWithMsg(format!(
                "Trigger call failed. Status: {}",
                res.status()
            )));
        }

        Ok(())
    }
}
