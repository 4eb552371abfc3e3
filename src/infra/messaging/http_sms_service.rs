use crate::domain::ports::MessagingService;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::error;

pub struct HttpSmsService {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpSmsService {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
        }
    }
}

#[derive(Serialize)]
struct SmsPayload {
    to: String,
    body: String,
}

#[derive(Deserialize)]
struct SmsResponse {
    provider_message_id: String,
}

#[async_trait]
impl MessagingService for HttpSmsService {
    async fn send(&self, to: &str, body: &str) -> Result<String, AppError> {
        let payload = SmsPayload {
            to: to.to_string(),
            body: body.to_string(),
        };

        let res = self.client.post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("SMS service connection error: {}", e);
                error!("{}", msg);
                AppError::InternalWithMsg(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("SMS service failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }

        let parsed: SmsResponse = res.json().await.map_err(|e| {
            AppError::InternalWithMsg(format!("SMS service returned invalid body: {}", e))
        })?;

        Ok(parsed.provider_message_id)
    }
}
