use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::sync::Arc;
use crate::error::AppError;
use crate::state::AppState;

/// Shared-secret authentication for scheduler-invoked job endpoints.
/// Missing configuration is a 500 (nothing safe can proceed); a bad or
/// absent header is a 401.
pub struct JobAuth;

impl<S> FromRequestParts<S> for JobAuth
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let expected = app_state
            .config
            .job_shared_secret
            .as_deref()
            .ok_or_else(|| AppError::Configuration("JOB_SHARED_SECRET is not set".to_string()))?;

        let provided = parts
            .headers
            .get("X-Job-Secret")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        if provided != expected {
            return Err(AppError::Unauthorized);
        }

        Ok(JobAuth)
    }
}
