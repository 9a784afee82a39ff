//! Thin HTTP client for the Replicate predictions API.
//!
//! - `create_prediction` posts a composed request to `/predictions`.
//! - `get_prediction` fetches `/predictions/{id}`.
//! - `cancel_prediction` posts to `/predictions/{id}/cancel`.
//! - `verify_credential` probes `/models` with the token.
use async_trait::async_trait;
use reqwest::{Client, Response};

use crate::credential::Credential;
use crate::error::{AppError, AppResult};
use crate::prompt::GenerationRequest;
use crate::replicate::types::Prediction;

/// The outbound seam of the orchestrator. Tests substitute a scripted fake.
#[async_trait]
pub trait PredictionApi: Send + Sync {
    async fn create_prediction(&self, credential: &Credential, request: &GenerationRequest) -> AppResult<Prediction>;

    async fn get_prediction(&self, credential: &Credential, id: &str) -> AppResult<Prediction>;

    async fn cancel_prediction(&self, credential: &Credential, id: &str) -> AppResult<()>;

    async fn verify_credential(&self, credential: &Credential) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct ReplicateClient {
    client: Client,
    base_url: String,
}

impl ReplicateClient {
    pub fn new(base_url: String) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        ReplicateClient { client: Client::new(), base_url: base }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Non-2xx responses become `Transport` errors carrying the raw body.
async fn check_status(response: Response, action: &str) -> AppResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_else(|_| "Unable to read error body".to_string());
    tracing::error!(status = status.as_u16(), %body, "Replicate {} failed", action);
    Err(AppError::Transport { status: Some(status.as_u16()), body })
}

#[async_trait]
impl PredictionApi for ReplicateClient {
    async fn create_prediction(&self, credential: &Credential, request: &GenerationRequest) -> AppResult<Prediction> {
        let url = format!("{}/predictions", self.base_url);
        tracing::info!(version = %request.version, "Creating prediction at {}", url);
        tracing::debug!(prompt = %request.input.prompt, "Prediction input");

        let response = self
            .client
            .post(&url)
            .header("Authorization", credential.authorization())
            .json(request)
            .send()
            .await?;
        let prediction: Prediction = check_status(response, "create").await?.json().await?;
        tracing::info!(job_id = %prediction.id, status = ?prediction.status, "Prediction created");
        Ok(prediction)
    }

    async fn get_prediction(&self, credential: &Credential, id: &str) -> AppResult<Prediction> {
        let url = format!("{}/predictions/{}", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .header("Authorization", credential.authorization())
            .send()
            .await?;
        Ok(check_status(response, "status query").await?.json().await?)
    }

    async fn cancel_prediction(&self, credential: &Credential, id: &str) -> AppResult<()> {
        let url = format!("{}/predictions/{}/cancel", self.base_url, id);
        let response = self
            .client
            .post(&url)
            .header("Authorization", credential.authorization())
            .send()
            .await?;
        check_status(response, "cancel").await?;
        Ok(())
    }

    async fn verify_credential(&self, credential: &Credential) -> AppResult<bool> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", credential.authorization())
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_trailing_slash() {
        let client = ReplicateClient::new("https://api.replicate.com/v1/".to_string());
        assert_eq!(client.base_url(), "https://api.replicate.com/v1");
    }
}
