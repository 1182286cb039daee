pub mod schemas;

use async_trait::async_trait;
use sy_core::{Blob, blob};

use crate::backend::schemas::{ErrorBody, JobStatusResponse, SubmitRequest, SubmitResponse};
use crate::error::AppError;

/// Status/download surface of the generation backend, split out so the
/// poller can be driven by a scripted stand-in under test.
#[async_trait]
pub trait GenerationApi: Send + Sync {
    async fn status(&self, job_id: &str) -> Result<JobStatusResponse, AppError>;
    async fn download(&self, job_id: &str) -> Result<Vec<u8>, AppError>;
}

/// HTTP client for the generation backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Submit an image for sample-pack generation, returning the job id.
    pub async fn submit(&self, image: &Blob) -> Result<String, AppError> {
        let body = SubmitRequest {
            image_base64: blob::encode(&image.data),
        };

        let response = self
            .http
            .post(format!("{}/sample", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.detail)
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(AppError::ServerReported(detail));
        }

        let created: SubmitResponse = response.json().await?;
        Ok(created.job_id)
    }
}

#[async_trait]
impl GenerationApi for BackendClient {
    async fn status(&self, job_id: &str) -> Result<JobStatusResponse, AppError> {
        let response = self
            .http
            .get(format!("{}/sample/{}", self.base_url, job_id))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    async fn download(&self, job_id: &str) -> Result<Vec<u8>, AppError> {
        let response = self
            .http
            .get(format!("{}/sample/{}/download", self.base_url, job_id))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.bytes().await?.to_vec())
    }
}
