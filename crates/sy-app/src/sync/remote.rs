use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use sy_core::SerializedHistoryEntry;

use crate::error::AppError;

/// Remote document store holding the serialized entry population as one
/// JSON array. Writes are wholesale: last writer wins at document level.
#[async_trait]
pub trait RemoteHistory: Send + Sync {
    async fn fetch(&self) -> Result<Vec<SerializedHistoryEntry>, AppError>;
    async fn replace_all(&self, entries: &[SerializedHistoryEntry]) -> Result<(), AppError>;
    async fn clear(&self) -> Result<(), AppError>;
}

#[derive(Debug, Deserialize)]
struct AckBody {
    success: bool,
}

#[derive(Debug, Clone)]
pub struct HttpRemoteHistory {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRemoteHistory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/history", self.base_url)
    }
}

fn sync_err(err: reqwest::Error) -> AppError {
    AppError::Sync(err.to_string())
}

async fn check_ack(response: reqwest::Response) -> Result<(), AppError> {
    if !response.status().is_success() {
        return Err(AppError::Sync(format!("HTTP {}", response.status())));
    }
    let ack: AckBody = response.json().await.map_err(sync_err)?;
    if !ack.success {
        return Err(AppError::Sync("remote rejected history document".to_string()));
    }
    Ok(())
}

#[async_trait]
impl RemoteHistory for HttpRemoteHistory {
    async fn fetch(&self) -> Result<Vec<SerializedHistoryEntry>, AppError> {
        let response = self
            .http
            .get(self.endpoint())
            .send()
            .await
            .map_err(sync_err)?;

        // A store that was never written to has no document yet.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(AppError::Sync(format!("HTTP {}", response.status())));
        }

        let body = response.text().await.map_err(sync_err)?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&body)
            .map_err(|err| AppError::Sync(format!("malformed remote document: {err}")))
    }

    async fn replace_all(&self, entries: &[SerializedHistoryEntry]) -> Result<(), AppError> {
        let response = self
            .http
            .post(self.endpoint())
            .json(entries)
            .send()
            .await
            .map_err(sync_err)?;

        check_ack(response).await
    }

    async fn clear(&self) -> Result<(), AppError> {
        let response = self
            .http
            .delete(self.endpoint())
            .send()
            .await
            .map_err(sync_err)?;

        check_ack(response).await
    }
}
