//! HTTP client for the Corpora API.
//!
//! Provides a minimal client with optional Bearer auth, generic request
//! helpers, and the upload/ingestion machinery: multipart transport with
//! byte-counting progress, a cancellable job-status poller, the upload
//! orchestrator, and cached mirrors of the server's file and category lists.

pub mod api;
pub mod backend;
pub mod notify;
pub mod orchestrator;
pub mod poller;
pub mod repository;
pub mod strategy;
pub mod transport;

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use corpora_core::{Config, UploadError};

/// HTTP client for the Corpora API with optional Bearer-token auth.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(
        base_url: String,
        token: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| UploadError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, UploadError> {
        Self::new(
            config.api_base_url.clone(),
            config.api_token.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Non-2xx responses become `Transport`; send failures become `Network`.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, UploadError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(UploadError::Transport {
            status: status.as_u16(),
            message,
        })
    }

    fn send_error(err: reqwest::Error) -> UploadError {
        UploadError::Network(err.to_string())
    }

    fn decode_error(err: reqwest::Error) -> UploadError {
        UploadError::Internal(format!("Failed to parse response: {}", err))
    }

    /// GET request, deserializing the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, UploadError> {
        let request = self.apply_auth(self.client.get(self.build_url(path)));
        let response = request.send().await.map_err(Self::send_error)?;
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(Self::decode_error)
    }

    /// POST a multipart form, deserializing the JSON response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, UploadError> {
        let request = self.apply_auth(self.client.post(self.build_url(path)).multipart(form));
        let response = request.send().await.map_err(Self::send_error)?;
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(Self::decode_error)
    }

    /// DELETE request. Returns Ok(()) on success.
    pub async fn delete(&self, path: &str) -> Result<(), UploadError> {
        let request = self.apply_auth(self.client.delete(self.build_url(path)));
        let response = request.send().await.map_err(Self::send_error)?;
        Self::check(response).await?;
        Ok(())
    }

    /// Raw client for requests outside the API (e.g. fetching a remote
    /// document before ingesting it).
    pub fn client(&self) -> &Client {
        &self.client
    }
}

// Re-export the pieces callers assemble.
pub use backend::{CatalogBackend, IngestBackend, ProgressFn};
pub use notify::NotificationListener;
pub use orchestrator::{
    OrchestratorConfig, ProgressHandler, ProgressSnapshot, UploadOrchestrator, UploadReport,
};
pub use poller::{poll_job, PollerConfig};
pub use repository::{CategoryRepository, FileRepository};
pub use strategy::UploadStrategy;
pub use transport::UploadSource;
