//! Domain methods for the Corpora API client.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;

use corpora_core::models::Category;
use corpora_core::{OrganizationFile, UploadError, UploadMetadata, UploadStatusResponse};

use crate::backend::{CatalogBackend, IngestBackend, ProgressFn};
use crate::transport::{multipart_form, UploadSource};
use crate::ApiClient;

const UPLOAD_PATH: &str = "/organization-file/upload";
const LOCAL_DRIVE_UPLOAD_PATH: &str = "/organization-file/local-drive/upload";
const FILES_PATH: &str = "/organization-file/all";
const CATEGORIES_PATH: &str = "/organization-admin/category";

fn upload_status_path(file_id: &str) -> String {
    format!("/organization-file/upload-status/{}", file_id)
}

fn file_path(id: &str) -> String {
    format!("/organization-file/{}", id)
}

/// Response of the poll-tracked upload endpoint.
#[derive(Debug, Deserialize)]
pub struct UploadAccepted {
    pub file_id: String,
}

impl ApiClient {
    /// Fetch a remote document into memory so it can go through the same
    /// ingestion path as a local file. The filename is taken from the last
    /// URL path segment.
    pub async fn download_document(&self, url: &str) -> Result<UploadSource, UploadError> {
        let response = self
            .client()
            .get(url)
            .send()
            .await
            .map_err(|e| UploadError::Network(format!("Failed to fetch {}: {}", url, e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Transport {
                status: status.as_u16(),
                message: format!("Remote document fetch failed for {}", url),
            });
        }
        let name = url
            .split('/')
            .next_back()
            .map(|s| s.split(['?', '#']).next().unwrap_or(s))
            .filter(|s| !s.is_empty())
            .unwrap_or("document.pdf")
            .to_string();
        let data: Bytes = response
            .bytes()
            .await
            .map_err(|e| UploadError::Network(format!("Failed to read {}: {}", url, e)))?;

        Ok(UploadSource::from_bytes(name, data))
    }
}

#[async_trait]
impl IngestBackend for ApiClient {
    async fn submit_polled(
        &self,
        sources: &[UploadSource],
        metadata: &UploadMetadata,
        on_progress: ProgressFn,
    ) -> Result<String, UploadError> {
        let form = multipart_form("file", sources, metadata, on_progress).await?;
        let accepted: UploadAccepted = self.post_multipart(UPLOAD_PATH, form).await?;
        Ok(accepted.file_id)
    }

    async fn submit_sync(
        &self,
        sources: &[UploadSource],
        metadata: &UploadMetadata,
        on_progress: ProgressFn,
    ) -> Result<Vec<OrganizationFile>, UploadError> {
        let form = multipart_form("files", sources, metadata, on_progress).await?;
        self.post_multipart(LOCAL_DRIVE_UPLOAD_PATH, form).await
    }

    async fn upload_status(&self, file_id: &str) -> Result<UploadStatusResponse, UploadError> {
        self.get(&upload_status_path(file_id)).await
    }
}

#[async_trait]
impl CatalogBackend for ApiClient {
    async fn list_files(&self) -> Result<Vec<OrganizationFile>, UploadError> {
        self.get(FILES_PATH).await
    }

    async fn delete_file(&self, id: &str) -> Result<(), UploadError> {
        self.delete(&file_path(id)).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, UploadError> {
        self.get(CATEGORIES_PATH).await
    }
}
