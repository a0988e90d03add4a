//! Trait seams between the orchestrator and the HTTP layer.

use std::sync::Arc;

use async_trait::async_trait;

use corpora_core::models::Category;
use corpora_core::{OrganizationFile, UploadError, UploadMetadata, UploadStatusResponse};

use crate::transport::UploadSource;

/// Transport progress callback: bytes sent over bytes total, in [0, 1].
/// Callbacks may arrive in bursts at whatever granularity the transport
/// produces chunks; callers must tolerate that.
pub type ProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

/// The ingestion endpoints an upload job runs against.
#[async_trait]
pub trait IngestBackend: Send + Sync {
    /// Submit a batch for poll-tracked ingestion. Returns the job id used by
    /// [`upload_status`](Self::upload_status).
    async fn submit_polled(
        &self,
        sources: &[UploadSource],
        metadata: &UploadMetadata,
        on_progress: ProgressFn,
    ) -> Result<String, UploadError>;

    /// Submit a batch to the synchronous endpoint. The response carries the
    /// created file records; there is nothing to poll.
    async fn submit_sync(
        &self,
        sources: &[UploadSource],
        metadata: &UploadMetadata,
        on_progress: ProgressFn,
    ) -> Result<Vec<OrganizationFile>, UploadError>;

    /// One job-status request.
    async fn upload_status(&self, file_id: &str) -> Result<UploadStatusResponse, UploadError>;
}

/// The read/delete endpoints behind the entity mirrors.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    async fn list_files(&self) -> Result<Vec<OrganizationFile>, UploadError>;

    async fn delete_file(&self, id: &str) -> Result<(), UploadError>;

    async fn list_categories(&self) -> Result<Vec<Category>, UploadError>;
}
