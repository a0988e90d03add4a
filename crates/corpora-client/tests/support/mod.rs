//! In-memory backend for orchestrator and poller tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use corpora_client::backend::{CatalogBackend, IngestBackend, ProgressFn};
use corpora_client::transport::UploadSource;
use corpora_core::models::{Category, JobStatus};
use corpora_core::{OrganizationFile, UploadError, UploadMetadata, UploadStatusResponse};

pub fn org_file(id: &str) -> OrganizationFile {
    OrganizationFile {
        id: id.to_string(),
        filename: format!("{}.pdf", id),
        category_id: "finance".to_string(),
        size_bytes: 2048,
        tags: vec!["q1".to_string()],
        current_stage: Some("uploaded".to_string()),
        created_at: Utc::now(),
    }
}

pub fn status(progress: f64) -> UploadStatusResponse {
    UploadStatusResponse {
        progress,
        completed: None,
        total: None,
        status: None,
    }
}

pub fn status_done(completed: Option<u32>, total: Option<u32>) -> UploadStatusResponse {
    UploadStatusResponse {
        progress: 100.0,
        completed,
        total,
        status: Some(JobStatus::Completed),
    }
}

pub fn status_failed() -> UploadStatusResponse {
    UploadStatusResponse {
        progress: 80.0,
        completed: None,
        total: None,
        status: Some(JobStatus::Failed),
    }
}

/// Scripted backend: transport fractions to report during submission, a
/// submission result, and a queue of poll responses. An exhausted queue keeps
/// answering "progress 10", which models a job that never finishes.
pub struct MockBackend {
    pub transport_fractions: Vec<f64>,
    pub polled_result: Mutex<Result<String, u16>>,
    pub sync_result: Mutex<Result<Vec<OrganizationFile>, u16>>,
    pub statuses: Mutex<VecDeque<Result<UploadStatusResponse, String>>>,
    pub polled_calls: AtomicU32,
    pub sync_calls: AtomicU32,
    pub status_calls: AtomicU32,
    pub file_list_calls: AtomicU32,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            transport_fractions: vec![1.0],
            polled_result: Mutex::new(Ok("abc".to_string())),
            sync_result: Mutex::new(Ok(vec![org_file("f1")])),
            statuses: Mutex::new(VecDeque::new()),
            polled_calls: AtomicU32::new(0),
            sync_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
            file_list_calls: AtomicU32::new(0),
        })
    }

    pub fn with_transport_fractions(fractions: Vec<f64>) -> Arc<Self> {
        let mut backend = Self::new();
        Arc::get_mut(&mut backend).unwrap().transport_fractions = fractions;
        backend
    }

    pub fn push_status(&self, step: Result<UploadStatusResponse, &str>) {
        self.statuses
            .lock()
            .unwrap()
            .push_back(step.map_err(|s| s.to_string()));
    }

    pub fn fail_polled_submit(&self, http_status: u16) {
        *self.polled_result.lock().unwrap() = Err(http_status);
    }
}

fn transport_error(status: u16) -> UploadError {
    UploadError::Transport {
        status,
        message: "rejected by test backend".to_string(),
    }
}

#[async_trait]
impl IngestBackend for MockBackend {
    async fn submit_polled(
        &self,
        _sources: &[UploadSource],
        _metadata: &UploadMetadata,
        on_progress: ProgressFn,
    ) -> Result<String, UploadError> {
        self.polled_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.polled_result.lock().unwrap().clone();
        match result {
            Ok(file_id) => {
                for fraction in &self.transport_fractions {
                    on_progress(*fraction);
                }
                Ok(file_id)
            }
            Err(status) => Err(transport_error(status)),
        }
    }

    async fn submit_sync(
        &self,
        _sources: &[UploadSource],
        _metadata: &UploadMetadata,
        on_progress: ProgressFn,
    ) -> Result<Vec<OrganizationFile>, UploadError> {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.sync_result.lock().unwrap().clone();
        match result {
            Ok(files) => {
                for fraction in &self.transport_fractions {
                    on_progress(*fraction);
                }
                Ok(files)
            }
            Err(status) => Err(transport_error(status)),
        }
    }

    async fn upload_status(&self, _file_id: &str) -> Result<UploadStatusResponse, UploadError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let step = self.statuses.lock().unwrap().pop_front();
        match step {
            Some(Ok(status)) => Ok(status),
            Some(Err(message)) => Err(UploadError::Network(message)),
            None => Ok(status(10.0)),
        }
    }
}

#[async_trait]
impl CatalogBackend for MockBackend {
    async fn list_files(&self) -> Result<Vec<OrganizationFile>, UploadError> {
        self.file_list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![org_file("f1")])
    }

    async fn delete_file(&self, _id: &str) -> Result<(), UploadError> {
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, UploadError> {
        Ok(vec![Category {
            id: "finance".to_string(),
            name: "Finance".to_string(),
            tags: Vec::new(),
        }])
    }
}
