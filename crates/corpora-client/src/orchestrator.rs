//! Upload orchestration.
//!
//! The orchestrator owns the job state machine
//! `Idle -> Uploading -> Processing -> {Completed, Failed} -> Idle` and the
//! combined progress value. Transport and poller report into it through
//! callbacks and never touch caller state directly. At most one job may be
//! active per orchestrator instance; a second submission while one is in
//! flight is rejected with [`UploadError::JobActive`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use corpora_core::{
    format_file_size, Config, JobOutcome, JobPhase, OrganizationFile, UploadError, UploadJob,
    UploadMetadata, UploadMode,
};

use crate::backend::{IngestBackend, ProgressFn};
use crate::poller::{poll_job, PollerConfig};
use crate::repository::FileRepository;
use crate::strategy::UploadStrategy;
use crate::transport::UploadSource;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub mode: UploadMode,
    pub poll_interval: Duration,
    pub poll_retry_budget: u32,
    /// Limit for one job, both phases included.
    pub job_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            mode: UploadMode::Polled,
            poll_interval: Duration::from_millis(2000),
            poll_retry_budget: 0,
            job_timeout: Duration::from_secs(900),
        }
    }
}

impl OrchestratorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            mode: config.upload_mode,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            poll_retry_budget: config.poll_retry_budget,
            job_timeout: Duration::from_secs(config.job_timeout_secs),
        }
    }
}

/// Everything the progress presenter needs for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub phase: JobPhase,
    pub percent: f64,
    pub completed: Option<u32>,
    pub total: Option<u32>,
    pub filename: String,
    pub size_label: String,
}

pub type ProgressHandler = Arc<dyn Fn(ProgressSnapshot) + Send + Sync>;

/// What a finished job produced.
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub file_id: Option<String>,
    /// Created records, when the backend returns them synchronously.
    pub files: Vec<OrganizationFile>,
    pub completed: Option<u32>,
    pub total: Option<u32>,
}

pub struct UploadOrchestrator {
    backend: Arc<dyn IngestBackend>,
    file_mirror: Option<Arc<FileRepository>>,
    config: OrchestratorConfig,
    job: Arc<Mutex<Option<UploadJob>>>,
    cancel: CancellationToken,
}

fn lock_job(job: &Mutex<Option<UploadJob>>) -> MutexGuard<'_, Option<UploadJob>> {
    job.lock().unwrap_or_else(PoisonError::into_inner)
}

fn snapshot(job: &mut UploadJob) -> ProgressSnapshot {
    let filename = match job.files.len() {
        0 => String::new(),
        1 => job.files[0].name.clone(),
        n => format!("{} files", n),
    };
    let size_label = format_file_size(job.total_bytes());
    ProgressSnapshot {
        phase: job.phase,
        percent: job.combined_progress(),
        completed: job.completed_count,
        total: job.total_count,
        filename,
        size_label,
    }
}

fn emit(job: &Arc<Mutex<Option<UploadJob>>>, handler: &ProgressHandler) {
    let snap = {
        let mut guard = lock_job(job);
        guard.as_mut().map(snapshot)
    };
    if let Some(snap) = snap {
        handler(snap);
    }
}

impl UploadOrchestrator {
    pub fn new(backend: Arc<dyn IngestBackend>, config: OrchestratorConfig) -> Self {
        Self {
            backend,
            file_mirror: None,
            config,
            job: Arc::new(Mutex::new(None)),
            cancel: CancellationToken::new(),
        }
    }

    /// Attach the file mirror to refresh after a successful upload.
    pub fn with_file_mirror(mut self, mirror: Arc<FileRepository>) -> Self {
        self.file_mirror = Some(mirror);
        self
    }

    /// Current phase; `Idle` when no job exists.
    pub fn phase(&self) -> JobPhase {
        lock_job(&self.job)
            .as_ref()
            .map(|j| j.phase)
            .unwrap_or(JobPhase::Idle)
    }

    /// Tear down the orchestrator: aborts the in-flight request and stops the
    /// poll loop. No progress updates are delivered after this returns.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Dismiss a finished job (`Completed | Failed -> Idle`). Returns false
    /// when there is nothing terminal to dismiss.
    pub fn acknowledge(&self) -> bool {
        let mut guard = lock_job(&self.job);
        match guard.as_ref() {
            Some(job) if job.phase.is_terminal() => {
                *guard = None;
                true
            }
            _ => false,
        }
    }

    /// Run one upload job to completion.
    ///
    /// The validated sources must be non-empty and the metadata complete;
    /// both are checked before any network traffic. On success the file
    /// mirror (when attached) is refreshed exactly once. On failure the
    /// caller's form state is untouched so the user can retry.
    pub async fn submit(
        &self,
        sources: Vec<UploadSource>,
        metadata: UploadMetadata,
        on_progress: ProgressHandler,
    ) -> Result<UploadReport, UploadError> {
        metadata.ensure_complete()?;
        if sources.is_empty() {
            return Err(UploadError::NoValidFiles);
        }

        {
            let mut guard = lock_job(&self.job);
            if guard.as_ref().map(|j| j.phase.is_active()).unwrap_or(false) {
                return Err(UploadError::JobActive);
            }
            *guard = Some(UploadJob::new(
                sources.iter().map(|s| s.file.clone()).collect(),
            ));
        }
        emit(&self.job, &on_progress);

        let timeout = self.config.job_timeout;
        let result = tokio::select! {
            _ = self.cancel.cancelled() => Err(UploadError::Cancelled),
            run = tokio::time::timeout(timeout, self.run(&sources, &metadata, &on_progress)) => {
                match run {
                    Ok(inner) => inner,
                    Err(_) => Err(UploadError::Timeout(timeout.as_secs())),
                }
            }
        };

        if let Err(err) = &result {
            {
                let mut guard = lock_job(&self.job);
                if let Some(job) = guard.as_mut() {
                    job.phase = JobPhase::Failed;
                }
            }
            // A cancelled caller has discarded interest; stay silent.
            if !matches!(err, UploadError::Cancelled) {
                tracing::error!(error = %err, "Upload job failed");
                emit(&self.job, &on_progress);
            }
        }

        result
    }

    async fn run(
        &self,
        sources: &[UploadSource],
        metadata: &UploadMetadata,
        on_progress: &ProgressHandler,
    ) -> Result<UploadReport, UploadError> {
        let transport_progress = self.transport_progress(on_progress);

        match UploadStrategy::for_mode(self.config.mode) {
            UploadStrategy::Sync => {
                let files = self
                    .backend
                    .submit_sync(sources, metadata, transport_progress)
                    .await?;
                tracing::info!(count = files.len(), "Synchronous upload accepted");
                self.complete(None, None, on_progress).await;
                Ok(UploadReport {
                    file_id: None,
                    files,
                    completed: None,
                    total: None,
                })
            }
            UploadStrategy::Polled => {
                let file_id = self
                    .backend
                    .submit_polled(sources, metadata, transport_progress)
                    .await?;
                {
                    let mut guard = lock_job(&self.job);
                    if let Some(job) = guard.as_mut() {
                        job.file_id = Some(file_id.clone());
                        job.record_transport_progress(1.0);
                        job.phase = JobPhase::Processing;
                    }
                }
                tracing::info!(%file_id, "Upload accepted, tracking ingestion");

                let poll_config = PollerConfig {
                    interval: self.config.poll_interval,
                    retry_budget: self.config.poll_retry_budget,
                };
                let job = self.job.clone();
                let handler = on_progress.clone();
                let outcome = poll_job(
                    self.backend.as_ref(),
                    &file_id,
                    &poll_config,
                    &self.cancel,
                    move |pct, completed, total| {
                        let snap = {
                            let mut guard = lock_job(&job);
                            guard.as_mut().map(|j| {
                                j.record_server_progress(pct, completed, total);
                                snapshot(j)
                            })
                        };
                        if let Some(snap) = snap {
                            handler(snap);
                        }
                    },
                )
                .await?;

                match outcome {
                    JobOutcome::Completed { completed, total } => {
                        self.complete(completed, total, on_progress).await;
                        Ok(UploadReport {
                            file_id: Some(file_id),
                            files: Vec::new(),
                            completed,
                            total,
                        })
                    }
                    JobOutcome::Failed { reason } => Err(UploadError::Poll(reason)),
                }
            }
        }
    }

    /// Transport callback: folds bytes-sent fractions into the job. Bursty or
    /// late callbacks after the upload phase ended are ignored.
    fn transport_progress(&self, on_progress: &ProgressHandler) -> ProgressFn {
        let job = self.job.clone();
        let handler = on_progress.clone();
        Arc::new(move |fraction| {
            let snap = {
                let mut guard = lock_job(&job);
                guard
                    .as_mut()
                    .filter(|j| j.phase == JobPhase::Uploading)
                    .map(|j| {
                        j.record_transport_progress(fraction);
                        snapshot(j)
                    })
            };
            if let Some(snap) = snap {
                handler(snap);
            }
        })
    }

    async fn complete(
        &self,
        completed: Option<u32>,
        total: Option<u32>,
        on_progress: &ProgressHandler,
    ) {
        {
            let mut guard = lock_job(&self.job);
            if let Some(job) = guard.as_mut() {
                job.record_server_progress(100.0, completed, total);
                job.phase = JobPhase::Completed;
            }
        }
        emit(&self.job, on_progress);

        if let Some(mirror) = &self.file_mirror {
            if let Err(err) = mirror.refresh().await {
                tracing::warn!(error = %err, "File list refresh after upload failed");
            }
        }
    }
}
