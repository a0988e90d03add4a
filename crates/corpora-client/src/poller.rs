//! Job-status polling.
//!
//! Polling is strictly sequential: the next request is only issued after the
//! previous response has been handled, so updates arrive in request order and
//! never overlap. The loop always terminates: completion, failure,
//! cancellation, or an exhausted retry budget all stop it.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use corpora_core::{JobOutcome, UploadError};

use crate::backend::IngestBackend;

#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Delay between consecutive status requests.
    pub interval: Duration,
    /// Poll errors tolerated before the job fails. 0 reproduces the strict
    /// fail-on-first-error contract.
    pub retry_budget: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            retry_budget: 0,
        }
    }
}

/// Poll the job-status endpoint for `file_id` until the server reports a
/// terminal state.
///
/// `on_update` receives every non-terminal progress report (percentage plus
/// optional completed/total file counts); the terminal report is returned as
/// the [`JobOutcome`] instead. Cancelling the token stops the loop before the
/// next request and guarantees no further `on_update` calls; an in-flight
/// request's response is dropped unobserved.
pub async fn poll_job(
    backend: &dyn IngestBackend,
    file_id: &str,
    config: &PollerConfig,
    cancel: &CancellationToken,
    mut on_update: impl FnMut(f64, Option<u32>, Option<u32>),
) -> Result<JobOutcome, UploadError> {
    let mut errors: u32 = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Err(UploadError::Cancelled),
            _ = tokio::time::sleep(config.interval) => {}
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => return Err(UploadError::Cancelled),
            result = backend.upload_status(file_id) => result,
        };

        match result {
            Ok(status) => {
                errors = 0;
                if status.is_failed() {
                    tracing::info!(file_id, "Ingestion reported as failed");
                    return Ok(JobOutcome::Failed {
                        reason: "Ingestion failed server-side".to_string(),
                    });
                }
                if status.is_done() {
                    tracing::info!(file_id, "Ingestion completed");
                    return Ok(JobOutcome::Completed {
                        completed: status.completed,
                        total: status.total,
                    });
                }
                tracing::debug!(file_id, progress = status.progress, "Poll update");
                on_update(status.progress, status.completed, status.total);
            }
            Err(err) => {
                if errors >= config.retry_budget {
                    return Err(UploadError::Poll(err.to_string()));
                }
                errors += 1;
                tracing::warn!(
                    file_id,
                    error = %err,
                    attempt = errors,
                    budget = config.retry_budget,
                    "Status poll failed, retrying"
                );
            }
        }
    }
}
