//! Upload strategies.
//!
//! The two backend contracts observed for the same operation: a poll-tracked
//! endpoint that returns a job id, and a synchronous endpoint that responds
//! only once ingestion is accepted. The strategy is selected by
//! configuration, never by branching on an app variant.

use corpora_core::UploadMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStrategy {
    /// Submit, then poll the job-status endpoint until done.
    Polled,
    /// Submit and treat transport success as completion.
    Sync,
}

impl UploadStrategy {
    pub fn for_mode(mode: UploadMode) -> Self {
        match mode {
            UploadMode::Polled => UploadStrategy::Polled,
            UploadMode::Sync => UploadStrategy::Sync,
        }
    }

    /// Whether this strategy has a processing phase tracked via polling.
    pub fn tracks_processing(&self) -> bool {
        matches!(self, UploadStrategy::Polled)
    }
}
