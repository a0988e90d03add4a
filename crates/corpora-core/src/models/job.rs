use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use super::file::PendingFile;

/// Stage of the active upload job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Idle,
    Uploading,
    Processing,
    Completed,
    Failed,
}

impl JobPhase {
    /// A new submission must not start while a job is in one of these phases.
    pub fn is_active(&self) -> bool {
        matches!(self, JobPhase::Uploading | JobPhase::Processing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Completed | JobPhase::Failed)
    }
}

impl Display for JobPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            JobPhase::Idle => write!(f, "idle"),
            JobPhase::Uploading => write!(f, "uploading"),
            JobPhase::Processing => write!(f, "processing"),
            JobPhase::Completed => write!(f, "completed"),
            JobPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Explicit terminal status in a poll response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Completed,
    Failed,
}

/// Wire shape of `GET /organization-file/upload-status/{file_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadStatusResponse {
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
}

impl UploadStatusResponse {
    pub fn is_done(&self) -> bool {
        self.progress >= 100.0 || self.status == Some(JobStatus::Completed)
    }

    pub fn is_failed(&self) -> bool {
        self.status == Some(JobStatus::Failed)
    }
}

/// Terminal result of tracking one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed {
        completed: Option<u32>,
        total: Option<u32>,
    },
    Failed {
        reason: String,
    },
}

/// One logical upload operation: the files being sent, the current phase, and
/// the progress reported by each phase. Transport owns `transport_pct`
/// (0..100, upload phase); the poller owns `server_pct` (0..100, processing
/// phase). The combined value maps the two onto a single 0..100 scale:
/// upload covers 0..50, processing covers 50..100.
#[derive(Debug, Clone)]
pub struct UploadJob {
    pub file_id: Option<String>,
    pub files: Vec<PendingFile>,
    pub phase: JobPhase,
    transport_pct: f64,
    server_pct: f64,
    pub completed_count: Option<u32>,
    pub total_count: Option<u32>,
    high_water: f64,
}

impl UploadJob {
    pub fn new(files: Vec<PendingFile>) -> Self {
        Self {
            file_id: None,
            files,
            phase: JobPhase::Uploading,
            transport_pct: 0.0,
            server_pct: 0.0,
            completed_count: None,
            total_count: None,
            high_water: 0.0,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }

    /// Record transport progress from a bytes-sent fraction in [0, 1].
    pub fn record_transport_progress(&mut self, fraction: f64) {
        let pct = (fraction.clamp(0.0, 1.0) * 100.0).round();
        self.transport_pct = self.transport_pct.max(pct);
    }

    /// Record a poll update. Server progress may only move forward.
    pub fn record_server_progress(
        &mut self,
        pct: f64,
        completed: Option<u32>,
        total: Option<u32>,
    ) {
        self.server_pct = self.server_pct.max(pct.clamp(0.0, 100.0));
        if completed.is_some() {
            self.completed_count = completed;
        }
        if total.is_some() {
            self.total_count = total;
        }
    }

    /// Combined progress on the 0..100 scale, monotonically non-decreasing
    /// over the life of the job. Reaches exactly 100 only once the job
    /// completes; a failed job holds its last observed value.
    pub fn combined_progress(&mut self) -> f64 {
        let raw = match self.phase {
            JobPhase::Idle => 0.0,
            JobPhase::Uploading => (0.5 * self.transport_pct).min(50.0),
            JobPhase::Processing => (50.0 + 0.5 * self.server_pct).min(100.0),
            JobPhase::Completed => 100.0,
            JobPhase::Failed => self.high_water,
        };
        self.high_water = self.high_water.max(raw);
        self.high_water
    }
}
