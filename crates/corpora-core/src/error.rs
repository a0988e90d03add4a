//! Error types module
//!
//! All failures of the upload/ingestion flow are unified under [`UploadError`].
//! Validation errors never reach the network layer; transport and poll errors
//! are terminal for the job they belong to.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("None of the selected files match the allow-list")]
    NoValidFiles,

    #[error("Missing metadata: {0}")]
    MissingMetadata(String),

    #[error("Upload rejected with status {status}: {message}")]
    Transport { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Status poll failed: {0}")]
    Poll(String),

    #[error("Job exceeded the {0}s time limit")]
    Timeout(u64),

    #[error("An upload job is already in progress")]
    JobActive,

    #[error("Upload cancelled")]
    Cancelled,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UploadError {
    /// True for errors resolved locally, before any request is issued.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            UploadError::NoValidFiles
                | UploadError::MissingMetadata(_)
                | UploadError::InvalidInput(_)
        )
    }

    /// Whether retrying the same submission could plausibly succeed.
    /// Validation errors need different input; everything else is a
    /// server/network condition that may have cleared.
    pub fn is_retryable(&self) -> bool {
        !self.is_validation() && !matches!(self, UploadError::Cancelled)
    }

    /// Message suitable for the failure notification shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            UploadError::Transport { message, .. } if !message.is_empty() => message.clone(),
            UploadError::Transport { status, .. } => {
                format!("Upload rejected by the server (HTTP {})", status)
            }
            other => other.to_string(),
        }
    }
}

impl From<io::Error> for UploadError {
    fn from(err: io::Error) -> Self {
        UploadError::InvalidInput(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for UploadError {
    fn from(err: serde_json::Error) -> Self {
        UploadError::Internal(format!("JSON error: {}", err))
    }
}
