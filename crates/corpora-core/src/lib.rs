//! Corpora Core Library
//!
//! This crate provides the domain models, error types, configuration, and file
//! validation shared across all Corpora components.

pub mod config;
pub mod error;
pub mod metadata;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, UploadMode};
pub use error::UploadError;
pub use metadata::UploadMetadata;
pub use models::file::{format_file_size, OrganizationFile, PendingFile};
pub use models::job::{JobOutcome, JobPhase, UploadJob, UploadStatusResponse};
pub use validation::{validate_files, AllowList, Validated};
