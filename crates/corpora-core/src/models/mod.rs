//! Domain and wire models.

pub mod category;
pub mod file;
pub mod job;
pub mod notification;

pub use category::Category;
pub use file::{format_file_size, OrganizationFile, PendingFile};
pub use job::{JobOutcome, JobPhase, JobStatus, UploadJob, UploadStatusResponse};
pub use notification::DocumentNotification;
