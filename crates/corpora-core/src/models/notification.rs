use serde::{Deserialize, Serialize};

use super::file::OrganizationFile;

/// Unsolicited file-record update pushed by the server outside the upload
/// flow (the `document_notify` side channel). Applied to the client-side file
/// mirror; never touches an active upload job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum DocumentNotification {
    /// A file record was created or changed (e.g. a stage transition).
    Upserted(OrganizationFile),
    /// A file record was removed server-side.
    Removed { id: String },
}
