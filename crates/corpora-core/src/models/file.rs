use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A locally selected file awaiting upload. Exists only in client memory;
/// discarded on submit or explicit removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

impl PendingFile {
    pub fn new(name: impl Into<String>, size_bytes: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Lowercased extension: the substring after the last `.`, if any.
    pub fn extension(&self) -> Option<String> {
        let idx = self.name.rfind('.')?;
        let ext = &self.name[idx + 1..];
        if ext.is_empty() {
            None
        } else {
            Some(ext.to_lowercase())
        }
    }

    pub fn size_label(&self) -> String {
        format_file_size(self.size_bytes)
    }
}

/// MIME type for a file extension. Browser-reported types are unreliable for
/// office formats, so this covers the formats the ingestion backend accepts
/// and falls back to a generic binary type.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "html" => "text/html",
        "xml" => "application/xml",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "mp3" => "audio/mpeg",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

/// Human-readable size with one decimal place ("2.4 MB").
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

/// Server-owned record of an ingested document, mirrored client-side.
/// The client only reads and deletes these; `current_stage` semantics are
/// opaque to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationFile {
    pub id: String,
    pub filename: String,
    pub category_id: String,
    pub size_bytes: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<String>,
    pub created_at: DateTime<Utc>,
}
