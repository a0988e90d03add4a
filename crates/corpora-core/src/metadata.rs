//! Upload form metadata: the target category and optional tags.

use serde::{Deserialize, Serialize};

use crate::error::UploadError;

/// Metadata attached to a submission. The category is required; tags are an
/// ordered, deduplicated sequence of non-empty strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub category_id: String,
    pub tags: Vec<String>,
}

impl UploadMetadata {
    pub fn new(category_id: impl Into<String>) -> Self {
        Self {
            category_id: category_id.into(),
            tags: Vec::new(),
        }
    }

    /// Add a tag, trimming whitespace. Empty and duplicate tags are rejected.
    pub fn add_tag(&mut self, tag: &str) -> Result<(), UploadError> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(UploadError::InvalidInput("Tag must not be empty".into()));
        }
        if self.tags.iter().any(|t| t == tag) {
            return Err(UploadError::InvalidInput(format!(
                "Tag already exists: {}",
                tag
            )));
        }
        self.tags.push(tag.to_string());
        Ok(())
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    /// Submission gate: the category must be chosen before an upload starts.
    pub fn ensure_complete(&self) -> Result<(), UploadError> {
        if self.category_id.trim().is_empty() {
            return Err(UploadError::MissingMetadata(
                "A category must be selected".into(),
            ));
        }
        Ok(())
    }

    /// Canonical wire encoding of the tag list: a JSON array.
    pub fn tags_json(&self) -> Result<String, UploadError> {
        Ok(serde_json::to_string(&self.tags)?)
    }
}
