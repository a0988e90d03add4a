//! Allow-list validation of selected files.
//!
//! A file is accepted when its declared MIME type OR its extension is
//! allow-listed. The OR is deliberate: reported MIME types are unreliable for
//! some office/document formats, so either signal is enough.

use std::collections::HashSet;

use crate::error::UploadError;
use crate::models::file::PendingFile;

/// The combined set of accepted MIME types and file extensions.
#[derive(Debug, Clone)]
pub struct AllowList {
    extensions: HashSet<String>,
    mime_types: HashSet<String>,
}

impl AllowList {
    pub fn new(
        extensions: impl IntoIterator<Item = String>,
        mime_types: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            extensions: extensions.into_iter().map(|s| s.to_lowercase()).collect(),
            mime_types: mime_types.into_iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    pub fn permits_extension(&self, ext: &str) -> bool {
        self.extensions.contains(&ext.to_lowercase())
    }

    pub fn permits_mime_type(&self, mime: &str) -> bool {
        self.mime_types.contains(&mime.to_lowercase())
    }

    pub fn permits(&self, file: &PendingFile) -> bool {
        if self.permits_mime_type(&file.mime_type) {
            return true;
        }
        file.extension()
            .map(|ext| self.permits_extension(&ext))
            .unwrap_or(false)
    }
}

/// Result of validating a selection. `rejected` holds the names of files that
/// failed the allow-list check; a non-empty value is the partial-rejection
/// signal for a user-visible warning, not an error.
#[derive(Debug, Clone)]
pub struct Validated {
    pub accepted: Vec<PendingFile>,
    pub rejected: Vec<String>,
}

impl Validated {
    pub fn has_rejections(&self) -> bool {
        !self.rejected.is_empty()
    }
}

/// Filter a selection against the allow-list.
///
/// An empty input yields an empty result. A non-empty input where nothing
/// passes fails with [`UploadError::NoValidFiles`]. Pure: all state mutation
/// happens in the caller.
pub fn validate_files(
    files: Vec<PendingFile>,
    allow_list: &AllowList,
) -> Result<Validated, UploadError> {
    let total = files.len();
    let mut accepted = Vec::with_capacity(total);
    let mut rejected = Vec::new();

    for file in files {
        if allow_list.permits(&file) {
            accepted.push(file);
        } else {
            rejected.push(file.name);
        }
    }

    if total > 0 && accepted.is_empty() {
        return Err(UploadError::NoValidFiles);
    }

    Ok(Validated { accepted, rejected })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow_list() -> AllowList {
        AllowList::new(
            ["pdf".to_string(), "md".to_string()],
            ["application/pdf".to_string(), "text/markdown".to_string()],
        )
    }

    fn pdf(name: &str) -> PendingFile {
        PendingFile::new(name, 100, "application/pdf")
    }

    #[test]
    fn all_valid_files_pass_with_no_rejections() {
        let files = vec![pdf("a.pdf"), pdf("b.pdf"), pdf("c.pdf")];
        let result = validate_files(files, &allow_list()).unwrap();
        assert_eq!(result.accepted.len(), 3);
        assert!(!result.has_rejections());
    }

    #[test]
    fn mixed_selection_accepts_subset_and_signals_rejection() {
        let files = vec![
            pdf("a.pdf"),
            PendingFile::new("virus.exe", 100, "application/x-msdownload"),
        ];
        let result = validate_files(files, &allow_list()).unwrap();
        assert_eq!(result.accepted.len(), 1);
        assert_eq!(result.rejected, vec!["virus.exe"]);
        assert!(result.has_rejections());
    }

    #[test]
    fn all_invalid_selection_fails() {
        let files = vec![
            PendingFile::new("a.exe", 100, "application/x-msdownload"),
            PendingFile::new("b.bin", 100, "application/octet-stream"),
        ];
        let err = validate_files(files, &allow_list()).unwrap_err();
        assert!(matches!(err, UploadError::NoValidFiles));
    }

    #[test]
    fn empty_selection_is_ok_and_empty() {
        let result = validate_files(Vec::new(), &allow_list()).unwrap();
        assert!(result.accepted.is_empty());
        assert!(!result.has_rejections());
    }

    #[test]
    fn extension_alone_is_sufficient() {
        // Browsers often report a generic MIME type for markdown.
        let file = PendingFile::new("notes.md", 100, "application/octet-stream");
        let result = validate_files(vec![file], &allow_list()).unwrap();
        assert_eq!(result.accepted.len(), 1);
    }

    #[test]
    fn mime_type_alone_is_sufficient() {
        let file = PendingFile::new("download", 100, "application/pdf");
        let result = validate_files(vec![file], &allow_list()).unwrap();
        assert_eq!(result.accepted.len(), 1);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let file = PendingFile::new("REPORT.PDF", 100, "Application/PDF");
        assert!(allow_list().permits(&file));
    }
}
