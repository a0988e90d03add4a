//! Multipart upload transport with byte-counting progress.
//!
//! Each file part streams through a counter shared across the whole batch, so
//! the progress callback sees one bytes-sent/bytes-total fraction for the
//! entire payload regardless of how many files it contains.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use tokio_util::io::ReaderStream;

use corpora_core::models::file::mime_for_extension;
use corpora_core::{PendingFile, UploadError, UploadMetadata};

use crate::backend::ProgressFn;

/// Chunk size for in-memory sources, so progress stays granular.
const MEMORY_CHUNK_SIZE: usize = 64 * 1024;

/// A validated file plus the place its bytes come from.
#[derive(Debug, Clone)]
pub struct UploadSource {
    pub file: PendingFile,
    data: SourceData,
}

#[derive(Debug, Clone)]
enum SourceData {
    Path(PathBuf),
    Memory(Bytes),
}

impl UploadSource {
    /// Build a source from a local file, taking the size from the filesystem
    /// and the MIME type from the extension.
    pub async fn from_path(path: &Path) -> Result<Self, UploadError> {
        let meta = tokio::fs::metadata(path).await.map_err(|e| {
            UploadError::InvalidInput(format!("Cannot read {}: {}", path.display(), e))
        })?;
        if !meta.is_file() {
            return Err(UploadError::InvalidInput(format!(
                "Not a file: {}",
                path.display()
            )));
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                UploadError::InvalidInput(format!("Invalid file name: {}", path.display()))
            })?
            .to_string();
        let file = pending_file(name, meta.len());

        Ok(Self {
            file,
            data: SourceData::Path(path.to_path_buf()),
        })
    }

    /// Build a source from bytes already in memory (e.g. a document fetched
    /// from a remote URL before ingestion).
    pub fn from_bytes(name: impl Into<String>, data: Bytes) -> Self {
        let file = pending_file(name.into(), data.len() as u64);
        Self {
            file,
            data: SourceData::Memory(data),
        }
    }

    async fn byte_stream(
        &self,
    ) -> Result<Box<dyn Stream<Item = io::Result<Bytes>> + Send + Unpin>, UploadError> {
        match &self.data {
            SourceData::Path(path) => {
                let file = tokio::fs::File::open(path).await.map_err(|e| {
                    UploadError::InvalidInput(format!("Cannot open {}: {}", path.display(), e))
                })?;
                Ok(Box::new(ReaderStream::new(file)))
            }
            SourceData::Memory(bytes) => {
                let chunks: Vec<io::Result<Bytes>> = bytes
                    .chunks(MEMORY_CHUNK_SIZE)
                    .map(|c| Ok(Bytes::copy_from_slice(c)))
                    .collect();
                Ok(Box::new(futures::stream::iter(chunks)))
            }
        }
    }
}

fn pending_file(name: String, size_bytes: u64) -> PendingFile {
    let mime = name
        .rfind('.')
        .map(|idx| mime_for_extension(&name[idx + 1..]))
        .unwrap_or("application/octet-stream");
    PendingFile::new(name, size_bytes, mime)
}

/// Shared bytes-sent counter for one multipart submission.
struct ProgressCounter {
    sent: AtomicU64,
    total: u64,
    on_progress: ProgressFn,
}

impl ProgressCounter {
    fn new(total: u64, on_progress: ProgressFn) -> Self {
        Self {
            sent: AtomicU64::new(0),
            total,
            on_progress,
        }
    }

    fn add(&self, bytes: u64) {
        let sent = self.sent.fetch_add(bytes, Ordering::Relaxed) + bytes;
        let fraction = if self.total == 0 {
            1.0
        } else {
            (sent as f64 / self.total as f64).clamp(0.0, 1.0)
        };
        (self.on_progress)(fraction);
    }
}

/// Build the multipart form for a submission: the scalar metadata fields plus
/// one streaming part per file under `field_name`. Tags go over the wire as a
/// JSON array.
pub(crate) async fn multipart_form(
    field_name: &'static str,
    sources: &[UploadSource],
    metadata: &UploadMetadata,
    on_progress: ProgressFn,
) -> Result<Form, UploadError> {
    let total: u64 = sources.iter().map(|s| s.file.size_bytes).sum();
    let counter = Arc::new(ProgressCounter::new(total, on_progress));

    let mut form = Form::new()
        .text("category_id", metadata.category_id.clone())
        .text("tags", metadata.tags_json()?);

    for source in sources {
        let counter = counter.clone();
        let counted = source.byte_stream().await?.map(move |chunk| {
            if let Ok(bytes) = &chunk {
                counter.add(bytes.len() as u64);
            }
            chunk
        });
        let part = Part::stream_with_length(Body::wrap_stream(counted), source.file.size_bytes)
            .file_name(source.file.name.clone())
            .mime_str(&source.file.mime_type)
            .map_err(|e| UploadError::Internal(format!("Invalid MIME type: {}", e)))?;
        form = form.part(field_name, part);
    }

    Ok(form)
}
