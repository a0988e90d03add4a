//! Cached mirrors of server-owned entity lists.
//!
//! Plain invalidate-and-refetch semantics: the cache holds the last server
//! response and nothing is derived from it. Out-of-band notifications patch
//! the cached list in place; the next refresh replaces it wholesale.

use std::sync::Arc;

use tokio::sync::RwLock;

use corpora_core::models::{Category, DocumentNotification};
use corpora_core::{OrganizationFile, UploadError};

use crate::backend::CatalogBackend;

/// Mirror of the ingested-file list.
pub struct FileRepository {
    backend: Arc<dyn CatalogBackend>,
    cache: RwLock<Option<Vec<OrganizationFile>>>,
}

impl FileRepository {
    pub fn new(backend: Arc<dyn CatalogBackend>) -> Self {
        Self {
            backend,
            cache: RwLock::new(None),
        }
    }

    /// Cached list, fetching on first use or after invalidation.
    pub async fn get(&self) -> Result<Vec<OrganizationFile>, UploadError> {
        if let Some(files) = self.cache.read().await.as_ref() {
            return Ok(files.clone());
        }
        self.refresh().await
    }

    /// Fetch from the server and replace the cache.
    pub async fn refresh(&self) -> Result<Vec<OrganizationFile>, UploadError> {
        let files = self.backend.list_files().await?;
        *self.cache.write().await = Some(files.clone());
        Ok(files)
    }

    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    /// Delete server-side, then drop the cache so the next read refetches.
    pub async fn delete(&self, id: &str) -> Result<(), UploadError> {
        self.backend.delete_file(id).await?;
        self.invalidate().await;
        Ok(())
    }

    /// Apply an out-of-band update to the cached list. A cold cache is left
    /// alone; the next read fetches fresh data anyway.
    pub async fn apply(&self, notification: DocumentNotification) {
        let mut guard = self.cache.write().await;
        let Some(files) = guard.as_mut() else {
            return;
        };
        match notification {
            DocumentNotification::Upserted(file) => {
                match files.iter_mut().find(|f| f.id == file.id) {
                    Some(existing) => *existing = file,
                    None => files.push(file),
                }
            }
            DocumentNotification::Removed { id } => {
                files.retain(|f| f.id != id);
            }
        }
    }
}

/// Mirror of the category list.
pub struct CategoryRepository {
    backend: Arc<dyn CatalogBackend>,
    cache: RwLock<Option<Vec<Category>>>,
}

impl CategoryRepository {
    pub fn new(backend: Arc<dyn CatalogBackend>) -> Self {
        Self {
            backend,
            cache: RwLock::new(None),
        }
    }

    pub async fn get(&self) -> Result<Vec<Category>, UploadError> {
        if let Some(categories) = self.cache.read().await.as_ref() {
            return Ok(categories.clone());
        }
        self.refresh().await
    }

    pub async fn refresh(&self) -> Result<Vec<Category>, UploadError> {
        let categories = self.backend.list_categories().await?;
        *self.cache.write().await = Some(categories.clone());
        Ok(categories)
    }

    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }
}
