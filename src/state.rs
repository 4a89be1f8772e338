use std::sync::Arc;

use crate::config::{SiteConfig, StorageConfig};
use crate::storage::{FileService, MemoryObjectStore, ObjectStore};
use crate::store::{DocumentStore, MemoryDocumentStore};

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<dyn DocumentStore>,
    pub files: FileService,
    pub site: SiteConfig,
}

impl AppState {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        objects: Arc<dyn ObjectStore>,
        storage: &StorageConfig,
        site: SiteConfig,
    ) -> Self {
        Self {
            files: FileService::new(objects, documents.clone(), storage),
            documents,
            site,
        }
    }

    /// Process-local stores. Used when no database or bucket is configured,
    /// and by the router tests.
    pub fn in_memory(storage: &StorageConfig, site: SiteConfig) -> Self {
        Self::new(
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(MemoryObjectStore::new()),
            storage,
            site,
        )
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.documents.as_ref()
    }
}
