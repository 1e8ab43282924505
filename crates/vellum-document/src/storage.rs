use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;
use vellum_types::DocumentId;

use crate::config::{Backend, StorageConfig};
use crate::error::{DocumentError, DocumentResult};
use crate::index::{DocumentIndex, InMemoryDocumentIndex, JsonFileDocumentIndex};
use crate::repository::Repository;

/// Hands out one [`Repository`] per document id, plus the shared index.
///
/// With the filesystem backend each document gets `storage_path/<id>/`;
/// with the memory backend repositories live as long as the `Storage`.
/// Either way a repository is opened once and shared by every caller, and
/// clones of a `Storage` share the same repositories and index.
#[derive(Clone)]
pub struct Storage {
    config: StorageConfig,
    index: Arc<dyn DocumentIndex>,
    repositories: Arc<Mutex<HashMap<DocumentId, Repository>>>,
}

impl Storage {
    /// Build storage and the index matching the backend: in memory, or
    /// `index.json` under `storage_path`.
    pub fn new(config: StorageConfig) -> DocumentResult<Self> {
        config.validate()?;
        let index: Arc<dyn DocumentIndex> = match config.backend {
            Backend::Memory => Arc::new(InMemoryDocumentIndex::new()),
            Backend::Filesystem => Arc::new(JsonFileDocumentIndex::in_dir(&config.storage_path)),
        };
        Ok(Self::with_index(config, index))
    }

    pub fn with_index(config: StorageConfig, index: Arc<dyn DocumentIndex>) -> Self {
        Self {
            config,
            index,
            repositories: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn index(&self) -> &Arc<dyn DocumentIndex> {
        &self.index
    }

    fn repository_dir(&self, id: &DocumentId) -> PathBuf {
        self.config.storage_path.join(id.as_str())
    }

    fn repositories(&self) -> DocumentResult<MutexGuard<'_, HashMap<DocumentId, Repository>>> {
        self.repositories
            .lock()
            .map_err(|e| DocumentError::Index(format!("lock poisoned: {e}")))
    }

    /// The repository for `id`, created if it does not exist yet.
    pub fn open_or_create(&self, id: &DocumentId) -> DocumentResult<Repository> {
        let mut repositories = self.repositories()?;
        if let Some(repo) = repositories.get(id) {
            return Ok(repo.clone());
        }
        let repo = match self.config.backend {
            Backend::Memory => Repository::in_memory(),
            Backend::Filesystem => Repository::open_dir(self.repository_dir(id))?,
        }
        .with_draft_state(self.config.draft_state.clone());
        repositories.insert(id.clone(), repo.clone());
        debug!(document = %id, "opened repository");
        Ok(repo)
    }

    /// The repository for `id`, or `None` if there is none. Never creates
    /// anything.
    pub fn open(&self, id: &DocumentId) -> DocumentResult<Option<Repository>> {
        if let Some(repo) = self.repositories()?.get(id) {
            return Ok(Some(repo.clone()));
        }
        match self.config.backend {
            Backend::Filesystem if self.repository_dir(id).is_dir() => {
                self.open_or_create(id).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Registered documents and their types.
    pub fn documents(&self) -> DocumentResult<Vec<(DocumentId, String)>> {
        self.index.documents()
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_storage() -> Storage {
        Storage::new(StorageConfig {
            backend: Backend::Memory,
            ..StorageConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn memory_backend_shares_repositories_per_id() {
        let storage = memory_storage();
        let id = DocumentId::parse("doc1").unwrap();
        assert!(storage.open(&id).unwrap().is_none());

        let repo = storage.open_or_create(&id).unwrap();
        repo.refs()
            .create_ref("refs/heads/master", vellum_types::ObjectId::digest(b"c"))
            .unwrap();

        let again = storage.open(&id).unwrap().unwrap();
        assert!(again.tip("master").unwrap().is_some());
    }

    #[test]
    fn filesystem_backend_uses_one_directory_per_document() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = Storage::new(StorageConfig {
            storage_path: dir.path().to_path_buf(),
            ..StorageConfig::default()
        })
        .unwrap();
        let id = DocumentId::parse("doc1").unwrap();

        assert!(storage.open(&id).unwrap().is_none());
        storage.open_or_create(&id).unwrap();
        assert!(dir.path().join("doc1").is_dir());
        assert!(storage.open(&id).unwrap().is_some());
    }

    #[test]
    fn filesystem_handles_share_one_ref_table() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = Storage::new(StorageConfig {
            storage_path: dir.path().to_path_buf(),
            ..StorageConfig::default()
        })
        .unwrap();
        let id = DocumentId::parse("doc1").unwrap();

        let first = storage.open_or_create(&id).unwrap();
        let second = storage.clone().open_or_create(&id).unwrap();
        assert!(Arc::ptr_eq(first.refs(), second.refs()));
        assert!(Arc::ptr_eq(
            first.refs(),
            storage.open(&id).unwrap().unwrap().refs()
        ));
    }

    #[test]
    fn open_does_not_create() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = Storage::new(StorageConfig {
            storage_path: dir.path().to_path_buf(),
            ..StorageConfig::default()
        })
        .unwrap();
        let id = DocumentId::parse("ghost").unwrap();
        assert!(storage.open(&id).unwrap().is_none());
        assert!(!dir.path().join("ghost").exists());
    }

    #[test]
    fn draft_state_comes_from_config() {
        let storage = Storage::new(StorageConfig {
            backend: Backend::Memory,
            draft_state: "draft".into(),
            ..StorageConfig::default()
        })
        .unwrap();
        let repo = storage
            .open_or_create(&DocumentId::parse("d").unwrap())
            .unwrap();
        assert_eq!(repo.draft_state(), "draft");
    }

    #[test]
    fn invalid_config_rejected() {
        let err = Storage::new(StorageConfig {
            draft_state: String::new(),
            ..StorageConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, DocumentError::Config(_)));
    }
}
