//! The document index: a flat `id → type` table.
//!
//! Repositories know nothing about document types. The index records the
//! type after every save or promotion so a document can be reopened by id
//! alone, and it is the list of documents a bulk dump walks.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;
use vellum_types::DocumentId;

use crate::error::{DocumentError, DocumentResult};

/// Lookup table from document id to type.
pub trait DocumentIndex: Send + Sync {
    /// Record (or re-record) a document's type.
    fn register(&self, id: &DocumentId, type_tag: &str) -> DocumentResult<()>;

    /// The type recorded for `id`, if any.
    fn lookup(&self, id: &DocumentId) -> DocumentResult<Option<String>>;

    /// Every registered document with its type, sorted by id.
    fn documents(&self) -> DocumentResult<Vec<(DocumentId, String)>>;
}

fn poisoned<E: std::fmt::Display>(e: E) -> DocumentError {
    DocumentError::Index(format!("lock poisoned: {e}"))
}

// ---------------------------------------------------------------------------
// In memory
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InMemoryDocumentIndex {
    entries: RwLock<BTreeMap<DocumentId, String>>,
}

impl InMemoryDocumentIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentIndex for InMemoryDocumentIndex {
    fn register(&self, id: &DocumentId, type_tag: &str) -> DocumentResult<()> {
        self.entries
            .write()
            .map_err(poisoned)?
            .insert(id.clone(), type_tag.to_string());
        Ok(())
    }

    fn lookup(&self, id: &DocumentId) -> DocumentResult<Option<String>> {
        Ok(self.entries.read().map_err(poisoned)?.get(id).cloned())
    }

    fn documents(&self) -> DocumentResult<Vec<(DocumentId, String)>> {
        Ok(self
            .entries
            .read()
            .map_err(poisoned)?
            .iter()
            .map(|(id, t)| (id.clone(), t.clone()))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexEntry {
    #[serde(rename = "type")]
    type_tag: String,
}

/// Index persisted as one JSON object `{ "<id>": { "type": "<type>" } }`.
///
/// The file is rewritten whole on every registration through a temporary
/// sibling and an atomic rename.
#[derive(Debug)]
pub struct JsonFileDocumentIndex {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileDocumentIndex {
    /// File name used inside a storage directory.
    pub const FILE_NAME: &'static str = "index.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// The index for a storage directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> DocumentResult<BTreeMap<String, IndexEntry>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| DocumentError::Index(format!("{}: {e}", self.path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, IndexEntry>) -> DocumentResult<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;
        let bytes = serde_json::to_vec_pretty(entries)
            .map_err(|e| DocumentError::Index(e.to_string()))?;
        let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
        temp.write_all(&bytes)?;
        temp.flush()?;
        temp.persist(&self.path)
            .map_err(|e| DocumentError::Io(e.error))?;
        Ok(())
    }
}

impl DocumentIndex for JsonFileDocumentIndex {
    fn register(&self, id: &DocumentId, type_tag: &str) -> DocumentResult<()> {
        let _guard = self.write_lock.lock().map_err(poisoned)?;
        let mut entries = self.read_all()?;
        if entries.get(id.as_str()).map(|e| e.type_tag.as_str()) == Some(type_tag) {
            return Ok(());
        }
        entries.insert(
            id.to_string(),
            IndexEntry {
                type_tag: type_tag.to_string(),
            },
        );
        self.write_all(&entries)?;
        debug!(document = %id, type_tag, "registered document");
        Ok(())
    }

    fn lookup(&self, id: &DocumentId) -> DocumentResult<Option<String>> {
        Ok(self.read_all()?.remove(id.as_str()).map(|e| e.type_tag))
    }

    fn documents(&self) -> DocumentResult<Vec<(DocumentId, String)>> {
        self.read_all()?
            .into_iter()
            .map(|(id, e)| -> DocumentResult<(DocumentId, String)> {
                Ok((DocumentId::parse(id)?, e.type_tag))
            })
            .collect()
    }
}
