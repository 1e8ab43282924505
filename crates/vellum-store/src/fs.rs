use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use vellum_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject};
use crate::traits::ObjectStore;

const OBJECTS_DIR: &str = "objects";

/// Filesystem object store.
///
/// Layout: `<root>/objects/<first 2 hex>/<remaining 62 hex>`, one file per
/// object holding the kind tag, a newline, then the raw data. Files are
/// written to a temporary sibling and renamed into place, so a crash never
/// leaves a half-written object behind.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(OBJECTS_DIR))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.root.join(OBJECTS_DIR).join(&hex[..2]).join(&hex[2..])
    }

    fn write_object_atomic(&self, path: &Path, object: &StoredObject) -> StoreResult<()> {
        let dir = path.parent().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "object path has no parent")
        })?;
        fs::create_dir_all(dir)?;

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(object.kind.as_str().as_bytes())?;
        temp.write_all(b"\n")?;
        temp.write_all(&object.data)?;
        temp.flush()?;
        temp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    fn decode_file(id: &ObjectId, bytes: &[u8]) -> StoreResult<StoredObject> {
        let corrupt = |reason: &str| StoreError::CorruptObject {
            id: *id,
            reason: reason.to_string(),
        };
        let split = bytes
            .iter()
            .position(|b| *b == b'\n')
            .ok_or_else(|| corrupt("missing kind header"))?;
        let tag = std::str::from_utf8(&bytes[..split]).map_err(|_| corrupt("non-utf8 kind"))?;
        let kind = ObjectKind::parse(tag).ok_or_else(|| corrupt("unknown kind"))?;
        Ok(StoredObject::new(kind, bytes[split + 1..].to_vec()))
    }
}

impl ObjectStore for FsObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let bytes = match fs::read(self.object_path(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let object = Self::decode_file(id, &bytes)?;
        let computed = object.compute_id();
        if computed != *id {
            warn!(
                id = %id.short_hex(),
                computed = %computed.short_hex(),
                "object failed hash check"
            );
            return Err(StoreError::HashMismatch { id: *id, computed });
        }
        Ok(Some(object))
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        let path = self.object_path(&id);
        if path.exists() {
            return Ok(id);
        }
        self.write_object_atomic(&path, object)?;
        debug!(id = %id.short_hex(), kind = %object.kind, size = object.size, "wrote object");
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(id).is_file())
    }

    fn list_ids(&self) -> StoreResult<Vec<ObjectId>> {
        let mut ids = Vec::new();
        for shard in fs::read_dir(self.root.join(OBJECTS_DIR))? {
            let shard = shard?;
            if !shard.file_type()?.is_dir() {
                continue;
            }
            let prefix = shard.file_name().to_string_lossy().into_owned();
            for entry in fs::read_dir(shard.path())? {
                let entry = entry?;
                let name = format!("{prefix}{}", entry.file_name().to_string_lossy());
                // Leftover temp files and foreign names are skipped.
                if let Ok(id) = name.parse::<ObjectId>() {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

impl std::fmt::Debug for FsObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsObjectStore")
            .field("root", &self.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Blob;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, FsObjectStore) {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn write_then_read() {
        let (_dir, store) = open_store();
        let obj = Blob::new(b"\"persisted\"".to_vec()).to_stored_object();
        let id = store.write(&obj).unwrap();
        assert!(store.exists(&id).unwrap());
        assert_eq!(store.read(&id).unwrap(), Some(obj));
    }

    #[test]
    fn sharded_layout() {
        let (dir, store) = open_store();
        let id = store
            .write(&Blob::new(b"layout".to_vec()).to_stored_object())
            .unwrap();
        let hex = id.to_hex();
        let path = dir.path().join("objects").join(&hex[..2]).join(&hex[2..]);
        let bytes = fs::read(path).unwrap();
        assert!(bytes.starts_with(b"blob\n"));
    }

    #[test]
    fn missing_object_is_none() {
        let (_dir, store) = open_store();
        assert_eq!(store.read(&ObjectId::digest(b"nope")).unwrap(), None);
        assert!(!store.exists(&ObjectId::digest(b"nope")).unwrap());
    }

    #[test]
    fn reopen_sees_existing_objects() {
        let dir = TempDir::new().unwrap();
        let id = {
            let store = FsObjectStore::open(dir.path()).unwrap();
            store
                .write(&Blob::new(b"durable".to_vec()).to_stored_object())
                .unwrap()
        };
        let store = FsObjectStore::open(dir.path()).unwrap();
        assert!(store.read(&id).unwrap().is_some());
        assert_eq!(store.list_ids().unwrap(), vec![id]);
    }

    #[test]
    fn tampered_file_fails_hash_check() {
        let (dir, store) = open_store();
        let id = store
            .write(&Blob::new(b"original".to_vec()).to_stored_object())
            .unwrap();
        let hex = id.to_hex();
        let path = dir.path().join("objects").join(&hex[..2]).join(&hex[2..]);
        fs::write(&path, b"blob\ntampered").unwrap();

        let err = store.read(&id).unwrap_err();
        assert!(matches!(err, StoreError::HashMismatch { .. }));
    }

    #[test]
    fn list_ids_skips_stray_files() {
        let (dir, store) = open_store();
        let a = store.write(&Blob::new(b"a".to_vec()).to_stored_object()).unwrap();
        let b = store.write(&Blob::new(b"b".to_vec()).to_stored_object()).unwrap();
        fs::write(dir.path().join("objects").join("README"), b"x").unwrap();

        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(store.list_ids().unwrap(), expected);
        assert!(!store.is_empty().unwrap());
    }

    #[test]
    fn rewrite_is_noop() {
        let (_dir, store) = open_store();
        let obj = Blob::new(b"same".to_vec()).to_stored_object();
        assert_eq!(store.write(&obj).unwrap(), store.write(&obj).unwrap());
        assert_eq!(store.list_ids().unwrap().len(), 1);
    }
}
