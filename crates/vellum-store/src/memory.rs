use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;
use vellum_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. All objects are held in memory behind a
/// `RwLock` for safe concurrent access. Objects are cloned on read/write.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Poisoned(e.to_string())
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.objects.read().map_err(poisoned)?.len())
    }

    /// Total bytes across all stored objects.
    pub fn total_bytes(&self) -> StoreResult<u64> {
        Ok(self
            .objects
            .read()
            .map_err(poisoned)?
            .values()
            .map(|obj| obj.size)
            .sum())
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let map = self.objects.read().map_err(poisoned)?;
        Ok(map.get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        let mut map = self.objects.write().map_err(poisoned)?;
        map.entry(id).or_insert_with(|| {
            debug!(id = %id.short_hex(), kind = %object.kind, size = object.size, "stored object");
            object.clone()
        });
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.objects.read().map_err(poisoned)?;
        Ok(map.contains_key(id))
    }

    fn list_ids(&self) -> StoreResult<Vec<ObjectId>> {
        let map = self.objects.read().map_err(poisoned)?;
        let mut ids: Vec<ObjectId> = map.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.objects.read().map_err(poisoned)?.is_empty())
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len().ok())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::object::*;

    fn make_blob(content: &[u8]) -> StoredObject {
        Blob::new(content.to_vec()).to_stored_object()
    }

    // -----------------------------------------------------------------------
    // Core read/write
    // -----------------------------------------------------------------------

    #[test]
    fn write_and_read_blob() {
        let store = InMemoryObjectStore::new();
        let obj = make_blob(b"hello world");
        let id = store.write(&obj).unwrap();

        let read_back = store.read(&id).unwrap().expect("should exist");
        assert_eq!(read_back, obj);
    }

    #[test]
    fn write_and_read_tree() {
        let store = InMemoryObjectStore::new();
        let blob_id = store.write(&make_blob(b"content")).unwrap();
        let obj = Tree::for_content(blob_id).to_stored_object().unwrap();
        let id = store.write(&obj).unwrap();

        let tree = Tree::from_stored_object(&store.get(&id).unwrap()).unwrap();
        assert_eq!(tree.content_id(), Some(blob_id));
    }

    #[test]
    fn read_missing_object_returns_none() {
        let store = InMemoryObjectStore::new();
        assert!(store.read(&ObjectId::digest(b"missing")).unwrap().is_none());
    }

    #[test]
    fn get_missing_object_is_not_found() {
        let store = InMemoryObjectStore::new();
        let id = ObjectId::digest(b"missing");
        let err = store.get(&id).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(missing) if missing == id));
    }

    // -----------------------------------------------------------------------
    // Content-addressing correctness
    // -----------------------------------------------------------------------

    #[test]
    fn write_is_idempotent() {
        let store = InMemoryObjectStore::new();
        let id1 = store.write(&make_blob(b"identical content")).unwrap();
        let id2 = store.write(&make_blob(b"identical content")).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn different_content_produces_different_ids() {
        let store = InMemoryObjectStore::new();
        let id1 = store.write(&make_blob(b"aaa")).unwrap();
        let id2 = store.write(&make_blob(b"bbb")).unwrap();
        assert_ne!(id1, id2);
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn stored_object_hash_matches_id() {
        let store = InMemoryObjectStore::new();
        let id = store.write(&make_blob(b"verify me")).unwrap();
        assert_eq!(store.get(&id).unwrap().compute_id(), id);
    }

    // -----------------------------------------------------------------------
    // Verified writes
    // -----------------------------------------------------------------------

    #[test]
    fn write_verified_accepts_matching_id() {
        let store = InMemoryObjectStore::new();
        let obj = make_blob(b"replayed");
        let id = store.write_verified(&obj, &obj.compute_id()).unwrap();
        assert!(store.exists(&id).unwrap());
    }

    #[test]
    fn write_verified_rejects_mismatch_without_writing() {
        let store = InMemoryObjectStore::new();
        let obj = make_blob(b"tampered");
        let recorded = ObjectId::digest(b"something else");
        let err = store.write_verified(&obj, &recorded).unwrap_err();
        assert!(matches!(err, StoreError::CorruptWrite { expected, .. } if expected == recorded));
        assert!(store.is_empty().unwrap());
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    #[test]
    fn list_ids_is_sorted() {
        let store = InMemoryObjectStore::new();
        for data in [&b"aaa"[..], b"bbb", b"ccc"] {
            store.write(&make_blob(data)).unwrap();
        }
        let ids = store.list_ids().unwrap();
        assert_eq!(ids.len(), 3);
        for w in ids.windows(2) {
            assert!(w[0] <= w[1]);
        }
    }

    #[test]
    fn total_bytes_and_emptiness() {
        let store = InMemoryObjectStore::default();
        assert!(store.is_empty().unwrap());
        store.write(&make_blob(b"12345")).unwrap();
        store.write(&make_blob(b"123456789")).unwrap();
        assert_eq!(store.total_bytes().unwrap(), 14);
        assert!(!store.is_empty().unwrap());
    }

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryObjectStore::new());
        let id = store.write(&make_blob(b"shared data")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let obj = store.read(&id).unwrap().unwrap();
                    assert_eq!(obj.compute_id(), id);
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
    }

    #[test]
    fn debug_format() {
        let store = InMemoryObjectStore::new();
        store.write(&make_blob(b"x")).unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryObjectStore"));
        assert!(debug.contains("object_count"));
    }

    #[test]
    fn poisoned_lock_is_an_error() {
        use std::sync::Arc;

        let store = Arc::new(InMemoryObjectStore::new());
        let id = store.write(&make_blob(b"before")).unwrap();
        let poisoner = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.objects.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(matches!(store.read(&id), Err(StoreError::Poisoned(_))));
        assert!(matches!(
            store.write(&make_blob(b"after")),
            Err(StoreError::Poisoned(_))
        ));
        assert!(matches!(store.len(), Err(StoreError::Poisoned(_))));
    }
}
