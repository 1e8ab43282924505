use vellum_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. Content-addressing guarantees this:
///   the same data always produces the same ID.
/// - Writes are idempotent: writing an object that is already present is a
///   no-op that returns the same ID.
/// - Concurrent reads are always safe (objects are immutable).
/// - The store never interprets object contents and never deletes.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Read an object by its content-addressed ID.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its content-addressed ID.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// All object IDs in the store, sorted.
    fn list_ids(&self) -> StoreResult<Vec<ObjectId>>;

    /// Read an object that must exist.
    fn get(&self, id: &ObjectId) -> StoreResult<StoredObject> {
        self.read(id)?.ok_or(StoreError::NotFound(*id))
    }

    /// Write an object replayed from elsewhere, checking it against the id
    /// it was recorded under.
    ///
    /// Fails with [`StoreError::CorruptWrite`] without writing anything when
    /// the recomputed id differs.
    fn write_verified(&self, object: &StoredObject, expected: &ObjectId) -> StoreResult<ObjectId> {
        let computed = object.compute_id();
        if computed != *expected {
            return Err(StoreError::CorruptWrite {
                expected: *expected,
                computed,
            });
        }
        self.write(object)
    }

    /// Returns `true` if the store holds no objects.
    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.list_ids()?.is_empty())
    }
}
