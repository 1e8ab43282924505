use vellum_types::ObjectId;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// A replayed object hashed to something other than its recorded id.
    #[error("corrupt write: expected {expected}, computed {computed}")]
    CorruptWrite {
        expected: ObjectId,
        computed: ObjectId,
    },

    /// Stored bytes no longer match the id they are filed under.
    #[error("hash mismatch for {id}: computed {computed}")]
    HashMismatch { id: ObjectId, computed: ObjectId },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock guarding an in-memory store was poisoned by a panicking writer.
    #[error("object store lock poisoned: {0}")]
    Poisoned(String),

    /// The object data is malformed or cannot be decoded.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: ObjectId, reason: String },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
