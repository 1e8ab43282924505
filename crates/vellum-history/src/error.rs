use vellum_store::StoreError;
use vellum_types::ObjectId;

/// Errors from encoding, decoding and walking revisions.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// A commit, tree or blob reachable from a ref is missing.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// A revision's objects exist but cannot be decoded into content.
    #[error("cannot decode revision {id}: {reason}")]
    Decode { id: ObjectId, reason: String },

    /// Content could not be serialized for storage.
    #[error("cannot encode content: {0}")]
    Encode(String),

    /// Underlying object store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience alias for history results.
pub type HistoryResult<T> = Result<T, HistoryError>;
