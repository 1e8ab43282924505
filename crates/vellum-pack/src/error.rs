use thiserror::Error;
use vellum_types::ObjectId;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("malformed stream at line {line}: {reason}")]
    MalformedStream { line: usize, reason: String },

    #[error("integrity check failed for {oid}: {reason}")]
    Integrity { oid: ObjectId, reason: String },

    #[error("document error: {0}")]
    Document(#[from] vellum_document::DocumentError),

    #[error("store error: {0}")]
    Store(#[from] vellum_store::StoreError),

    #[error("ref error: {0}")]
    Ref(#[from] vellum_refs::RefError),

    #[error("history error: {0}")]
    History(#[from] vellum_history::HistoryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type PackResult<T> = Result<T, PackError>;
