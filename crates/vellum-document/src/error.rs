use thiserror::Error;

/// Errors from document operations.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The state has never been saved to.
    #[error("no such state: {state}")]
    NoSuchState { state: String },

    /// The repository has refs but no root tag.
    #[error("repository has no root commit")]
    MissingRoot,

    /// A revision string matched neither a commit hash nor a state.
    #[error("unknown revision: {0}")]
    UnknownRevision(String),

    /// Document types are single words.
    #[error("invalid document type {0:?}: must be non-empty without whitespace")]
    InvalidType(String),

    /// Invalid or unreadable storage configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The document index could not be read or written.
    #[error("document index error: {0}")]
    Index(String),

    #[error("store error: {0}")]
    Store(#[from] vellum_store::StoreError),

    #[error("ref error: {0}")]
    Ref(#[from] vellum_refs::RefError),

    #[error("history error: {0}")]
    History(#[from] vellum_history::HistoryError),

    #[error("invalid identifier: {0}")]
    Type(#[from] vellum_types::TypeError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DocumentResult<T> = Result<T, DocumentError>;
