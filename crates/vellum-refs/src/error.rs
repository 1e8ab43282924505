//! Error types for reference operations.

use thiserror::Error;
use vellum_types::ObjectId;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The reference was not found.
    #[error("ref not found: {name}")]
    NotFound { name: String },

    /// A reference with this name already exists.
    #[error("ref already exists: {name}")]
    AlreadyExists { name: String },

    /// The ref moved since the caller last read it.
    #[error("ref {name} moved: expected {expected}, found {actual}")]
    Conflict {
        name: String,
        expected: ObjectId,
        actual: ObjectId,
    },

    /// The state or ref name is invalid.
    #[error("invalid ref name: {name}: {reason}")]
    InvalidName { name: String, reason: String },

    /// A tag is immutable and cannot be updated.
    #[error("tag is immutable: {name}")]
    TagImmutable { name: String },

    /// A ref file exists but its contents cannot be parsed.
    #[error("corrupt ref {name}: {reason}")]
    Corrupt { name: String, reason: String },

    /// Another writer held the ref's lock file for too long.
    #[error("ref is locked by another writer: {name}")]
    Locked { name: String },

    /// A lock guarding the ref table was poisoned by a panicking writer.
    #[error("ref table lock poisoned: {0}")]
    Poisoned(String),

    /// I/O error during file-based ref operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for ref operations.
pub type RefResult<T> = std::result::Result<T, RefError>;
