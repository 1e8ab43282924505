//! Content-addressed object storage for Vellum.
//!
//! This crate implements a hash-keyed object store analogous to git's
//! `.git/objects/` directory. Every revision of a document is persisted as
//! three immutable objects, each identified by its BLAKE3 hash
//! (domain-separated by object kind).
//!
//! # Object Types
//!
//! - [`Blob`] -- serialized document content
//! - [`Tree`] -- named entries pointing at other objects (one `content` entry)
//! - [`Commit`] -- a revision node: tree, 0-2 parents, author, message, time
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsObjectStore`] -- one file per object under `objects/`
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Write-then-link: write objects first, then move refs to them.
//! 3. Concurrent reads are always safe (objects are immutable).
//! 4. The store never deletes objects.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use memory::InMemoryObjectStore;
pub use object::{Blob, Commit, ObjectKind, StoredObject, Tree, TreeEntry, CONTENT_ENTRY};
pub use traits::ObjectStore;
