//! Reference management for Vellum.
//!
//! Refs are the mutable half of a document repository: named pointers to
//! commit hashes in the object store. Everything else is immutable.
//!
//! # Namespace
//!
//! - **State refs** live under `refs/heads/<state>` (`master` is the draft
//!   state, `published`, `retired`, ... are whatever the caller names). They
//!   only move through a compare-and-swap [`RefStore::update_ref`].
//! - **The root tag** `refs/tags/root` points at the document's root commit.
//!   Tags are immutable once created.
//! - **HEAD** is a symbolic ref naming the draft state ref.
//!
//! # Modules
//!
//! - [`error`] -- Error types for ref operations
//! - [`types`] -- [`Ref`] and the well-known names
//! - [`traits`] -- The [`RefStore`] trait defining the storage interface
//! - [`names`] -- State and ref name validation
//! - [`memory`] -- In-memory [`InMemoryRefStore`]
//! - [`fs`] -- File-per-ref [`FsRefStore`]

pub mod error;
pub mod fs;
pub mod memory;
pub mod names;
pub mod traits;
pub mod types;

pub use error::{RefError, RefResult};
pub use fs::FsRefStore;
pub use memory::InMemoryRefStore;
pub use names::{validate_ref_name, validate_state_name};
pub use traits::RefStore;
pub use types::{state_ref, Ref, HEAD, HEADS_PREFIX, ROOT_TAG, TAGS_PREFIX};
