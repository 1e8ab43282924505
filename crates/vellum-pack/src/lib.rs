//! Dump and load of document repositories.
//!
//! A dump carries, for each document, every object reachable from its refs
//! along first parents plus the refs themselves, in a line-oriented text
//! format (see [`record`]). Loading replays the objects through
//! [`vellum_store::ObjectStore::write_verified`], so any payload whose
//! length or hash no longer matches its record is rejected with
//! [`PackError::Integrity`] before it reaches the store.
//!
//! - [`DumpWriter`] / [`dump`] / [`dump_storage`]: repositories to text
//! - [`Loader`] / [`load`]: text back into a [`vellum_document::Storage`]

pub mod error;
pub mod reader;
pub mod record;
pub mod writer;

pub use error::{PackError, PackResult};
pub use reader::{load, Loader};
pub use record::{ObjectRecord, RefKind, RefRecord};
pub use writer::{dump, dump_storage, DumpSummary, DumpWriter};
