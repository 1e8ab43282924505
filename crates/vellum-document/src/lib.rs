//! Versioned structured documents with a publishing pipeline.
//!
//! Every document lives in its own [`Repository`]: an object store plus a
//! ref table. Named states (`master` is the draft, `published`, `retired`
//! and so on are up to the caller) are refs that only move forward. A save
//! appends a one-parent commit to a state; a promotion copies one state's
//! current content into another as a two-parent commit.
//!
//! # Quick start
//!
//! ```
//! use chrono::Utc;
//! use serde_json::json;
//! use vellum_document::{Backend, Document, Storage, StorageConfig};
//! use vellum_types::Signature;
//!
//! let storage = Storage::new(StorageConfig {
//!     backend: Backend::Memory,
//!     ..StorageConfig::default()
//! })
//! .unwrap();
//! let author = Signature::new("Editor", "editor@example.com");
//!
//! let mut doc = Document::new(&storage, json!({"title": "Draft"})).unwrap();
//! let draft = doc.save(&author, "first draft", Utc::now()).unwrap();
//! doc.promote("master", "published", &author, "go live", Utc::now()).unwrap();
//!
//! assert!(doc.has_been_promoted("published", Some(&draft)).unwrap());
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod repository;
pub mod storage;

pub use config::{Backend, StorageConfig};
pub use document::Document;
pub use error::{DocumentError, DocumentResult};
pub use index::{DocumentIndex, InMemoryDocumentIndex, JsonFileDocumentIndex};
pub use repository::{Repository, ROOT_MESSAGE};
pub use storage::Storage;
