//! Foundation types for Vellum.
//!
//! This crate provides the identity and structural types shared by every
//! other Vellum crate.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Content-addressed identifier (BLAKE3 hash)
//! - [`DocumentId`] -- Stable identity of a versioned document
//! - [`Signature`] -- Author attached to every revision

pub mod document;
pub mod error;
pub mod object;
pub mod signature;

pub use document::DocumentId;
pub use error::TypeError;
pub use object::ObjectId;
pub use signature::Signature;
