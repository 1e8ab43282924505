//! Content hashing for Vellum.
//!
//! Provides domain-separated BLAKE3 hashing so that a blob, a tree and a
//! commit with identical bytes never share an identifier.
//!
//! All crypto operations wrap established libraries -- no custom cryptography.

pub mod hasher;

pub use hasher::ContentHasher;
