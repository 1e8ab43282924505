//! Revision history for Vellum documents.
//!
//! A revision is a commit in a document's object store viewed together with
//! its decoded content. This crate turns content into commits and back, and
//! answers the two questions asked of a commit graph:
//!
//! - **history**: the newest-first first-parent walk of one state
//!   ([`RevisionHistory`])
//! - **ancestry**: has a given revision ever been promoted into a state
//!   ([`has_been_promoted`])
//!
//! Neither query moves refs; both read the object store only.

pub mod ancestry;
pub mod codec;
pub mod error;
pub mod history;
pub mod revision;

pub use ancestry::has_been_promoted;
pub use codec::{decode, encode, read_commit, NewRevision};
pub use error::{HistoryError, HistoryResult};
pub use history::{HistoryEntry, RevisionHistory};
pub use revision::{ParentsSummary, Revision, RevisionKind};
