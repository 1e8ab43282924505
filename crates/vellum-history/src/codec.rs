//! Conversion between revisions and the blob/tree/commit objects that store
//! them.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;
use vellum_store::{Blob, Commit, ObjectKind, ObjectStore, StoreError, StoredObject, Tree};
use vellum_types::{ObjectId, Signature};

use crate::error::{HistoryError, HistoryResult};
use crate::revision::Revision;

/// Everything needed to write one revision.
#[derive(Clone, Debug)]
pub struct NewRevision<'a> {
    pub content: &'a Value,
    pub author: &'a Signature,
    pub message: &'a str,
    pub timestamp: DateTime<Utc>,
    pub parents: Vec<ObjectId>,
}

/// Write a revision as one blob, one tree and one commit and return the
/// commit hash.
///
/// Blob and tree writes are idempotent, so saving unchanged content reuses
/// the existing objects; the commit is always new unless every field
/// matches.
pub fn encode(store: &dyn ObjectStore, rev: &NewRevision<'_>) -> HistoryResult<ObjectId> {
    let bytes = serde_json::to_vec(rev.content).map_err(|e| HistoryError::Encode(e.to_string()))?;
    let blob = store.write(&Blob::new(bytes).to_stored_object())?;
    let tree = store.write(&Tree::for_content(blob).to_stored_object()?)?;
    let commit = Commit {
        tree,
        parents: rev.parents.clone(),
        author: rev.author.clone(),
        message: rev.message.to_string(),
        timestamp: rev.timestamp,
    };
    let id = store.write(&commit.to_stored_object()?)?;
    debug!(
        commit = %id.short_hex(),
        tree = %tree.short_hex(),
        blob = %blob.short_hex(),
        parents = commit.parents.len(),
        "encoded revision"
    );
    Ok(id)
}

/// Read an object that must exist, mapping absence to
/// [`HistoryError::ObjectNotFound`].
fn fetch(store: &dyn ObjectStore, id: &ObjectId, kind: ObjectKind) -> HistoryResult<StoredObject> {
    let obj = store.read(id)?.ok_or(HistoryError::ObjectNotFound(*id))?;
    if obj.kind != kind {
        return Err(HistoryError::Decode {
            id: *id,
            reason: format!("expected {kind}, found {}", obj.kind),
        });
    }
    Ok(obj)
}

fn decode_err(id: &ObjectId) -> impl Fn(StoreError) -> HistoryError + '_ {
    move |e| HistoryError::Decode {
        id: *id,
        reason: e.to_string(),
    }
}

/// Read just the commit node, without its tree or content.
pub fn read_commit(store: &dyn ObjectStore, id: &ObjectId) -> HistoryResult<Commit> {
    let obj = fetch(store, id, ObjectKind::Commit)?;
    Commit::from_stored_object(&obj).map_err(decode_err(id))
}

/// Read a commit, its tree and its content blob.
///
/// Fails with [`HistoryError::Decode`] when the blob is not valid JSON.
pub fn decode(store: &dyn ObjectStore, id: &ObjectId) -> HistoryResult<Revision> {
    let commit = read_commit(store, id)?;
    let tree_obj = fetch(store, &commit.tree, ObjectKind::Tree)?;
    let tree = Tree::from_stored_object(&tree_obj).map_err(decode_err(&commit.tree))?;
    let blob_id = tree.content_id().ok_or_else(|| HistoryError::Decode {
        id: *id,
        reason: "tree has no entries".into(),
    })?;
    let blob = Blob::from_stored_object(&fetch(store, &blob_id, ObjectKind::Blob)?)
        .map_err(decode_err(&blob_id))?;
    let content = serde_json::from_slice(&blob.data).map_err(|e| HistoryError::Decode {
        id: *id,
        reason: format!("content is not JSON: {e}"),
    })?;

    Ok(Revision {
        id: *id,
        content,
        author: commit.author,
        message: commit.message,
        timestamp: commit.timestamp,
        parents: commit.parents,
    })
}
