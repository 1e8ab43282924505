use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vellum_crypto::ContentHasher;
use vellum_types::{ObjectId, Signature};

use crate::error::{StoreError, StoreResult};

/// Name of the single tree entry that points at a revision's content blob.
pub const CONTENT_ENTRY: &str = "content";

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Serialized document content.
    Blob,
    /// Ordered entries mapping names to object ids.
    Tree,
    /// Revision node linking a tree to its parents.
    Commit,
}

impl ObjectKind {
    /// Lowercase tag used in dumps and on disk.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        }
    }

    /// Parse a lowercase tag.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "blob" => Some(Self::Blob),
            "tree" => Some(Self::Tree),
            "commit" => Some(Self::Commit),
            _ => None,
        }
    }

    fn hasher(&self) -> &'static ContentHasher {
        match self {
            Self::Blob => &ContentHasher::BLOB,
            Self::Tree => &ContentHasher::TREE,
            Self::Commit => &ContentHasher::COMMIT,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored object: kind tag + serialized data + cached size.
///
/// `StoredObject` is the unit of storage. The store never interprets the
/// data; typed views ([`Blob`], [`Tree`], [`Commit`]) encode into and decode
/// from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The serialized bytes of the object.
    pub data: Vec<u8>,
    /// The size of `data` in bytes.
    pub size: u64,
}

impl StoredObject {
    /// Create a new stored object from kind and data.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Compute the content-addressed ID for this object.
    pub fn compute_id(&self) -> ObjectId {
        self.kind.hasher().hash(&self.data)
    }

    fn expect_kind(&self, kind: ObjectKind) -> StoreResult<()> {
        if self.kind != kind {
            return Err(StoreError::CorruptObject {
                id: self.compute_id(),
                reason: format!("expected {kind}, got {}", self.kind),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw content object (analogous to git blob).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Blob)?;
        Ok(Self {
            data: obj.data.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// A single entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub name: String,
    pub object_id: ObjectId,
}

impl TreeEntry {
    pub fn new(name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            name: name.into(),
            object_id,
        }
    }
}

/// Directory-like listing object (analogous to git tree).
///
/// Revisions always use a one-entry tree whose `content` entry points at the
/// content blob; the indirection keeps the object model git-shaped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    /// Entries sorted by name for deterministic hashing.
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Self { entries }
    }

    /// The one-entry tree used by every revision.
    pub fn for_content(blob: ObjectId) -> Self {
        Self {
            entries: vec![TreeEntry::new(CONTENT_ENTRY, blob)],
        }
    }

    /// The blob a revision tree points at: the `content` entry, or the first
    /// entry when the tree was written by another tool.
    pub fn content_id(&self) -> Option<ObjectId> {
        self.get(CONTENT_ENTRY)
            .or_else(|| self.entries.first())
            .map(|e| e.object_id)
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        let data =
            serde_json::to_vec(self).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(StoredObject::new(ObjectKind::Tree, data))
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Tree)?;
        serde_json::from_slice(&obj.data).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// A revision node.
///
/// Parent order is significant: the first parent stays on the timeline the
/// commit was written to, the second (if any) is the promoted source tip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub author: Signature,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Commit {
    /// Maximum number of parents a commit node may carry.
    pub const MAX_PARENTS: usize = 2;

    pub fn first_parent(&self) -> Option<ObjectId> {
        self.parents.first().copied()
    }

    /// The last parent; for a one-parent commit this is the same as the
    /// first.
    pub fn last_parent(&self) -> Option<ObjectId> {
        self.parents.last().copied()
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        if self.parents.len() > Self::MAX_PARENTS {
            return Err(StoreError::Serialization(format!(
                "commit has {} parents, at most {} allowed",
                self.parents.len(),
                Self::MAX_PARENTS
            )));
        }
        let data =
            serde_json::to_vec(self).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(StoredObject::new(ObjectKind::Commit, data))
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Commit)?;
        let commit: Self = serde_json::from_slice(&obj.data)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        if commit.parents.len() > Self::MAX_PARENTS {
            return Err(StoreError::CorruptObject {
                id: obj.compute_id(),
                reason: format!("{} parents", commit.parents.len()),
            });
        }
        Ok(commit)
    }
}
