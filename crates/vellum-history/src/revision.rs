use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use vellum_types::{ObjectId, Signature};

/// What a commit is, derived from its parent count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RevisionKind {
    /// The document's root commit: no parents.
    Root,
    /// A linear save: one parent.
    Save,
    /// A promotion: `[destination previous, source tip]`.
    Promotion,
}

impl RevisionKind {
    pub fn from_parent_count(count: usize) -> Self {
        match count {
            0 => Self::Root,
            1 => Self::Save,
            _ => Self::Promotion,
        }
    }
}

impl std::fmt::Display for RevisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Root => "root",
            Self::Save => "save",
            Self::Promotion => "promotion",
        })
    }
}

/// Named view of a commit's parents with the root commit left out.
///
/// `previous` is the earlier commit on the same state, `source` the
/// promoted tip. A first save or a promotion into a fresh state has no
/// `previous`, because its first parent is the root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ParentsSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ObjectId>,
}

impl ParentsSummary {
    pub fn new(parents: &[ObjectId], root: &ObjectId) -> Self {
        match parents {
            [first, second] if first != root => Self {
                previous: Some(*first),
                source: Some(*second),
            },
            [_, second] => Self {
                previous: None,
                source: Some(*second),
            },
            [only] if only != root => Self {
                previous: Some(*only),
                source: None,
            },
            _ => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_none() && self.source.is_none()
    }
}

/// A decoded commit: its hash, content and metadata.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Revision {
    pub id: ObjectId,
    pub content: Value,
    pub author: Signature,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub parents: Vec<ObjectId>,
}

impl Revision {
    pub fn kind(&self) -> RevisionKind {
        RevisionKind::from_parent_count(self.parents.len())
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn first_parent(&self) -> Option<ObjectId> {
        self.parents.first().copied()
    }

    /// For a promotion, the source tip.
    pub fn last_parent(&self) -> Option<ObjectId> {
        self.parents.last().copied()
    }

    pub fn parents_summary(&self, root: &ObjectId) -> ParentsSummary {
        ParentsSummary::new(&self.parents, root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(seed: &[u8]) -> ObjectId {
        ObjectId::digest(seed)
    }

    #[test]
    fn kind_from_parent_count() {
        assert_eq!(RevisionKind::from_parent_count(0), RevisionKind::Root);
        assert_eq!(RevisionKind::from_parent_count(1), RevisionKind::Save);
        assert_eq!(RevisionKind::from_parent_count(2), RevisionKind::Promotion);
        assert_eq!(RevisionKind::Promotion.to_string(), "promotion");
    }

    #[test]
    fn summary_of_promotion_onto_existing_state() {
        let root = oid(b"root");
        let s = ParentsSummary::new(&[oid(b"prev"), oid(b"src")], &root);
        assert_eq!(s.previous, Some(oid(b"prev")));
        assert_eq!(s.source, Some(oid(b"src")));
    }

    #[test]
    fn summary_of_first_promotion() {
        let root = oid(b"root");
        let s = ParentsSummary::new(&[root, oid(b"src")], &root);
        assert_eq!(s.previous, None);
        assert_eq!(s.source, Some(oid(b"src")));
    }

    #[test]
    fn summary_of_saves() {
        let root = oid(b"root");
        let s = ParentsSummary::new(&[oid(b"prev")], &root);
        assert_eq!(s.previous, Some(oid(b"prev")));
        assert_eq!(s.source, None);

        assert!(ParentsSummary::new(&[root], &root).is_empty());
        assert!(ParentsSummary::new(&[], &root).is_empty());
    }

    #[test]
    fn summary_serializes_without_empty_fields() {
        let root = oid(b"root");
        let s = ParentsSummary::new(&[root, oid(b"src")], &root);
        let json = serde_json::to_value(s).unwrap();
        assert!(json.get("previous").is_none());
        assert_eq!(json["source"], Value::String(oid(b"src").to_hex()));
    }
}
