use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use vellum_store::ObjectStore;
use vellum_types::ObjectId;

use crate::codec::decode;
use crate::error::HistoryResult;
use crate::revision::{ParentsSummary, Revision, RevisionKind};

/// One step of a [`RevisionHistory`] walk.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub revision: Revision,
    pub kind: RevisionKind,
    pub parents: ParentsSummary,
}

/// Lazy, newest-first walk along first parents.
///
/// The walk yields the starting commit and each first parent in turn. It
/// stops after the first commit whose parents include the root, so the root
/// commit itself is only yielded when the walk starts on it. Each commit is
/// decoded when it is reached, not before.
///
/// The iterator is one-shot and fuses after the last entry or after the
/// first error.
pub struct RevisionHistory {
    store: Arc<dyn ObjectStore>,
    root: ObjectId,
    next: Option<ObjectId>,
}

impl RevisionHistory {
    /// Walk from `start` (`None` gives an empty history).
    pub fn new(store: Arc<dyn ObjectStore>, root: ObjectId, start: Option<ObjectId>) -> Self {
        Self {
            store,
            root,
            next: start,
        }
    }

    pub fn root(&self) -> ObjectId {
        self.root
    }

    fn step(&mut self, id: ObjectId) -> HistoryResult<HistoryEntry> {
        let revision = decode(self.store.as_ref(), &id)?;
        self.next = if revision.parents.contains(&self.root) {
            None
        } else {
            revision.first_parent()
        };
        debug!(commit = %id.short_hex(), next = ?self.next.map(|n| n.short_hex()), "history step");
        Ok(HistoryEntry {
            kind: revision.kind(),
            parents: revision.parents_summary(&self.root),
            revision,
        })
    }
}

impl Iterator for RevisionHistory {
    type Item = HistoryResult<HistoryEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        Some(self.step(id))
    }
}

impl std::iter::FusedIterator for RevisionHistory {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode, NewRevision};
    use crate::error::HistoryError;
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};
    use vellum_store::InMemoryObjectStore;
    use vellum_types::Signature;

    struct Graph {
        store: Arc<InMemoryObjectStore>,
        root: ObjectId,
        minute: u32,
    }

    impl Graph {
        fn new() -> Self {
            let store = Arc::new(InMemoryObjectStore::new());
            let mut graph = Self {
                store,
                root: ObjectId::digest(b"placeholder"),
                minute: 0,
            };
            graph.root = graph.commit(&Value::Null, vec![]);
            graph
        }

        fn commit(&mut self, content: &Value, parents: Vec<ObjectId>) -> ObjectId {
            self.minute += 1;
            let author = Signature::new("Editor", "editor@example.com");
            encode(
                self.store.as_ref(),
                &NewRevision {
                    content,
                    author: &author,
                    message: "m",
                    timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, self.minute, 0).unwrap(),
                    parents,
                },
            )
            .unwrap()
        }

        fn walk(&self, start: Option<ObjectId>) -> Vec<HistoryEntry> {
            RevisionHistory::new(self.store.clone(), self.root, start)
                .collect::<HistoryResult<Vec<_>>>()
                .unwrap()
        }
    }

    fn ids(entries: &[HistoryEntry]) -> Vec<ObjectId> {
        entries.iter().map(|e| e.revision.id).collect()
    }

    // -----------------------------------------------------------------------
    // Linear saves
    // -----------------------------------------------------------------------

    #[test]
    fn linear_history_is_newest_first_and_stops_above_root() {
        let mut g = Graph::new();
        let c1 = g.commit(&json!("v1"), vec![g.root]);
        let c2 = g.commit(&json!("v2"), vec![c1]);
        let c3 = g.commit(&json!("v3"), vec![c2]);

        let entries = g.walk(Some(c3));
        assert_eq!(ids(&entries), vec![c3, c2, c1]);
        assert!(entries.iter().all(|e| e.kind == RevisionKind::Save));
        assert_eq!(entries[0].parents.previous, Some(c2));
        assert!(entries[2].parents.is_empty());
        assert_eq!(entries[0].revision.content, json!("v3"));
    }

    #[test]
    fn starting_on_root_yields_root_only() {
        let g = Graph::new();
        let entries = g.walk(Some(g.root));
        assert_eq!(ids(&entries), vec![g.root]);
        assert_eq!(entries[0].kind, RevisionKind::Root);
        assert!(entries[0].parents.is_empty());
    }

    #[test]
    fn no_start_is_empty() {
        let g = Graph::new();
        assert!(g.walk(None).is_empty());
    }

    // -----------------------------------------------------------------------
    // Promotions
    // -----------------------------------------------------------------------

    #[test]
    fn promotion_history_follows_destination_timeline() {
        let mut g = Graph::new();
        let c1 = g.commit(&json!("v1"), vec![g.root]);
        let c2 = g.commit(&json!("v2"), vec![c1]);
        let c3 = g.commit(&json!("v2"), vec![g.root, c2]);
        let c4 = g.commit(&json!("v3"), vec![c2]);
        let c5 = g.commit(&json!("v3"), vec![c3, c4]);

        let entries = g.walk(Some(c5));
        assert_eq!(ids(&entries), vec![c5, c3]);
        assert!(entries.iter().all(|e| e.kind == RevisionKind::Promotion));
        assert_eq!(entries[0].parents.previous, Some(c3));
        assert_eq!(entries[0].parents.source, Some(c4));
        assert_eq!(entries[1].parents.previous, None);
        assert_eq!(entries[1].parents.source, Some(c2));
    }

    // -----------------------------------------------------------------------
    // Laziness and errors
    // -----------------------------------------------------------------------

    #[test]
    fn walk_is_lazy() {
        let mut g = Graph::new();
        // c2's first parent does not exist; only the first step is taken.
        let missing = ObjectId::digest(b"missing");
        let c2 = g.commit(&json!("v2"), vec![missing]);

        let mut walk = RevisionHistory::new(g.store.clone(), g.root, Some(c2));
        assert_eq!(walk.next().unwrap().unwrap().revision.id, c2);
        assert!(matches!(
            walk.next(),
            Some(Err(HistoryError::ObjectNotFound(id))) if id == missing
        ));
        assert!(walk.next().is_none());
    }
}
