use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info};
use vellum_history::{decode, encode, has_been_promoted, NewRevision, Revision, RevisionHistory};
use vellum_refs::{
    state_ref, validate_state_name, FsRefStore, InMemoryRefStore, RefError, RefStore, ROOT_TAG,
};
use vellum_store::{FsObjectStore, InMemoryObjectStore, ObjectStore};
use vellum_types::{ObjectId, Signature};

use crate::error::{DocumentError, DocumentResult};

/// Message of every root commit.
pub const ROOT_MESSAGE: &str = "First Commit";

/// One document's object store and ref table.
///
/// Cloning is cheap and clones share the same stores.
#[derive(Clone)]
pub struct Repository {
    objects: Arc<dyn ObjectStore>,
    refs: Arc<dyn RefStore>,
    draft_state: String,
}

impl Repository {
    pub fn new(objects: Arc<dyn ObjectStore>, refs: Arc<dyn RefStore>) -> Self {
        Self {
            objects,
            refs,
            draft_state: "master".into(),
        }
    }

    /// Use `state` as the state HEAD names when the root is created.
    pub fn with_draft_state(mut self, state: impl Into<String>) -> Self {
        self.draft_state = state.into();
        self
    }

    pub fn draft_state(&self) -> &str {
        &self.draft_state
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryObjectStore::new()),
            Arc::new(InMemoryRefStore::new()),
        )
    }

    /// Open (creating if needed) a repository directory holding `objects/`,
    /// `refs/` and `HEAD`.
    pub fn open_dir(dir: impl AsRef<Path>) -> DocumentResult<Self> {
        let dir = dir.as_ref();
        Ok(Self::new(
            Arc::new(FsObjectStore::open(dir)?),
            Arc::new(FsRefStore::open(dir)?),
        ))
    }

    pub fn objects(&self) -> &Arc<dyn ObjectStore> {
        &self.objects
    }

    pub fn refs(&self) -> &Arc<dyn RefStore> {
        &self.refs
    }

    /// A repository is empty until its first save; HEAD alone does not
    /// count.
    pub fn is_empty(&self) -> DocumentResult<bool> {
        Ok(self.refs.is_empty()?)
    }

    /// The root commit, once one exists.
    pub fn root(&self) -> DocumentResult<Option<ObjectId>> {
        Ok(self.refs.resolve(ROOT_TAG)?)
    }

    fn require_root(&self) -> DocumentResult<ObjectId> {
        self.root()?.ok_or(DocumentError::MissingRoot)
    }

    /// Tip of a state, `None` if the state was never written.
    pub fn tip(&self, state: &str) -> DocumentResult<Option<ObjectId>> {
        Ok(self.refs.resolve(&state_ref(state))?)
    }

    /// State names with a ref, sorted.
    pub fn states(&self) -> DocumentResult<Vec<String>> {
        Ok(self.refs.states()?)
    }

    /// The ref HEAD names, if set.
    pub fn head(&self) -> DocumentResult<Option<String>> {
        Ok(self.refs.head()?)
    }

    /// Create the root commit and tag when the repository is empty; return
    /// the root either way.
    ///
    /// The root has no parents, null content and [`ROOT_MESSAGE`]. If another
    /// writer tags a root first, theirs is used.
    pub fn ensure_root(
        &self,
        author: &Signature,
        timestamp: DateTime<Utc>,
    ) -> DocumentResult<ObjectId> {
        if !self.is_empty()? {
            return self.require_root();
        }
        let root = encode(
            self.objects.as_ref(),
            &NewRevision {
                content: &Value::Null,
                author,
                message: ROOT_MESSAGE,
                timestamp,
                parents: vec![],
            },
        )?;
        match self.refs.create_ref(ROOT_TAG, root) {
            Ok(()) => {
                debug!(root = %root.short_hex(), "created root commit");
            }
            Err(RefError::AlreadyExists { .. }) => {
                debug!("root tagged concurrently, reusing it");
                return self.require_root();
            }
            Err(e) => return Err(e.into()),
        }
        self.refs.set_head(&state_ref(&self.draft_state))?;
        Ok(root)
    }

    /// Move `name` from `prior` to `new`, creating it when there was no
    /// prior target.
    fn advance(&self, name: &str, prior: Option<ObjectId>, new: ObjectId) -> DocumentResult<()> {
        match prior {
            None => self.refs.create_ref(name, new)?,
            Some(prior) => self.refs.update_ref(name, prior, new)?,
        }
        Ok(())
    }

    /// Append a one-parent commit carrying `content` to `state`.
    pub fn save(
        &self,
        state: &str,
        content: &Value,
        author: &Signature,
        message: &str,
        timestamp: DateTime<Utc>,
    ) -> DocumentResult<ObjectId> {
        validate_state_name(state)?;
        let root = self.ensure_root(author, timestamp)?;
        let prior = self.tip(state)?;
        let id = encode(
            self.objects.as_ref(),
            &NewRevision {
                content,
                author,
                message,
                timestamp,
                parents: vec![prior.unwrap_or(root)],
            },
        )?;
        self.advance(&state_ref(state), prior, id)?;
        info!(state, commit = %id.short_hex(), "saved revision");
        Ok(id)
    }

    /// Record `from`'s current content on `to` as a two-parent commit
    /// `[to's previous tip or root, from's tip]`.
    pub fn promote(
        &self,
        from: &str,
        to: &str,
        author: &Signature,
        message: &str,
        timestamp: DateTime<Utc>,
    ) -> DocumentResult<ObjectId> {
        validate_state_name(to)?;
        let source = self.tip(from)?.ok_or_else(|| DocumentError::NoSuchState {
            state: from.to_string(),
        })?;
        let root = self.require_root()?;
        let prior = self.tip(to)?;
        let content = decode(self.objects.as_ref(), &source)?.content;
        let id = encode(
            self.objects.as_ref(),
            &NewRevision {
                content: &content,
                author,
                message,
                timestamp,
                parents: vec![prior.unwrap_or(root), source],
            },
        )?;
        self.advance(&state_ref(to), prior, id)?;
        info!(
            from,
            to,
            commit = %id.short_hex(),
            source = %source.short_hex(),
            "promoted revision"
        );
        Ok(id)
    }

    /// Decode one commit.
    pub fn revision(&self, id: &ObjectId) -> DocumentResult<Revision> {
        Ok(decode(self.objects.as_ref(), id)?)
    }

    /// Turn a commit hash or a state name into a commit hash.
    ///
    /// A 64-character hex string naming a stored object wins over a state
    /// of the same name.
    pub fn resolve_revision(&self, rev: &str) -> DocumentResult<ObjectId> {
        if ObjectId::is_hex_id(rev) {
            let id: ObjectId = rev.parse()?;
            if self.objects.exists(&id)? {
                return Ok(id);
            }
        }
        if validate_state_name(rev).is_ok() {
            if let Some(tip) = self.tip(rev)? {
                return Ok(tip);
            }
        }
        Err(DocumentError::UnknownRevision(rev.to_string()))
    }

    /// First-parent history from `start`. Empty when there is no start or
    /// no root yet.
    pub fn history_from(&self, start: Option<ObjectId>) -> DocumentResult<RevisionHistory> {
        let (root, start) = match self.root()? {
            Some(root) => (root, start),
            None => (ObjectId::from_hash([0; 32]), None),
        };
        Ok(RevisionHistory::new(self.objects.clone(), root, start))
    }

    /// Has `revision` been promoted into `to`? `false` if `to` was never
    /// written.
    pub fn has_been_promoted(&self, to: &str, revision: &ObjectId) -> DocumentResult<bool> {
        Ok(has_been_promoted(
            self.objects.as_ref(),
            self.tip(to)?,
            revision,
        )?)
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("draft_state", &self.draft_state)
            .finish_non_exhaustive()
    }
}
