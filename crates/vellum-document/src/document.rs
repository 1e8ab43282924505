use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;
use vellum_history::RevisionHistory;
use vellum_types::{DocumentId, ObjectId, Signature};

use crate::error::{DocumentError, DocumentResult};
use crate::repository::Repository;
use crate::storage::Storage;

/// A versioned document: id, type, working content and the revision that
/// content was last loaded from or saved as.
///
/// Content changes stay in memory until [`Document::save`] or
/// [`Document::save_in`] writes them as a new revision. The document's
/// repository is created by its first save, never by construction.
pub struct Document {
    id: DocumentId,
    type_tag: String,
    content: Value,
    revision: Option<ObjectId>,
    repository: Option<Repository>,
    storage: Storage,
}

fn check_type(type_tag: &str) -> DocumentResult<()> {
    if type_tag.is_empty() || type_tag.contains(char::is_whitespace) {
        return Err(DocumentError::InvalidType(type_tag.to_string()));
    }
    Ok(())
}

impl Document {
    /// A new document with a random id and the configured default type.
    /// Nothing is written until the first save.
    pub fn new(storage: &Storage, content: Value) -> DocumentResult<Self> {
        Self::with_id(storage, DocumentId::generate(), None, content)
    }

    /// A document with a caller-chosen id and optional type.
    pub fn with_id(
        storage: &Storage,
        id: DocumentId,
        type_tag: Option<&str>,
        content: Value,
    ) -> DocumentResult<Self> {
        let type_tag = type_tag.unwrap_or(&storage.config().default_type).to_string();
        check_type(&type_tag)?;
        Ok(Self {
            repository: storage.open(&id)?,
            storage: storage.clone(),
            id,
            type_tag,
            content,
            revision: None,
        })
    }

    /// Bind to the repository for `id` without loading anything. The type
    /// comes from the index, or the default when the id is unregistered.
    pub fn attach(storage: &Storage, id: DocumentId) -> DocumentResult<Self> {
        let type_tag = storage.index().lookup(&id)?;
        Self::with_id(storage, id, type_tag.as_deref(), Value::Null)
    }

    /// Open an existing document at `rev` (a commit hash or state name,
    /// HEAD's state when `None`). Returns `None` if the document has no
    /// repository.
    pub fn open(
        storage: &Storage,
        id: DocumentId,
        rev: Option<&str>,
    ) -> DocumentResult<Option<Self>> {
        if storage.open(&id)?.is_none() {
            return Ok(None);
        }
        let mut doc = Self::attach(storage, id)?;
        doc.load(rev)?;
        Ok(Some(doc))
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn content(&self) -> &Value {
        &self.content
    }

    pub fn set_content(&mut self, content: Value) {
        self.content = content;
    }

    /// The revision the content was loaded from or last saved as.
    pub fn revision(&self) -> Option<ObjectId> {
        self.revision
    }

    /// State that [`Document::save`] writes to.
    pub fn draft_state(&self) -> &str {
        &self.storage.config().draft_state
    }

    /// The backing repository, `None` until the first save.
    pub fn repository(&self) -> Option<&Repository> {
        self.repository.as_ref()
    }

    /// The backing repository if one exists, without creating it.
    fn existing(&self) -> DocumentResult<Option<Repository>> {
        match &self.repository {
            Some(repo) => Ok(Some(repo.clone())),
            None => self.storage.open(&self.id),
        }
    }

    fn create(&mut self) -> DocumentResult<Repository> {
        if let Some(repo) = &self.repository {
            return Ok(repo.clone());
        }
        let repo = self.storage.open_or_create(&self.id)?;
        self.repository = Some(repo.clone());
        Ok(repo)
    }

    // ---- Saving ----

    /// Save the content to the draft state.
    pub fn save(
        &mut self,
        author: &Signature,
        message: &str,
        timestamp: DateTime<Utc>,
    ) -> DocumentResult<ObjectId> {
        let draft = self.draft_state().to_string();
        self.save_in(&draft, author, message, timestamp)
    }

    /// Save the content straight to `state`, e.g. a fix applied directly
    /// to `published`.
    pub fn save_in(
        &mut self,
        state: &str,
        author: &Signature,
        message: &str,
        timestamp: DateTime<Utc>,
    ) -> DocumentResult<ObjectId> {
        let id = self
            .create()?
            .save(state, &self.content, author, message, timestamp)?;
        self.revision = Some(id);
        self.register()?;
        Ok(id)
    }

    /// Promote `from`'s current tip into `to`. The document's own content
    /// and revision are unchanged.
    pub fn promote(
        &mut self,
        from: &str,
        to: &str,
        author: &Signature,
        message: &str,
        timestamp: DateTime<Utc>,
    ) -> DocumentResult<ObjectId> {
        let Some(repo) = self.existing()? else {
            return Err(DocumentError::NoSuchState {
                state: from.to_string(),
            });
        };
        let id = repo.promote(from, to, author, message, timestamp)?;
        self.repository = Some(repo);
        self.register()?;
        Ok(id)
    }

    /// Record this document's type in the index.
    pub fn register(&self) -> DocumentResult<()> {
        self.storage.index().register(&self.id, &self.type_tag)
    }

    // ---- Loading ----

    /// Load content from `rev` (commit hash or state name), or from the
    /// state HEAD names when `None`.
    pub fn load(&mut self, rev: Option<&str>) -> DocumentResult<ObjectId> {
        let Some(repo) = self.existing()? else {
            return Err(match rev {
                Some(rev) => DocumentError::UnknownRevision(rev.to_string()),
                None => DocumentError::NoSuchState {
                    state: self.draft_state().to_string(),
                },
            });
        };
        let id = match rev {
            Some(rev) => repo.resolve_revision(rev)?,
            None => head_tip(&repo)?,
        };
        let revision = repo.revision(&id)?;
        self.content = revision.content;
        self.revision = Some(id);
        info!(document = %self.id, revision = %id.short_hex(), "loaded revision");
        Ok(id)
    }

    /// Load the draft tip if the draft state exists.
    pub fn load_draft(&mut self) -> DocumentResult<Option<ObjectId>> {
        let Some(repo) = self.existing()? else {
            return Ok(None);
        };
        match repo.tip(repo.draft_state())? {
            Some(tip) => self.load(Some(&tip.to_hex())).map(Some),
            None => Ok(None),
        }
    }

    // ---- Queries ----

    /// Tip of `state`, if it was ever written.
    pub fn revision_at(&self, state: &str) -> DocumentResult<Option<ObjectId>> {
        match self.existing()? {
            Some(repo) => repo.tip(state),
            None => Ok(None),
        }
    }

    pub fn root_revision(&self) -> DocumentResult<Option<ObjectId>> {
        match self.existing()? {
            Some(repo) => repo.root(),
            None => Ok(None),
        }
    }

    /// Newest-first history of `state`, or of the loaded revision when
    /// `None`.
    pub fn history(&self, state: Option<&str>) -> DocumentResult<RevisionHistory> {
        let Some(repo) = self.existing()? else {
            return Repository::in_memory().history_from(None);
        };
        let start = match state {
            Some(state) => repo.tip(state)?,
            None => self.revision,
        };
        repo.history_from(start)
    }

    /// Has `rev` (the loaded revision when `None`) been promoted into `to`?
    pub fn has_been_promoted(&self, to: &str, rev: Option<&ObjectId>) -> DocumentResult<bool> {
        let Some(rev) = rev.copied().or(self.revision) else {
            return Ok(false);
        };
        match self.existing()? {
            Some(repo) => repo.has_been_promoted(to, &rev),
            None => Ok(false),
        }
    }
}

/// Tip of the state HEAD names, or of the draft state when HEAD is unset.
fn head_tip(repo: &Repository) -> DocumentResult<ObjectId> {
    let draft_ref = repo
        .head()?
        .unwrap_or_else(|| vellum_refs::state_ref(repo.draft_state()));
    repo.refs()
        .resolve(&draft_ref)?
        .ok_or_else(|| DocumentError::NoSuchState {
            state: draft_ref
                .strip_prefix(vellum_refs::HEADS_PREFIX)
                .unwrap_or(&draft_ref)
                .to_string(),
        })
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("type_tag", &self.type_tag)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}
