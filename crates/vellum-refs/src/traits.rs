//! The [`RefStore`] trait defining the reference storage interface.

use vellum_types::ObjectId;

use crate::error::RefResult;
use crate::types::{Ref, HEADS_PREFIX};

/// Storage backend for named references.
///
/// Implementations must be thread-safe (`Send + Sync`). `update_ref` is a
/// compare-and-swap: the check of the prior target and the write happen
/// under one lock, so two writers racing on the same ref cannot both win.
pub trait RefStore: Send + Sync {
    /// Read a ref by its canonical name (e.g. "refs/heads/master").
    ///
    /// Returns `Ok(None)` if the ref does not exist.
    fn read_ref(&self, name: &str) -> RefResult<Option<Ref>>;

    /// Create a ref that must not exist yet.
    ///
    /// Fails with [`crate::RefError::AlreadyExists`] otherwise.
    fn create_ref(&self, name: &str, target: ObjectId) -> RefResult<()>;

    /// Move an existing ref from `expected` to `new`.
    ///
    /// Fails with [`crate::RefError::NotFound`] when the ref is absent,
    /// [`crate::RefError::Conflict`] when its current target is not
    /// `expected`, and [`crate::RefError::TagImmutable`] for tags.
    fn update_ref(&self, name: &str, expected: ObjectId, new: ObjectId) -> RefResult<()>;

    /// Create or overwrite a ref unconditionally.
    ///
    /// Used when replaying a dump. Tags may be rewritten only with the
    /// target they already have.
    fn write_ref(&self, name: &str, target: ObjectId) -> RefResult<()>;

    /// List all refs whose canonical name starts with `prefix`, sorted by
    /// name. Pass `""` to list all refs.
    fn list_refs(&self, prefix: &str) -> RefResult<Vec<Ref>>;

    /// The ref HEAD points at, if HEAD has been set.
    fn head(&self) -> RefResult<Option<String>>;

    /// Point HEAD at a ref name (symbolic).
    fn set_head(&self, target: &str) -> RefResult<()>;

    /// Resolve a ref name to its target hash.
    fn resolve(&self, name: &str) -> RefResult<Option<ObjectId>> {
        Ok(self.read_ref(name)?.map(|r| r.target))
    }

    /// Every ref, sorted by name.
    fn enumerate_refs(&self) -> RefResult<Vec<Ref>> {
        self.list_refs("")
    }

    /// Names of all states that have a ref.
    fn states(&self) -> RefResult<Vec<String>> {
        Ok(self
            .list_refs(HEADS_PREFIX)?
            .iter()
            .filter_map(|r| r.state().map(str::to_string))
            .collect())
    }

    /// Returns `true` if no refs exist. HEAD alone does not count.
    fn is_empty(&self) -> RefResult<bool> {
        Ok(self.list_refs("")?.is_empty())
    }
}
