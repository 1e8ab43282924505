//! Core reference types.

use vellum_types::ObjectId;

/// Prefix of every state ref.
pub const HEADS_PREFIX: &str = "refs/heads/";

/// Prefix of every tag.
pub const TAGS_PREFIX: &str = "refs/tags/";

/// The tag pointing at a document's root commit.
pub const ROOT_TAG: &str = "refs/tags/root";

/// Name of the symbolic HEAD ref.
pub const HEAD: &str = "HEAD";

/// Canonical ref name for a state (e.g. `master` → `refs/heads/master`).
pub fn state_ref(state: &str) -> String {
    format!("{HEADS_PREFIX}{state}")
}

/// A named pointer to a commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ref {
    /// Canonical name (e.g. "refs/heads/published").
    pub name: String,
    /// Hash of the commit this ref points at.
    pub target: ObjectId,
}

impl Ref {
    pub fn new(name: impl Into<String>, target: ObjectId) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }

    /// Returns `true` if this is a tag ref.
    pub fn is_tag(&self) -> bool {
        is_tag(&self.name)
    }

    /// The state name, if this is a state ref.
    pub fn state(&self) -> Option<&str> {
        self.name.strip_prefix(HEADS_PREFIX)
    }
}

pub(crate) fn is_tag(name: &str) -> bool {
    name.starts_with(TAGS_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_ref_names() {
        assert_eq!(state_ref("master"), "refs/heads/master");
        let r = Ref::new(state_ref("published"), ObjectId::digest(b"c"));
        assert_eq!(r.state(), Some("published"));
        assert!(!r.is_tag());
    }

    #[test]
    fn root_tag_is_a_tag() {
        let r = Ref::new(ROOT_TAG, ObjectId::digest(b"root"));
        assert!(r.is_tag());
        assert_eq!(r.state(), None);
    }
}
