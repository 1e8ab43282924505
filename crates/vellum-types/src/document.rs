use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Stable identity of a versioned document.
///
/// Every document owns one repository, and on disk the id doubles as that
/// repository's directory name. Ids are therefore restricted to a single
/// path component without whitespace. Fresh ids are 16 random bytes in
/// lowercase hex (32 characters).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self(hex::encode(bytes))
    }

    /// Validate and wrap an existing id.
    pub fn parse(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        let reject = |reason: &str| TypeError::InvalidDocumentId {
            id: id.clone(),
            reason: reason.to_string(),
        };

        if id.is_empty() {
            return Err(reject("must not be empty"));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(reject("must not contain whitespace"));
        }
        if id.contains('/') || id.contains('\\') {
            return Err(reject("must not contain path separators"));
        }
        if id.starts_with('.') {
            return Err(reject("must not start with '.'"));
        }
        Ok(Self(id))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DocumentId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
