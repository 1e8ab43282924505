use std::fmt;

use serde::{Deserialize, Serialize};

/// Author of a revision: a display name and an email address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
}

impl Signature {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_git_style() {
        let sig = Signature::new("Jane Editor", "jane@example.com");
        assert_eq!(sig.to_string(), "Jane Editor <jane@example.com>");
    }
}
