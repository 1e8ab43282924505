//! State and ref name validation following git-style conventions.
//!
//! Valid state names:
//! - Must be non-empty
//! - Must not contain whitespace, `~`, `^`, `:`, `?`, `*`, `[`, `\`
//! - Must not contain `..` or `@{`
//! - Must not start or end with `/`, must not end with `.lock`
//! - Components between slashes must be non-empty and not start with `.`
//!
//! State names become file paths in [`crate::FsRefStore`], so the same rules
//! keep refs inside the repository directory.

use crate::error::{RefError, RefResult};
use crate::types::HEAD;

/// Characters that are forbidden anywhere in a name.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

fn invalid(name: &str, reason: impl Into<String>) -> RefError {
    RefError::InvalidName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a state name such as `master`, `published` or `review/legal`.
///
/// # Examples
///
/// ```
/// use vellum_refs::names::validate_state_name;
///
/// assert!(validate_state_name("published").is_ok());
/// assert!(validate_state_name("review/legal").is_ok());
/// assert!(validate_state_name("").is_err());
/// assert!(validate_state_name("bad..name").is_err());
/// ```
pub fn validate_state_name(name: &str) -> RefResult<()> {
    if name.is_empty() {
        return Err(invalid(name, "name must not be empty"));
    }
    if let Some(ch) = FORBIDDEN_CHARS.iter().find(|ch| name.contains(**ch)) {
        return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
    }
    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }
    if name.contains("@{") {
        return Err(invalid(name, "must not contain '@{'"));
    }
    if name.ends_with('.') {
        return Err(invalid(name, "must not end with '.'"));
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid(name, "must not start or end with '/'"));
    }
    if name.ends_with(".lock") {
        return Err(invalid(name, "must not end with '.lock'"));
    }
    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid(name, "path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(invalid(
                name,
                format!("component must not start with '.': {component:?}"),
            ));
        }
    }
    Ok(())
}

/// Validate a full ref name: `refs/<kind>/<name>` with a valid tail.
///
/// `HEAD` is not a ref name; it is managed through
/// [`crate::RefStore::set_head`].
pub fn validate_ref_name(name: &str) -> RefResult<()> {
    if name == HEAD {
        return Err(invalid(name, "HEAD is symbolic and cannot be written directly"));
    }
    let rest = name
        .strip_prefix("refs/")
        .ok_or_else(|| invalid(name, "must start with 'refs/'"))?;
    let (kind, tail) = rest
        .split_once('/')
        .ok_or_else(|| invalid(name, "must have the form refs/<kind>/<name>"))?;
    if kind.is_empty() {
        return Err(invalid(name, "ref kind must not be empty"));
    }
    validate_state_name(tail).map_err(|_| invalid(name, format!("invalid name {tail:?}")))
}
