use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vellum_refs::validate_state_name;

use crate::error::{DocumentError, DocumentResult};

/// Where repositories live.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Process-local; everything is gone when the [`crate::Storage`] drops.
    Memory,
    /// One directory per document under `storage_path`.
    #[default]
    Filesystem,
}

/// Storage settings, passed explicitly to [`crate::Storage::new`].
///
/// Every field has a default, so a TOML file only needs the keys it
/// changes:
///
/// ```toml
/// storage_path = "/var/lib/vellum"
/// draft_state = "draft"
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub storage_path: PathBuf,
    pub backend: Backend,
    /// Type recorded for documents created without one.
    pub default_type: String,
    /// State that plain `save` writes to and `HEAD` names.
    pub draft_state: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("storage"),
            backend: Backend::Filesystem,
            default_type: "document".into(),
            draft_state: "master".into(),
        }
    }
}

impl StorageConfig {
    pub fn from_toml_str(text: &str) -> DocumentResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| DocumentError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> DocumentResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| DocumentError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> DocumentResult<()> {
        validate_state_name(&self.draft_state)
            .map_err(|e| DocumentError::Config(format!("draft_state: {e}")))?;
        if self.default_type.is_empty() || self.default_type.contains(char::is_whitespace) {
            return Err(DocumentError::Config(format!(
                "default_type must be a non-empty word, got {:?}",
                self.default_type
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = StorageConfig::default();
        assert_eq!(c.storage_path, PathBuf::from("storage"));
        assert_eq!(c.backend, Backend::Filesystem);
        assert_eq!(c.default_type, "document");
        assert_eq!(c.draft_state, "master");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = StorageConfig::from_toml_str("storage_path = \"/tmp/docs\"\nbackend = \"memory\"\n")
            .unwrap();
        assert_eq!(c.storage_path, PathBuf::from("/tmp/docs"));
        assert_eq!(c.backend, Backend::Memory);
        assert_eq!(c.draft_state, "master");
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(StorageConfig::from_toml_str("").unwrap(), StorageConfig::default());
    }

    #[test]
    fn bad_values_rejected() {
        assert!(StorageConfig::from_toml_str("backend = \"s3\"").is_err());
        assert!(StorageConfig::from_toml_str("draft_state = \"bad..state\"").is_err());
        assert!(StorageConfig::from_toml_str("default_type = \"two words\"").is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vellum.toml");
        std::fs::write(&path, "default_type = \"article\"\n").unwrap();
        assert_eq!(StorageConfig::load(&path).unwrap().default_type, "article");
        assert!(matches!(
            StorageConfig::load(dir.path().join("missing.toml")),
            Err(DocumentError::Config(_))
        ));
    }
}
